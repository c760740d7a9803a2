use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

pub type TaxId = i64;

/// Lowest tax payer number considered valid (inclusive).
pub const MIN_VALID_TAX_ID: TaxId = 1;
/// Upper bound for valid tax payer numbers (exclusive).
pub const MAX_VALID_TAX_ID: TaxId = i32::MAX as TaxId;

/// Annotation attached to records whose tax payer number is out of range.
pub const INVALID_TAX_ID_COMMENT: &str = "Invalid tax payer number";

/// One synthetic user row.
///
/// Serialized field order matches the CSV layout:
/// `TaxID, FirstName, LastName, Email, PhoneNumber, PassNumber, Comment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "TaxID")]
    pub tax_id: TaxId,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "PassNumber")]
    pub pass_number: String,
    #[serde(rename = "Comment")]
    pub comment: String,
}

impl UserRecord {
    /// Hash over every field except `tax_id`.
    ///
    /// Two records that differ only by tax payer number share a fingerprint and
    /// compare equal.
    pub fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.hash(&mut h);
        h.finish()
    }

    pub fn has_valid_tax_id(&self) -> bool {
        (MIN_VALID_TAX_ID..MAX_VALID_TAX_ID).contains(&self.tax_id)
    }
}

impl PartialEq for UserRecord {
    fn eq(&self, other: &Self) -> bool {
        self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.email == other.email
            && self.phone_number == other.phone_number
            && self.pass_number == other.pass_number
            && self.comment == other.comment
    }
}

impl Eq for UserRecord {}

impl Hash for UserRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.first_name.hash(state);
        self.last_name.hash(state);
        self.email.hash(state);
        self.phone_number.hash(state);
        self.pass_number.hash(state);
        self.comment.hash(state);
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UserID: {}, {} {}, Email: {}, Phone: {}, Passport number: {}, Comment: {}",
            self.tax_id,
            self.first_name,
            self.last_name,
            self.email,
            self.phone_number,
            self.pass_number,
            self.comment
        )
    }
}

/// The uniquely-constrained columns of the `Users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    TaxId,
    PassNumber,
    Email,
}

impl FieldKind {
    pub fn column(self) -> &'static str {
        match self {
            FieldKind::TaxId => "TaxID",
            FieldKind::PassNumber => "PassNumber",
            FieldKind::Email => "Email",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKind::TaxId => "tax ID",
            FieldKind::PassNumber => "passport number",
            FieldKind::Email => "email",
        }
    }
}

/// A candidate value checked for prior use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate<'a> {
    TaxId(TaxId),
    PassNumber(&'a str),
    Email(&'a str),
}

impl Candidate<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            Candidate::TaxId(_) => FieldKind::TaxId,
            Candidate::PassNumber(_) => FieldKind::PassNumber,
            Candidate::Email(_) => FieldKind::Email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tax_id: TaxId) -> UserRecord {
        UserRecord {
            tax_id,
            first_name: "Anna".into(),
            last_name: "Nowak".into(),
            email: "anna.nowak@test.com".into(),
            phone_number: "+123456789".into(),
            pass_number: "ZZA123456".into(),
            comment: String::new(),
        }
    }

    #[test]
    fn identity_ignores_tax_id() {
        let a = sample(1);
        let b = sample(2);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = sample(1);
        c.email = "other@test.com".into();
        assert_ne!(a, c);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn valid_range_is_half_open() {
        assert!(sample(MIN_VALID_TAX_ID).has_valid_tax_id());
        assert!(sample(MAX_VALID_TAX_ID - 1).has_valid_tax_id());
        assert!(!sample(MAX_VALID_TAX_ID).has_valid_tax_id());
        assert!(!sample(0).has_valid_tax_id());
        assert!(!sample(-5).has_valid_tax_id());
    }

    #[test]
    fn display_contains_all_fields() {
        let s = sample(42).to_string();
        assert!(s.starts_with("UserID: 42, Anna Nowak"));
        assert!(s.contains("ZZA123456"));
    }
}
