use super::fields::{FieldGenerator, PASS_DOMAIN, base_email, format_phone};
use crate::batch::MAX_CHUNK;
use crate::errors::GenError;
use crate::oracle::Universe;
use crate::types::{
    Candidate, FieldKind, INVALID_TAX_ID_COMMENT, MAX_VALID_TAX_ID, MIN_VALID_TAX_ID, TaxId,
    UserRecord,
};

/// Consecutive rejected candidates tolerated before a field is declared exhausted.
pub const MAX_ATTEMPTS: usize = 100_000;

/// Produces unique field values and combines them into records.
#[derive(Debug)]
pub struct Assembler {
    fields: FieldGenerator,
    universe: Universe,
    invalid_ratio: u32,
    max_attempts: usize,
}

impl Assembler {
    pub fn new(fields: FieldGenerator, universe: Universe, invalid_ratio: u32) -> Self {
        Self { fields, universe, invalid_ratio, max_attempts: MAX_ATTEMPTS }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Generate `amount` tax IDs unused in the run and in the store.
    ///
    /// # Errors
    /// [`GenError::Exhausted`] once `max_attempts` candidates in a row collide
    /// or when `amount` exceeds every value the generator can produce;
    /// store lookup errors in lazy mode.
    pub fn unique_tax_ids(&mut self, amount: usize) -> Result<Vec<TaxId>, GenError> {
        let domain = usize::try_from(2 * (MAX_VALID_TAX_ID - MIN_VALID_TAX_ID)).unwrap_or(usize::MAX);
        self.check_domain(FieldKind::TaxId, amount, domain)?;
        let mut out = Vec::with_capacity(amount.min(MAX_CHUNK));
        let mut attempts = 0;
        while out.len() < amount {
            let id = self.fields.tax_id(MIN_VALID_TAX_ID, MAX_VALID_TAX_ID, self.invalid_ratio);
            if self.universe.try_accept(Candidate::TaxId(id))? {
                out.push(id);
                attempts = 0;
            } else {
                attempts += 1;
                self.check_attempts(FieldKind::TaxId, attempts)?;
            }
        }
        Ok(out)
    }

    /// Generate `amount` passport numbers unused in the run and in the store.
    ///
    /// # Errors
    /// Same as [`Assembler::unique_tax_ids`].
    pub fn unique_pass_numbers(&mut self, amount: usize) -> Result<Vec<String>, GenError> {
        self.check_domain(FieldKind::PassNumber, amount, PASS_DOMAIN)?;
        let mut out = Vec::with_capacity(amount.min(MAX_CHUNK));
        let mut attempts = 0;
        while out.len() < amount {
            let pass = self.fields.pass_number();
            if self.universe.try_accept(Candidate::PassNumber(&pass))? {
                out.push(pass);
                attempts = 0;
            } else {
                attempts += 1;
                self.check_attempts(FieldKind::PassNumber, attempts)?;
            }
        }
        Ok(out)
    }

    /// First try `first.last@test.com`, then salted variants until one is free.
    /// The accepted address is reserved immediately.
    pub fn resolve_email(&mut self, first: &str, last: &str) -> Result<String, GenError> {
        let mut candidate = base_email(first, last);
        let mut attempts = 0;
        loop {
            if self.universe.try_accept(Candidate::Email(&candidate))? {
                return Ok(candidate);
            }
            attempts += 1;
            self.check_attempts(FieldKind::Email, attempts)?;
            candidate = self.fields.email(first, last);
        }
    }

    /// Build one record around a pre-generated tax ID and passport number.
    pub fn assemble(&mut self, tax_id: TaxId, pass_number: String) -> Result<UserRecord, GenError> {
        let first_name = self.fields.first_name();
        let last_name = self.fields.last_name();
        let email = self.resolve_email(&first_name, &last_name)?;
        let phone_number = format_phone(self.fields.phone());
        let mut user = UserRecord {
            tax_id,
            first_name,
            last_name,
            email,
            phone_number,
            pass_number,
            comment: String::new(),
        };
        if !user.has_valid_tax_id() {
            user.comment = INVALID_TAX_ID_COMMENT.to_string();
        }
        Ok(user)
    }

    fn check_domain(&self, kind: FieldKind, amount: usize, domain: usize) -> Result<(), GenError> {
        if amount > domain {
            log::error!("Requested {amount} unique {} values, only {domain} exist", kind.label());
            return Err(GenError::Exhausted { field: kind.label(), attempts: 0 });
        }
        Ok(())
    }

    fn check_attempts(&self, kind: FieldKind, attempts: usize) -> Result<(), GenError> {
        if attempts >= self.max_attempts {
            return Err(GenError::Exhausted { field: kind.label(), attempts });
        }
        Ok(())
    }
}
