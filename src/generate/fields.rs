//! Random candidate values for each user field.
//!
//! Every `FieldGenerator` owns its own ChaCha8 stream, so workers never share
//! a random source. Use [`FieldGenerator::fork`] to derive an independent
//! generator for another worker.

use fake::Fake;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::TaxId;

/// Polish upper-case alphabet used for passport letters and email salt.
pub const LETTERS: &[char] = &[
    'A', 'Ą', 'B', 'C', 'Ć', 'D', 'E', 'Ę', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'Ł', 'M', 'N', 'Ń',
    'O', 'Ó', 'P', 'R', 'S', 'Ś', 'T', 'U', 'W', 'Y', 'Z', 'Ź', 'Ż',
];

/// Constant tag opening every passport number.
pub const PASS_PREFIX: &str = "ZZ";
pub const EMAIL_DOMAIN: &str = "@test.com";

const PASS_DIGITS_MIN: u32 = 100_000;
const PASS_DIGITS_MAX: u32 = 999_999;
/// Number of distinct passport numbers [`FieldGenerator::pass_number`] can produce.
pub const PASS_DOMAIN: usize = LETTERS.len() * (PASS_DIGITS_MAX - PASS_DIGITS_MIN) as usize;
const PHONE_MIN: u32 = 100_000_000;
const PHONE_MAX: u32 = 999_999_999;
const EMAIL_SALT_MIN: usize = 1;
const EMAIL_SALT_MAX: usize = 4;

#[derive(Debug, Clone)]
pub struct FieldGenerator {
    rng: ChaCha8Rng,
}

impl FieldGenerator {
    /// Deterministic generator; the same seed yields the same values.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Generator seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self { rng: ChaCha8Rng::from_os_rng() }
    }

    /// Derive an independent generator for another worker.
    pub fn fork(&mut self) -> Self {
        Self { rng: ChaCha8Rng::from_rng(&mut self.rng) }
    }

    /// Tax payer number in `[min, max)` with probability `(100 - invalid_ratio) / 100`,
    /// otherwise a value from the mirrored range `[-(max - 1), -(min - 1))`.
    ///
    /// # Panics
    /// Panics if `min >= max` or `min < 1`, since either range would be empty.
    pub fn tax_id(&mut self, min: TaxId, max: TaxId, invalid_ratio: u32) -> TaxId {
        if self.rng.random_range(0..100u32) >= invalid_ratio {
            self.rng.random_range(min..max)
        } else {
            self.rng.random_range(-(max - 1)..-(min - 1))
        }
    }

    /// `ZZ` + one letter + six digits, e.g. `ZZŁ482113`.
    pub fn pass_number(&mut self) -> String {
        let letter = self.letter();
        let digits = self.rng.random_range(PASS_DIGITS_MIN..PASS_DIGITS_MAX);
        format!("{PASS_PREFIX}{letter}{digits:06}")
    }

    /// Salted email: `first.last` plus 1-4 random letters, all lower-case.
    pub fn email(&mut self, first: &str, last: &str) -> String {
        let salt_len = self.rng.random_range(EMAIL_SALT_MIN..=EMAIL_SALT_MAX);
        let salt: String = (0..salt_len).map(|_| self.letter()).collect();
        format!("{}.{}{}{EMAIL_DOMAIN}", sanitize(first), sanitize(last), salt).to_lowercase()
    }

    pub fn phone(&mut self) -> u32 {
        self.rng.random_range(PHONE_MIN..PHONE_MAX)
    }

    pub fn first_name(&mut self) -> String {
        FirstName(EN).fake_with_rng(&mut self.rng)
    }

    pub fn last_name(&mut self) -> String {
        LastName(EN).fake_with_rng(&mut self.rng)
    }

    fn letter(&mut self) -> char {
        LETTERS[self.rng.random_range(0..LETTERS.len())]
    }
}

/// Unsalted email candidate tried before falling back to [`FieldGenerator::email`].
pub fn base_email(first: &str, last: &str) -> String {
    format!("{}.{}{EMAIL_DOMAIN}", sanitize(first), sanitize(last)).to_lowercase()
}

pub fn format_phone(phone: u32) -> String {
    format!("+{phone}")
}

// Apostrophes and blanks never make it into an address.
fn sanitize(name: &str) -> String {
    name.chars().filter(|c| *c != '\'' && !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MAX_VALID_TAX_ID, MIN_VALID_TAX_ID};

    #[test]
    fn seeded_generators_are_reproducible() {
        let mut a = FieldGenerator::seeded(7);
        let mut b = FieldGenerator::seeded(7);
        for _ in 0..50 {
            assert_eq!(a.pass_number(), b.pass_number());
            assert_eq!(a.phone(), b.phone());
        }
    }

    #[test]
    fn forks_diverge_from_parent() {
        let mut root = FieldGenerator::seeded(1);
        let mut child = root.fork();
        let parent_vals: Vec<u32> = (0..8).map(|_| root.phone()).collect();
        let child_vals: Vec<u32> = (0..8).map(|_| child.phone()).collect();
        assert_ne!(parent_vals, child_vals);
    }

    #[test]
    fn ratio_zero_is_always_valid() {
        let mut g = FieldGenerator::seeded(3);
        for _ in 0..1000 {
            let id = g.tax_id(MIN_VALID_TAX_ID, MAX_VALID_TAX_ID, 0);
            assert!((MIN_VALID_TAX_ID..MAX_VALID_TAX_ID).contains(&id));
        }
    }

    #[test]
    fn ratio_hundred_is_always_invalid() {
        let mut g = FieldGenerator::seeded(4);
        for _ in 0..1000 {
            let id = g.tax_id(MIN_VALID_TAX_ID, MAX_VALID_TAX_ID, 100);
            assert!(id < MIN_VALID_TAX_ID);
            assert!(id >= -(MAX_VALID_TAX_ID - 1));
        }
    }

    #[test]
    fn pass_number_shape() {
        let mut g = FieldGenerator::seeded(5);
        for _ in 0..200 {
            let p = g.pass_number();
            let chars: Vec<char> = p.chars().collect();
            assert_eq!(chars.len(), 9);
            assert_eq!(&p[..2], PASS_PREFIX);
            assert!(LETTERS.contains(&chars[2]));
            assert!(chars[3..].iter().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn salted_email_is_lowercase_with_short_salt() {
        let mut g = FieldGenerator::seeded(6);
        for _ in 0..200 {
            let e = g.email("Jan", "O'Brien");
            assert_eq!(e, e.to_lowercase());
            assert!(e.starts_with("jan.obrien"));
            assert!(e.ends_with(EMAIL_DOMAIN));
            let local = e.trim_end_matches(EMAIL_DOMAIN);
            let salt = local.trim_start_matches("jan.obrien").chars().count();
            assert!((EMAIL_SALT_MIN..=EMAIL_SALT_MAX).contains(&salt), "salt len {salt} in {e}");
        }
    }

    #[test]
    fn base_email_strips_apostrophes_and_blanks() {
        assert_eq!(base_email("Mary Ann", "D'Angelo"), "maryann.dangelo@test.com");
    }

    #[test]
    fn phone_has_nine_digits() {
        let mut g = FieldGenerator::seeded(8);
        for _ in 0..200 {
            let s = format_phone(g.phone());
            assert!(s.starts_with('+'));
            assert_eq!(s.len(), 10);
        }
    }

    #[test]
    fn names_are_not_empty() {
        let mut g = FieldGenerator::seeded(9);
        assert!(!g.first_name().is_empty());
        assert!(!g.last_name().is_empty());
    }
}
