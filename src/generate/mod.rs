//! Field generators and the uniqueness-enforcing record assembler.
mod assembler;
mod fields;

pub use assembler::{Assembler, MAX_ATTEMPTS};
pub use fields::{
    EMAIL_DOMAIN, FieldGenerator, LETTERS, PASS_DOMAIN, PASS_PREFIX, base_email, format_phone,
};
