//! Delimited-file output for generated users.
mod options;
mod pipeline;
mod sinks;

pub use options::{CsvOptions, ExportReport};
pub use pipeline::{append_users, write_users};
