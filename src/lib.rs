//! Synthetic user generation with uniqueness guarantees across the current run
//! and everything already persisted in the SQLite store.
pub mod batch;
pub mod config;
pub mod errors;
pub mod export;
pub mod generate;
pub mod logger;
pub mod oracle;
pub mod pipeline;
pub mod store;
pub mod types;
