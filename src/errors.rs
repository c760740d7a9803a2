use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logger error: {0}")]
    Logger(String),

    #[error("Gave up generating a unique {field} after {attempts} attempts")]
    Exhausted { field: &'static str, attempts: usize },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Record writer disconnected")]
    Disconnected,
}

impl From<std::io::Error> for GenError {
    fn from(e: std::io::Error) -> Self {
        GenError::Io(e.to_string())
    }
}

impl From<tokio::task::JoinError> for GenError {
    fn from(e: tokio::task::JoinError) -> Self {
        GenError::Task(e.to_string())
    }
}
