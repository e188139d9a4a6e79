use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChargenError>;

// Enum for handling the ambient failures around the chargen engine.
// The allocation engine itself never fails: budget problems are reported through validation issues.
#[derive(Debug, Error)]
pub enum ChargenError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError), // The server-supplied catalog is unusable.

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error), // Errors related to data serialization.

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error), // Input/output errors.

    #[error("Logger error: {0}")]
    Logger(String),

    #[error("Draft storage is full ({0} drafts)")]
    DraftQuotaExceeded(usize),

    #[error("No home directory available")]
    NoHomeDirectory,
}

impl From<log::SetLoggerError> for ChargenError {
    fn from(error: log::SetLoggerError) -> Self {
        ChargenError::Logger(error.to_string())
    }
}

// Startup precondition failures, reported once to the caller as a user-facing message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("The character catalog defines no attributes")]
    NoAttributes,

    #[error("The character catalog defines no skills")]
    NoSkills,

    #[error("The character catalog has no priority table")]
    NoPriorityTable,
}
