//! Error types for Gotcha.

use thiserror::Error;

/// Common error type for Gotcha.
#[derive(Error, Debug)]
pub enum GotchaError {
    /// Referenced entity is absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness violation (username or email already registered).
    #[error("{0} already exists")]
    EntityDuplicate(String),

    /// The caller lacks the required privilege or supplied a forged proof of privilege.
    ///
    /// Carries no detail on purpose: which check failed must not be observable.
    #[error("not permitted")]
    Security,

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Database error.
    ///
    /// Generic storage failure (I/O, connection loss, constraint the core does not expect).
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Stored data contradicts an invariant, e.g. a parent chain with a cycle.
    #[error("inconsistent data: {0}")]
    Corrupted(String),

    /// The credential primitive failed to produce a verifier.
    #[error("credential error: {0}")]
    Credential(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GotchaError {
    /// Whether this is one of the domain kinds callers are expected to branch on
    /// (as opposed to a generic failure).
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            GotchaError::NotFound(_)
                | GotchaError::EntityDuplicate(_)
                | GotchaError::Security
                | GotchaError::Validation(_)
        )
    }
}

impl From<sqlx::Error> for GotchaError {
    fn from(e: sqlx::Error) -> Self {
        GotchaError::Database(e.to_string())
    }
}

/// Result type alias for Gotcha operations.
pub type Result<T> = std::result::Result<T, GotchaError>;
