//! Error types for the checklist service
//!
//! All errors use thiserror for structured error handling. The domain
//! kinds (not found, conflict, access denied, ...) are transport-neutral;
//! the HTTP layer maps them to status codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Access denied. {0}")]
    AccessDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvariantViolation(String),

    /// Nothing matched the requested export scope.
    #[error("{0}")]
    NoData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable machine-readable code for each kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::AccessDenied(_) => "ACCESS_DENIED",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            AppError::NoData(_) => "NO_DATA",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Turn a store unique-constraint failure into `Conflict`, leaving
    /// every other database error untouched.
    pub fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        let is_unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if is_unique {
            AppError::Conflict(message.into())
        } else {
            AppError::Database(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
