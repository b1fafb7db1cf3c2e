use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnipError>;

#[derive(Debug, Error)]
pub enum SnipError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("immutable origin: {0}")]
    ImmutableOrigin(String),

    #[error("consistency violation: {0}")]
    Consistency(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SnipError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ImmutableOrigin(_) => "IMMUTABLE_ORIGIN",
            Self::Consistency(_) => "CONSISTENCY_VIOLATION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Sqlite(_) => "SQLITE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn mutex_poisoned(what: &str) -> Self {
        Self::Internal(format!("{what} mutex poisoned"))
    }
}
