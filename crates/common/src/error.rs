use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Invalid record '{slug}': {reason}")]
    InvalidRecord { slug: String, reason: String },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn invalid_record(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            slug: slug.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
