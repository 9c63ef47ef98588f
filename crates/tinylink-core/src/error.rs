use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

/// Errors produced while creating, resolving or persisting shortened URLs.
///
/// Every variant carries the input that caused it (the long URL or the
/// short code), so the `Display` output alone identifies the failing item
/// of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("invalid url format: {0}")]
    InvalidUrlFormat(String),
    #[error("invalid shortcode format: {0}")]
    InvalidShortcodeFormat(String),
    #[error("invalid validity period for {0}")]
    InvalidValidity(String),
    #[error("shortcode already exists: {0}")]
    DuplicateShortcode(String),
    #[error("shortcode not found: {0}")]
    NotFound(String),
    #[error("shortcode has expired: {0}")]
    Expired(String),
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("no free shortcode for {url} after {attempts} attempts")]
    ResourceExhausted { url: String, attempts: usize },
}
