//! Top-level error wrapper types.

use crate::{ChapterError, ConfigError, EpubError, JsonError, ProviderError, StorageError};

/// Every error family the pipeline can surface.
///
/// # Examples
///
/// ```
/// use redraft_error::{RedraftError, ConfigError};
///
/// let err: RedraftError = ConfigError::new("Missing field").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RedraftErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Chapter state or prompt error
    #[from(ChapterError)]
    Chapter(ChapterError),
    /// Book archive error
    #[from(EpubError)]
    Epub(EpubError),
}

/// Redraft error with kind discrimination.
///
/// # Examples
///
/// ```
/// use redraft_error::{RedraftResult, StorageError, StorageErrorKind};
///
/// fn might_fail() -> RedraftResult<()> {
///     Err(StorageError::new(StorageErrorKind::FileRead("state".to_string())))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Redraft Error: {}", _0)]
pub struct RedraftError(Box<RedraftErrorKind>);

impl RedraftError {
    /// Create a new error from a kind.
    pub fn new(kind: RedraftErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RedraftErrorKind {
        &self.0
    }

    /// The provider error inside this error, if that is what it wraps.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            RedraftErrorKind::Provider(err) => Some(err),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to RedraftErrorKind
impl<T> From<T> for RedraftError
where
    T: Into<RedraftErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for redraft operations.
pub type RedraftResult<T> = std::result::Result<T, RedraftError>;
