//! Book archive error types.

/// Kinds of archive extraction and packaging errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum EpubErrorKind {
    /// Archive could not be opened or read
    #[display("Failed to read archive: {}", _0)]
    Archive(String),
    /// META-INF/container.xml missing or without a rootfile
    #[display("Invalid container document: {}", _0)]
    Container(String),
    /// Package document missing or malformed
    #[display("Invalid package document: {}", _0)]
    Package(String),
    /// Spine produced no readable chapters
    #[display("No chapters found in {}", _0)]
    NoChapters(String),
    /// Output archive could not be written
    #[display("Failed to write archive: {}", _0)]
    Write(String),
}

/// Archive error with location tracking.
///
/// # Examples
///
/// ```
/// use redraft_error::{EpubError, EpubErrorKind};
///
/// let err = EpubError::new(EpubErrorKind::NoChapters("book.epub".to_string()));
/// assert!(format!("{}", err).contains("book.epub"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("EPUB Error: {} at line {} in {}", kind, line, file)]
pub struct EpubError {
    /// The kind of error that occurred
    pub kind: EpubErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl EpubError {
    /// Create a new archive error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: EpubErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
