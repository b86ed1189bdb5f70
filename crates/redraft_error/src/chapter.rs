//! Chapter state machine and prompt assembly error types.

/// Kinds of chapter errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ChapterErrorKind {
    /// No chapter with this index exists in the project state
    #[display("Chapter {} does not exist", _0)]
    NotFound(usize),
    /// Status change not permitted by the chapter state machine
    #[display("Chapter {} cannot move from {} to {}", index, from, to)]
    InvalidTransition {
        /// Chapter index
        index: usize,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// Completing a chapter requires its rewritten text
    #[display("Chapter {} marked completed without rewritten text", _0)]
    MissingRewrittenText(usize),
    /// Failing a chapter requires an error message
    #[display("Chapter {} marked failed without an error message", _0)]
    MissingErrorMessage(usize),
    /// Prompt template could not be parsed
    #[display("Invalid prompt template: {}", _0)]
    Template(String),
}

/// Chapter error with location tracking.
///
/// # Examples
///
/// ```
/// use redraft_error::{ChapterError, ChapterErrorKind};
///
/// let err = ChapterError::new(ChapterErrorKind::NotFound(42));
/// assert!(format!("{}", err).contains("Chapter 42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Chapter Error: {} at line {} in {}", kind, line, file)]
pub struct ChapterError {
    /// The kind of error that occurred
    pub kind: ChapterErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ChapterError {
    /// Create a new chapter error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ChapterErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
