//! Error types for redraft.
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use redraft_error::{RedraftResult, ProviderError, ProviderErrorKind};
//!
//! fn call_provider() -> RedraftResult<String> {
//!     Err(ProviderError::new(ProviderErrorKind::Transport("connection reset".into())))?
//! }
//!
//! match call_provider() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod config;
mod epub;
mod error;
mod json;
mod provider;
mod storage;

pub use chapter::{ChapterError, ChapterErrorKind};
pub use config::ConfigError;
pub use epub::{EpubError, EpubErrorKind};
pub use error::{RedraftError, RedraftErrorKind, RedraftResult};
pub use json::JsonError;
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult, RetryableError};
pub use storage::{StorageError, StorageErrorKind};
