//! Core data types for redraft.
//!
//! This crate provides the persisted chapter records and project state,
//! the glossary mapping, and the per-request prompt pieces shared by the
//! rest of the workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod glossary;
mod project;
mod prompt;

pub use chapter::{Chapter, ChapterStatus, ChapterUpdate, CompletedChapter, IndexedChapter};
pub use glossary::Glossary;
pub use project::{ProjectState, SourceChapter, StatusReport};
pub use prompt::{PromptContext, PromptTemplate};
