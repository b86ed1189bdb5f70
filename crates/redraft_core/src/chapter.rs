//! Per-chapter records and the chapter status state machine.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Processing status of a chapter.
///
/// `Pending` is assigned at project creation. `Completed` is terminal;
/// `Failed` stays failed until a run explicitly re-queues it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChapterStatus {
    /// Waiting to be rewritten
    #[default]
    Pending,
    /// Rewritten text persisted
    Completed,
    /// Last attempt exhausted its retries
    Failed,
}

impl ChapterStatus {
    /// Whether a chapter in this status may be moved to `next`.
    ///
    /// Same-status updates are always allowed (summary backfill relies on it).
    ///
    /// # Examples
    ///
    /// ```
    /// use redraft_core::ChapterStatus;
    ///
    /// assert!(ChapterStatus::Pending.can_transition_to(ChapterStatus::Completed));
    /// assert!(ChapterStatus::Failed.can_transition_to(ChapterStatus::Pending));
    /// assert!(!ChapterStatus::Completed.can_transition_to(ChapterStatus::Pending));
    /// ```
    pub fn can_transition_to(self, next: ChapterStatus) -> bool {
        use ChapterStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Completed) | (Pending, Failed) | (Failed, Pending)
            )
    }
}

/// Persisted record for one chapter.
///
/// The chapter index is the key of the surrounding map, not a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Chapter {
    /// Archive path of the source document this chapter came from
    id: String,
    /// Chapter title
    title: String,
    /// Processing status
    status: ChapterStatus,
    /// Immutable source text
    original_text: String,
    /// File name (inside the rewritten text directory) holding the output
    rewritten_text_file: String,
    /// Derived summary, empty until generated
    #[serde(default)]
    summary: String,
    /// Last failure message
    #[serde(default)]
    error: Option<String>,
}

impl Chapter {
    /// Create a fresh pending chapter.
    pub fn new(
        index: usize,
        id: impl Into<String>,
        title: impl Into<String>,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: ChapterStatus::Pending,
            original_text: original_text.into(),
            rewritten_text_file: Self::rewritten_file_name(index),
            summary: String::new(),
            error: None,
        }
    }

    /// Output file name for a chapter index, e.g. `chapter_007.txt`.
    pub fn rewritten_file_name(index: usize) -> String {
        format!("chapter_{:03}.txt", index)
    }

    pub(crate) fn set_status(&mut self, status: ChapterStatus) {
        self.status = status;
    }

    pub(crate) fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

/// A chapter paired with its index.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct IndexedChapter {
    /// 1-based chapter index
    index: usize,
    /// The chapter record
    chapter: Chapter,
}

impl IndexedChapter {
    /// Pair a chapter with its index.
    pub fn new(index: usize, chapter: Chapter) -> Self {
        Self { index, chapter }
    }
}

/// Output reference for a completed chapter, handed to packaging.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CompletedChapter {
    /// 1-based chapter index
    index: usize,
    /// Archive path of the source document
    id: String,
    /// Chapter title
    title: String,
    /// Rewritten text file name
    rewritten_text_file: String,
}

impl CompletedChapter {
    pub(crate) fn from_chapter(index: usize, chapter: &Chapter) -> Self {
        Self {
            index,
            id: chapter.id.clone(),
            title: chapter.title.clone(),
            rewritten_text_file: chapter.rewritten_text_file.clone(),
        }
    }
}

/// A single-chapter mutation.
///
/// `summary` and `error` are merged: set when provided and non-empty,
/// left untouched otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ChapterUpdate {
    /// Target status
    status: ChapterStatus,
    /// Rewritten text to persist before the status flips
    rewritten_text: Option<String>,
    /// New summary
    summary: Option<String>,
    /// Failure message
    error: Option<String>,
}

impl ChapterUpdate {
    /// Mark a chapter completed with its rewritten text and summary.
    pub fn completed(rewritten_text: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            status: ChapterStatus::Completed,
            rewritten_text: Some(rewritten_text.into()),
            summary: Some(summary.into()),
            error: None,
        }
    }

    /// Mark a chapter failed with the given message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ChapterStatus::Failed,
            rewritten_text: None,
            summary: None,
            error: Some(error.into()),
        }
    }

    /// Attach a summary without changing the chapter's status.
    pub fn summary_only(status: ChapterStatus, summary: impl Into<String>) -> Self {
        Self {
            status,
            rewritten_text: None,
            summary: Some(summary.into()),
            error: None,
        }
    }

    /// Put a failed chapter back in the queue.
    pub fn requeue() -> Self {
        Self {
            status: ChapterStatus::Pending,
            rewritten_text: None,
            summary: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ChapterStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        assert_eq!(ChapterStatus::from_str("failed").unwrap(), ChapterStatus::Failed);
        assert_eq!(ChapterStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn test_completed_is_terminal() {
        for next in ChapterStatus::iter() {
            let allowed = ChapterStatus::Completed.can_transition_to(next);
            assert_eq!(allowed, next == ChapterStatus::Completed);
        }
    }

    #[test]
    fn test_failed_only_returns_to_pending() {
        assert!(ChapterStatus::Failed.can_transition_to(ChapterStatus::Pending));
        assert!(ChapterStatus::Failed.can_transition_to(ChapterStatus::Failed));
        assert!(!ChapterStatus::Failed.can_transition_to(ChapterStatus::Completed));
    }

    #[test]
    fn test_rewritten_file_name_is_zero_padded() {
        assert_eq!(Chapter::rewritten_file_name(7), "chapter_007.txt");
        assert_eq!(Chapter::rewritten_file_name(1234), "chapter_1234.txt");
    }

    #[test]
    fn test_chapter_json_shape() {
        let chapter = Chapter::new(3, "OEBPS/ch3.xhtml", "Three", "Once upon a time");
        let value = serde_json::to_value(&chapter).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["rewritten_text_file"], "chapter_003.txt");
        assert_eq!(value["summary"], "");
        assert!(value["error"].is_null());
    }
}
