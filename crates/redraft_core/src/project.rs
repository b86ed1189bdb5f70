//! Whole-project state and the single-chapter mutations applied to it.

use crate::{Chapter, ChapterStatus, ChapterUpdate, CompletedChapter, IndexedChapter};
use derive_getters::Getters;
use redraft_error::{ChapterError, ChapterErrorKind, RedraftResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A chapter as supplied by the extraction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SourceChapter {
    /// Archive path of the source document
    id: String,
    /// Chapter title
    title: String,
    /// Plain text of the chapter
    original_text: String,
}

impl SourceChapter {
    /// Create a source chapter record.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            original_text: original_text.into(),
        }
    }
}

/// Durable state for one rewrite project.
///
/// Chapters are keyed by their 1-based index; JSON encodes the keys as
/// decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    /// Project name
    project_name: String,
    /// Number of chapters extracted at creation
    total_chapters: usize,
    /// Chapter records by index
    chapters: BTreeMap<usize, Chapter>,
}

impl ProjectState {
    /// Build the initial state: every chapter pending, numbered from 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use redraft_core::{ProjectState, SourceChapter};
    ///
    /// let state = ProjectState::new("demo", vec![
    ///     SourceChapter::new("ch1.xhtml", "One", "First."),
    ///     SourceChapter::new("ch2.xhtml", "Two", "Second."),
    /// ]);
    /// assert_eq!(*state.total_chapters(), 2);
    /// assert_eq!(state.chapter(2).unwrap().rewritten_text_file(), "chapter_002.txt");
    /// ```
    pub fn new(project_name: impl Into<String>, sources: Vec<SourceChapter>) -> Self {
        let chapters: BTreeMap<usize, Chapter> = sources
            .into_iter()
            .enumerate()
            .map(|(i, source)| {
                let index = i + 1;
                (
                    index,
                    Chapter::new(index, source.id, source.title, source.original_text),
                )
            })
            .collect();
        Self {
            project_name: project_name.into(),
            total_chapters: chapters.len(),
            chapters,
        }
    }

    /// Look up a chapter by index.
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(&index)
    }

    /// Pending chapters with index in `[start, end]`, ascending, at most
    /// `max_count` of them (0 = unlimited). `end = None` means no upper bound.
    pub fn pending(&self, max_count: usize, start: usize, end: Option<usize>) -> Vec<IndexedChapter> {
        let limit = if max_count == 0 { usize::MAX } else { max_count };
        self.in_range(start, end)
            .filter(|(_, chapter)| *chapter.status() == ChapterStatus::Pending)
            .take(limit)
            .map(|(index, chapter)| IndexedChapter::new(index, chapter.clone()))
            .collect()
    }

    /// Indices of failed chapters with index in `[start, end]`.
    pub fn failed_in_range(&self, start: usize, end: Option<usize>) -> Vec<usize> {
        self.in_range(start, end)
            .filter(|(_, chapter)| *chapter.status() == ChapterStatus::Failed)
            .map(|(index, _)| index)
            .collect()
    }

    /// Output references for every completed chapter, in index order.
    pub fn completed(&self) -> Vec<CompletedChapter> {
        self.chapters
            .iter()
            .filter(|(_, chapter)| *chapter.status() == ChapterStatus::Completed)
            .map(|(index, chapter)| CompletedChapter::from_chapter(*index, chapter))
            .collect()
    }

    /// Concatenation of every chapter's original text, blank-line separated.
    pub fn all_original_text(&self) -> String {
        self.chapters
            .values()
            .map(|chapter| chapter.original_text().as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Apply one chapter's update to the in-memory state.
    ///
    /// Persisting the rewritten text is the caller's job and must happen
    /// before the state carrying the new status is saved.
    ///
    /// # Errors
    ///
    /// Fails when the chapter does not exist, the status change is not
    /// allowed, a completion carries no rewritten text, or a failure
    /// carries no message.
    pub fn apply(&mut self, index: usize, update: &ChapterUpdate) -> RedraftResult<()> {
        let chapter = self
            .chapters
            .get_mut(&index)
            .ok_or_else(|| ChapterError::new(ChapterErrorKind::NotFound(index)))?;

        let from = *chapter.status();
        let to = *update.status();
        if !from.can_transition_to(to) {
            return Err(ChapterError::new(ChapterErrorKind::InvalidTransition {
                index,
                from: from.to_string(),
                to: to.to_string(),
            })
            .into());
        }

        let error = update.error().as_deref().filter(|e| !e.trim().is_empty());
        match to {
            ChapterStatus::Completed
                if from != ChapterStatus::Completed && update.rewritten_text().is_none() =>
            {
                return Err(ChapterError::new(ChapterErrorKind::MissingRewrittenText(index)).into());
            }
            ChapterStatus::Failed if error.is_none() && chapter.error().is_none() => {
                return Err(ChapterError::new(ChapterErrorKind::MissingErrorMessage(index)).into());
            }
            _ => {}
        }

        chapter.set_status(to);
        if let Some(summary) = update.summary().as_deref().filter(|s| !s.is_empty()) {
            chapter.set_summary(summary);
        }
        match to {
            ChapterStatus::Completed => chapter.set_error(None),
            ChapterStatus::Pending if from == ChapterStatus::Failed => chapter.set_error(None),
            _ => {
                if let Some(error) = error {
                    chapter.set_error(Some(error.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Progress counts and failure messages.
    pub fn status_report(&self) -> StatusReport {
        let count = |status: ChapterStatus| {
            self.chapters
                .values()
                .filter(|chapter| *chapter.status() == status)
                .count()
        };
        let failures = self
            .chapters
            .iter()
            .filter(|(_, chapter)| *chapter.status() == ChapterStatus::Failed)
            .map(|(index, chapter)| (*index, chapter.error().clone().unwrap_or_default()))
            .collect();
        StatusReport {
            project_name: self.project_name.clone(),
            total_chapters: self.total_chapters,
            completed: count(ChapterStatus::Completed),
            pending: count(ChapterStatus::Pending),
            failed: count(ChapterStatus::Failed),
            failures,
        }
    }

    fn in_range(
        &self,
        start: usize,
        end: Option<usize>,
    ) -> impl Iterator<Item = (usize, &Chapter)> {
        let end = end.unwrap_or(usize::MAX);
        self.chapters
            .range(start..)
            .take_while(move |(index, _)| **index <= end)
            .map(|(index, chapter)| (*index, chapter))
    }
}

/// Summary of a project's progress.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct StatusReport {
    /// Project name
    project_name: String,
    /// Number of chapters in the project
    total_chapters: usize,
    /// Completed chapter count
    completed: usize,
    /// Pending chapter count
    pending: usize,
    /// Failed chapter count
    failed: usize,
    /// `(index, error)` for each failed chapter
    failures: Vec<(usize, String)>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Project Status: {} ---", self.project_name)?;
        writeln!(f, "Total Chapters: {}", self.total_chapters)?;
        writeln!(f, "  - Completed: {}", self.completed)?;
        writeln!(f, "  - Pending:   {}", self.pending)?;
        writeln!(f, "  - Failed:    {}", self.failed)?;
        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed Chapters:")?;
            for (index, error) in &self.failures {
                writeln!(f, "  - Chapter {}: {}", index, error)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: usize) -> ProjectState {
        let sources = (1..=n)
            .map(|i| SourceChapter::new(format!("ch{i}.xhtml"), format!("Chapter {i}"), format!("text {i}")))
            .collect();
        ProjectState::new("test", sources)
    }

    fn indices(chapters: &[IndexedChapter]) -> Vec<usize> {
        chapters.iter().map(|c| *c.index()).collect()
    }

    #[test]
    fn test_pending_respects_range_and_limit() {
        let state = state(6);
        assert_eq!(indices(&state.pending(0, 1, None)), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(indices(&state.pending(0, 2, Some(4))), vec![2, 3, 4]);
        assert_eq!(indices(&state.pending(2, 3, None)), vec![3, 4]);
        assert!(state.pending(0, 7, None).is_empty());
    }

    #[test]
    fn test_pending_skips_completed_and_failed() {
        let mut state = state(4);
        state.apply(1, &ChapterUpdate::completed("done", "sum")).unwrap();
        state.apply(3, &ChapterUpdate::failed("boom")).unwrap();
        assert_eq!(indices(&state.pending(0, 1, None)), vec![2, 4]);
    }

    #[test]
    fn test_json_keys_are_decimal_strings() {
        let state = state(2);
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["projectName"], "test");
        assert_eq!(value["totalChapters"], 2);
        assert!(value["chapters"]["1"].is_object());
        assert!(value["chapters"]["2"].is_object());

        let text = serde_json::to_string(&state).unwrap();
        let back: ProjectState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_keys_order_numerically() {
        let state = state(12);
        let keys: Vec<usize> = state.chapters().keys().copied().collect();
        assert_eq!(keys, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_completion_clears_error_and_merges_summary() {
        let mut state = state(1);
        state.apply(1, &ChapterUpdate::failed("first try")).unwrap();
        state.apply(1, &ChapterUpdate::requeue()).unwrap();
        state.apply(1, &ChapterUpdate::completed("text", "")).unwrap();
        let chapter = state.chapter(1).unwrap();
        assert_eq!(*chapter.status(), ChapterStatus::Completed);
        assert_eq!(chapter.error(), &None);
        assert_eq!(chapter.summary(), "");

        state
            .apply(1, &ChapterUpdate::summary_only(ChapterStatus::Completed, "late summary"))
            .unwrap();
        assert_eq!(state.chapter(1).unwrap().summary(), "late summary");
    }

    #[test]
    fn test_invalid_updates_are_rejected() {
        let mut state = state(2);
        let missing = state.apply(9, &ChapterUpdate::failed("x"));
        assert!(missing.is_err());

        let no_text = ChapterUpdate::summary_only(ChapterStatus::Completed, "s");
        assert!(state.apply(1, &no_text).is_err());

        state.apply(2, &ChapterUpdate::completed("t", "s")).unwrap();
        assert!(state.apply(2, &ChapterUpdate::failed("late")).is_err());
        assert_eq!(*state.chapter(2).unwrap().status(), ChapterStatus::Completed);
    }

    #[test]
    fn test_failure_without_message_is_rejected() {
        let mut state = state(1);
        assert!(state.apply(1, &ChapterUpdate::failed("")).is_err());
        assert!(state.apply(1, &ChapterUpdate::failed("  ")).is_err());
        let chapter = state.chapter(1).unwrap();
        assert_eq!(*chapter.status(), ChapterStatus::Pending);
        assert_eq!(chapter.error(), &None);
    }

    #[test]
    fn test_status_report_lists_failures() {
        let mut state = state(3);
        state.apply(1, &ChapterUpdate::completed("t", "s")).unwrap();
        state.apply(2, &ChapterUpdate::failed("quota exhausted")).unwrap();
        let report = state.status_report();
        assert_eq!(*report.completed(), 1);
        assert_eq!(*report.pending(), 1);
        assert_eq!(*report.failed(), 1);
        assert_eq!(report.failures(), &vec![(2, "quota exhausted".to_string())]);
        assert!(report.to_string().contains("Chapter 2: quota exhausted"));
    }

    #[test]
    fn test_all_original_text_joins_in_order() {
        let state = state(3);
        assert_eq!(state.all_original_text(), "text 1\n\ntext 2\n\ntext 3");
    }
}
