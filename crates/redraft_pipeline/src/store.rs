//! Durable chapter state machine.

use redraft_core::{
    Chapter, ChapterStatus, ChapterUpdate, CompletedChapter, IndexedChapter, ProjectState,
    SourceChapter, StatusReport,
};
use redraft_error::RedraftResult;
use redraft_interface::ProjectRepository;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Chapter records behind a [`ProjectRepository`].
///
/// Every mutation loads the whole state, changes one chapter and saves
/// the whole state back, so each saved snapshot is consistent. Rewritten
/// text is written before the state that marks its chapter completed.
#[derive(Debug)]
pub struct ChapterStore<R: ProjectRepository> {
    repository: R,
    update_lock: Mutex<()>,
}

impl<R: ProjectRepository> ChapterStore<R> {
    /// Wrap a repository.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            update_lock: Mutex::new(()),
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Create and persist the initial state, every chapter pending.
    #[instrument(skip(self, sources), fields(chapters = sources.len()))]
    pub async fn initialize(
        &self,
        project_name: &str,
        sources: Vec<SourceChapter>,
    ) -> RedraftResult<ProjectState> {
        let state = ProjectState::new(project_name, sources);
        self.repository.save_state(&state).await?;
        info!(total = *state.total_chapters(), "Initialized project state");
        Ok(state)
    }

    /// Load the current state.
    pub async fn state(&self) -> RedraftResult<ProjectState> {
        self.repository.load_state().await
    }

    /// Look up one chapter.
    pub async fn chapter(&self, index: usize) -> RedraftResult<Option<Chapter>> {
        Ok(self.state().await?.chapter(index).cloned())
    }

    /// Pending chapters in `[start, end]`, ascending, at most `max_count`
    /// (0 = unlimited).
    #[instrument(skip(self))]
    pub async fn get_pending(
        &self,
        max_count: usize,
        start: usize,
        end: Option<usize>,
    ) -> RedraftResult<Vec<IndexedChapter>> {
        let pending = self.state().await?.pending(max_count, start, end);
        debug!(count = pending.len(), "Selected pending chapters");
        Ok(pending)
    }

    /// Apply one chapter's update and persist it.
    ///
    /// # Errors
    ///
    /// Fails when the update is not allowed for the chapter's current
    /// status, or when the text or state cannot be written.
    #[instrument(skip(self, update), fields(status = %update.status()))]
    pub async fn update(&self, index: usize, update: ChapterUpdate) -> RedraftResult<()> {
        let _lock = self.update_lock.lock().await;
        let mut state = self.state().await?;
        state.apply(index, &update)?;

        if let Some(text) = update.rewritten_text() {
            let file_name = state
                .chapter(index)
                .map(|chapter| chapter.rewritten_text_file().clone())
                .unwrap_or_else(|| Chapter::rewritten_file_name(index));
            self.repository.write_rewritten_text(&file_name, text).await?;
        }

        self.repository.save_state(&state).await?;
        debug!("Chapter update persisted");
        Ok(())
    }

    /// Put failed chapters in `[start, end]` back to pending, returning
    /// their indices.
    #[instrument(skip(self))]
    pub async fn requeue_failed(
        &self,
        start: usize,
        end: Option<usize>,
    ) -> RedraftResult<Vec<usize>> {
        let _lock = self.update_lock.lock().await;
        let mut state = self.state().await?;
        let failed = state.failed_in_range(start, end);
        if failed.is_empty() {
            return Ok(failed);
        }

        let requeue = ChapterUpdate::requeue();
        for index in &failed {
            state.apply(*index, &requeue)?;
        }
        self.repository.save_state(&state).await?;
        info!(chapters = ?failed, "Requeued failed chapters");
        Ok(failed)
    }

    /// Progress counts and failure messages.
    pub async fn status_report(&self) -> RedraftResult<StatusReport> {
        Ok(self.state().await?.status_report())
    }

    /// Output references for completed chapters, in index order.
    pub async fn completed_outputs(&self) -> RedraftResult<Vec<CompletedChapter>> {
        Ok(self.state().await?.completed())
    }

    /// A completed chapter's rewritten text, otherwise its original text.
    ///
    /// Rewritten files of chapters that are not completed are ignored.
    pub async fn latest_text(&self, chapter: &Chapter) -> RedraftResult<String> {
        if *chapter.status() != ChapterStatus::Completed {
            return Ok(chapter.original_text().clone());
        }
        let rewritten = self
            .repository
            .read_rewritten_text(chapter.rewritten_text_file())
            .await?;
        Ok(rewritten.unwrap_or_else(|| chapter.original_text().clone()))
    }
}
