//! In-memory implementation of ProjectRepository for testing.
//!
//! State, glossary, rewritten texts and the prompt log live in maps behind
//! an `RwLock`. All data is lost when the repository is dropped.

use async_trait::async_trait;
use redraft_core::{Glossary, ProjectState};
use redraft_error::{RedraftResult, StorageError, StorageErrorKind};
use redraft_interface::ProjectRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Contents {
    state: Option<ProjectState>,
    glossary: Option<Glossary>,
    texts: HashMap<String, String>,
    prompt_log: Vec<(usize, usize, String)>,
    state_saves: usize,
}

/// In-memory project repository.
///
/// Clones share the same storage, so a test can keep a handle while the
/// pipeline owns another.
///
/// # Example
/// ```
/// use redraft_core::{ProjectState, SourceChapter};
/// use redraft_pipeline::InMemoryRepository;
///
/// let state = ProjectState::new("demo", vec![SourceChapter::new("c1.xhtml", "One", "Text.")]);
/// let repo = InMemoryRepository::with_state(state);
/// let handle = repo.clone();
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    contents: Arc<RwLock<Contents>>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `state`.
    pub fn with_state(state: ProjectState) -> Self {
        Self {
            contents: Arc::new(RwLock::new(Contents {
                state: Some(state),
                ..Contents::default()
            })),
        }
    }

    /// Current state without going through the trait (for testing).
    pub async fn state(&self) -> Option<ProjectState> {
        self.contents.read().await.state.clone()
    }

    /// Stored rewritten text (for testing).
    pub async fn text(&self, file_name: &str) -> Option<String> {
        self.contents.read().await.texts.get(file_name).cloned()
    }

    /// Stored glossary (for testing).
    pub async fn glossary(&self) -> Option<Glossary> {
        self.contents.read().await.glossary.clone()
    }

    /// Set the glossary directly (for testing).
    pub async fn set_glossary(&self, glossary: Glossary) {
        self.contents.write().await.glossary = Some(glossary);
    }

    /// Prompt log entries as `(chapter, estimated_tokens, prompt)` (for testing).
    pub async fn prompt_log(&self) -> Vec<(usize, usize, String)> {
        self.contents.read().await.prompt_log.clone()
    }

    /// Number of times the state was saved (for testing).
    pub async fn state_saves(&self) -> usize {
        self.contents.read().await.state_saves
    }
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn load_state(&self) -> RedraftResult<ProjectState> {
        self.contents.read().await.state.clone().ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound("project state".to_string())).into()
        })
    }

    async fn save_state(&self, state: &ProjectState) -> RedraftResult<()> {
        let mut contents = self.contents.write().await;
        contents.state = Some(state.clone());
        contents.state_saves += 1;
        Ok(())
    }

    async fn write_rewritten_text(&self, file_name: &str, text: &str) -> RedraftResult<()> {
        self.contents
            .write()
            .await
            .texts
            .insert(file_name.to_string(), text.to_string());
        Ok(())
    }

    async fn read_rewritten_text(&self, file_name: &str) -> RedraftResult<Option<String>> {
        Ok(self.text(file_name).await)
    }

    async fn load_glossary(&self) -> RedraftResult<Option<Glossary>> {
        Ok(self.glossary().await)
    }

    async fn save_glossary(&self, glossary: &Glossary) -> RedraftResult<()> {
        self.set_glossary(glossary.clone()).await;
        Ok(())
    }

    async fn reset_prompt_log(&self) -> RedraftResult<()> {
        self.contents.write().await.prompt_log.clear();
        Ok(())
    }

    async fn append_prompt_log(
        &self,
        chapter: usize,
        estimated_tokens: usize,
        prompt: &str,
    ) -> RedraftResult<()> {
        self.contents
            .write()
            .await
            .prompt_log
            .push((chapter, estimated_tokens, prompt.to_string()));
        Ok(())
    }
}
