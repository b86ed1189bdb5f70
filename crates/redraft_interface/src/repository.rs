//! Project persistence capability.

use async_trait::async_trait;
use redraft_core::{Glossary, ProjectState};
use redraft_error::RedraftResult;

/// Durable storage for one project.
///
/// State is always read and written whole; there are no partial writes.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Load the full project state.
    async fn load_state(&self) -> RedraftResult<ProjectState>;

    /// Replace the persisted project state.
    async fn save_state(&self, state: &ProjectState) -> RedraftResult<()>;

    /// Persist a chapter's rewritten text under `file_name`.
    async fn write_rewritten_text(&self, file_name: &str, text: &str) -> RedraftResult<()>;

    /// Read a chapter's rewritten text, `None` if it was never written.
    async fn read_rewritten_text(&self, file_name: &str) -> RedraftResult<Option<String>>;

    /// Load the glossary, `None` if it was never built.
    async fn load_glossary(&self) -> RedraftResult<Option<Glossary>>;

    /// Replace the persisted glossary.
    async fn save_glossary(&self, glossary: &Glossary) -> RedraftResult<()>;

    /// Truncate the prompt log at the start of a run.
    async fn reset_prompt_log(&self) -> RedraftResult<()>;

    /// Append one assembled chapter prompt to the prompt log.
    async fn append_prompt_log(
        &self,
        chapter: usize,
        estimated_tokens: usize,
        prompt: &str,
    ) -> RedraftResult<()>;
}
