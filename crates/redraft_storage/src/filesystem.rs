//! Filesystem-backed project repository.
//!
//! State and glossary are JSON documents replaced whole on every save.
//! Writes go to a temp file that is renamed over the target, so a crash
//! mid-write leaves the previous version intact.

use crate::ProjectLayout;
use redraft_core::{Glossary, ProjectState};
use redraft_error::{JsonError, RedraftResult, StorageError, StorageErrorKind};
use redraft_interface::ProjectRepository;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;

const PROMPT_LOG_RULE: &str =
    "================================================================================";

/// Filesystem repository for one project.
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    layout: ProjectLayout,
}

impl FileSystemRepository {
    /// Create a repository over an existing or soon-to-exist layout.
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// The project layout.
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }
}

/// Write `contents` to `path` through a temp file and rename.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> RedraftResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, contents).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;

    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
    })?;
    Ok(())
}

/// Read a UTF-8 file, `None` when it does not exist.
pub(crate) async fn read_optional(path: &Path) -> RedraftResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
        .into()),
    }
}

pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> RedraftResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to serialize {}: {}", path.display(), e)))?;
    write_atomic(path, json.as_bytes()).await
}

pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> RedraftResult<Option<T>> {
    let Some(contents) = read_optional(path).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&contents)
        .map_err(|e| JsonError::new(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(Some(value))
}

#[async_trait::async_trait]
impl ProjectRepository for FileSystemRepository {
    #[tracing::instrument(skip(self), fields(project = %self.layout.name()))]
    async fn load_state(&self) -> RedraftResult<ProjectState> {
        let path = self.layout.state_file();
        let state: ProjectState = read_json(&path).await?.ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
        })?;
        tracing::debug!(chapters = *state.total_chapters(), "Loaded project state");
        Ok(state)
    }

    #[tracing::instrument(skip(self, state), fields(project = %self.layout.name()))]
    async fn save_state(&self, state: &ProjectState) -> RedraftResult<()> {
        write_json(&self.layout.state_file(), state).await?;
        tracing::debug!("Saved project state");
        Ok(())
    }

    #[tracing::instrument(skip(self, text), fields(size = text.len()))]
    async fn write_rewritten_text(&self, file_name: &str, text: &str) -> RedraftResult<()> {
        let path = self.layout.rewritten_file(file_name);
        write_atomic(&path, text.as_bytes()).await?;
        tracing::info!(path = %path.display(), "Wrote rewritten chapter");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn read_rewritten_text(&self, file_name: &str) -> RedraftResult<Option<String>> {
        read_optional(&self.layout.rewritten_file(file_name)).await
    }

    #[tracing::instrument(skip(self), fields(project = %self.layout.name()))]
    async fn load_glossary(&self) -> RedraftResult<Option<Glossary>> {
        read_json(&self.layout.glossary_file()).await
    }

    #[tracing::instrument(skip(self, glossary), fields(project = %self.layout.name()))]
    async fn save_glossary(&self, glossary: &Glossary) -> RedraftResult<()> {
        write_json(&self.layout.glossary_file(), glossary).await?;
        tracing::info!(empty = glossary.is_empty(), "Saved context glossary");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(project = %self.layout.name()))]
    async fn reset_prompt_log(&self) -> RedraftResult<()> {
        let path = self.layout.prompt_log_file();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "delete {}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    #[tracing::instrument(skip(self, prompt), fields(size = prompt.len()))]
    async fn append_prompt_log(
        &self,
        chapter: usize,
        estimated_tokens: usize,
        prompt: &str,
    ) -> RedraftResult<()> {
        let path = self.layout.prompt_log_file();
        let entry = format!(
            "\n{rule}\nCHAPTER {chapter} PROMPT | Token Count: {estimated_tokens}\n{rule}\n{prompt}\n\n",
            rule = PROMPT_LOG_RULE,
        );

        let write_error = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                path.display(),
                e
            )))
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(write_error)?;
        file.write_all(entry.as_bytes()).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;
        Ok(())
    }
}
