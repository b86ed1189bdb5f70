//! Directory and file names inside a project.

use redraft_error::{RedraftResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};

const SOURCE_DIR: &str = "0_source";
const EXTRACTED_DIR: &str = "1_extracted";
const REWRITTEN_TXT_DIR: &str = "2_rewritten_txt";
const FINAL_EPUB_DIR: &str = "3_final_epub";
const PROJECT_CONFIG_FILE: &str = "project_config.json";
const PROJECT_STATE_FILE: &str = "project_state.json";
const CONTEXT_GLOSSARY_FILE: &str = "context_glossary.json";
const LOG_FILE: &str = "rewriter.log";
const PROMPT_LOG_FILE: &str = "prompt_log.txt";

/// Paths of one project under the projects directory.
///
/// # Examples
///
/// ```
/// use redraft_storage::ProjectLayout;
/// use std::path::Path;
///
/// let layout = ProjectLayout::new("projects", "dune");
/// assert_eq!(layout.state_file(), Path::new("projects/dune/project_state.json"));
/// assert_eq!(layout.rewritten_file("chapter_001.txt"),
///            Path::new("projects/dune/2_rewritten_txt/chapter_001.txt"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    name: String,
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout for project `name` inside `projects_dir`.
    pub fn new(projects_dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let root = projects_dir.as_ref().join(&name);
        Self { name, root }
    }

    /// Project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the project directory exists.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Copy of the source archive.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// Unpacked source archive.
    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join(EXTRACTED_DIR)
    }

    /// Rewritten chapter text files.
    pub fn rewritten_dir(&self) -> PathBuf {
        self.root.join(REWRITTEN_TXT_DIR)
    }

    /// Packaged output archives.
    pub fn final_dir(&self) -> PathBuf {
        self.root.join(FINAL_EPUB_DIR)
    }

    /// `project_config.json`.
    pub fn config_file(&self) -> PathBuf {
        self.root.join(PROJECT_CONFIG_FILE)
    }

    /// `project_state.json`.
    pub fn state_file(&self) -> PathBuf {
        self.root.join(PROJECT_STATE_FILE)
    }

    /// `context_glossary.json`.
    pub fn glossary_file(&self) -> PathBuf {
        self.root.join(CONTEXT_GLOSSARY_FILE)
    }

    /// Per-project log file.
    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Log of every assembled chapter prompt from the latest run.
    pub fn prompt_log_file(&self) -> PathBuf {
        self.root.join(PROMPT_LOG_FILE)
    }

    /// Path of a rewritten chapter text file.
    pub fn rewritten_file(&self, file_name: &str) -> PathBuf {
        self.rewritten_dir().join(file_name)
    }

    /// Path of the copied source archive.
    pub fn source_epub(&self, file_name: &str) -> PathBuf {
        self.source_dir().join(file_name)
    }

    /// Output archive path: `<source stem><suffix>.epub` in the final directory.
    pub fn final_epub(&self, source_file_name: &str, suffix: &str) -> PathBuf {
        let stem = Path::new(source_file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        self.final_dir().join(format!("{}{}.epub", stem, suffix))
    }

    /// Create the project directory and its four stage directories.
    #[tracing::instrument(skip(self), fields(project = %self.name))]
    pub async fn create_dirs(&self) -> RedraftResult<()> {
        for dir in [
            self.root.clone(),
            self.source_dir(),
            self.extracted_dir(),
            self.rewritten_dir(),
            self.final_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
        }
        tracing::info!(path = %self.root.display(), "Created project directories");
        Ok(())
    }

    /// Copy the source archive into the source directory, returning its
    /// file name.
    #[tracing::instrument(skip(self, epub), fields(project = %self.name, epub = %epub.display()))]
    pub async fn import_source(&self, epub: &Path) -> RedraftResult<String> {
        let file_name = epub
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::NotFound(format!(
                    "no file name in {}",
                    epub.display()
                )))
            })?;

        let target = self.source_epub(&file_name);
        tokio::fs::copy(epub, &target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(epub.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "copy {} to {}: {}",
                    epub.display(),
                    target.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(target = %target.display(), "Copied source archive");
        Ok(file_name)
    }
}
