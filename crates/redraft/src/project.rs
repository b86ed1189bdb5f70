//! Project lifecycle: create, open, resolve run settings, package.

use derive_getters::Getters;
use redraft_core::{PromptTemplate, ProjectState, StatusReport};
use redraft_epub::{ChapterOutput, extract_chapters, package_epub};
use redraft_error::{EpubError, EpubErrorKind, RedraftResult, StorageError, StorageErrorKind};
use redraft_interface::ProjectRepository;
use redraft_pipeline::ChapterStore;
use redraft_rate_limit::Defaults;
use redraft_storage::{FileSystemRepository, ProjectConfig, ProjectLayout, ProjectOverrides};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// A project directory together with its configuration.
#[derive(Debug, Clone, Getters)]
pub struct Project {
    /// Where the project's files live
    layout: ProjectLayout,
    /// Settings fixed at creation
    config: ProjectConfig,
}

/// Where a packaged book was written and how much of it was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PackagedEpub {
    /// Output archive
    path: PathBuf,
    /// Chapters whose body was replaced
    chapters_replaced: usize,
    /// Chapters marked completed in the project state
    chapters_completed: usize,
}

impl Project {
    /// Create a project: copy the source archive, store the style
    /// reference, extract the chapters and initialise every chapter as
    /// pending.
    ///
    /// An existing project of the same name is overwritten with a warning;
    /// its extracted files and glossary are discarded.
    ///
    /// # Errors
    ///
    /// Missing input files, an archive without chapters, or any failure
    /// to write the project directory.
    #[instrument(skip(projects_dir, epub, style_reference), fields(epub = %epub.display()))]
    pub async fn create(
        projects_dir: &Path,
        name: &str,
        epub: &Path,
        style_reference: &Path,
    ) -> RedraftResult<(Self, ProjectState)> {
        if !epub.is_file() {
            return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                "EPUB file {}",
                epub.display()
            )))
            .into());
        }
        let style_reference_text = read_text(style_reference).await?;

        let layout = ProjectLayout::new(projects_dir, name);
        if layout.config_file().is_file() {
            warn!(project = name, "Project already exists, overwriting configuration, source and state");
            remove_stale(&layout).await?;
        }
        layout.create_dirs().await?;

        let source_epub = layout.import_source(epub).await?;
        let config = ProjectConfig::new(name, source_epub.as_str(), style_reference_text);
        config.save(&layout.config_file()).await?;

        let source = layout.source_epub(&source_epub);
        let extracted = layout.extracted_dir();
        let chapters = tokio::task::spawn_blocking(move || extract_chapters(&source, &extracted))
            .await
            .map_err(|e| {
                EpubError::new(EpubErrorKind::Archive(format!("extraction task failed: {}", e)))
            })??;

        let store = ChapterStore::new(FileSystemRepository::new(layout.clone()));
        let state = store.initialize(name, chapters).await?;
        info!(
            chapters = *state.total_chapters(),
            path = %layout.root().display(),
            "Project created"
        );
        Ok((Self { layout, config }, state))
    }

    /// Open an existing project.
    ///
    /// # Errors
    ///
    /// `NotFound` when the project directory or its configuration is missing.
    pub async fn open(projects_dir: &Path, name: &str) -> RedraftResult<Self> {
        let layout = ProjectLayout::new(projects_dir, name);
        if !layout.exists() {
            return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                "project '{}' at {}",
                name,
                layout.root().display()
            )))
            .into());
        }
        let config = ProjectConfig::load(&layout.config_file()).await?;
        debug!(project = name, "Opened project");
        Ok(Self { layout, config })
    }

    /// Repository over the project directory.
    pub fn repository(&self) -> FileSystemRepository {
        FileSystemRepository::new(self.layout.clone())
    }

    /// Chapter store over the project directory.
    pub fn store(&self) -> ChapterStore<FileSystemRepository> {
        ChapterStore::new(self.repository())
    }

    /// Progress counts and failure messages.
    pub async fn status(&self) -> RedraftResult<StatusReport> {
        self.store().status_report().await
    }

    /// Package completed chapters into `<source stem><suffix>.epub`.
    ///
    /// Chapters that are not completed, or whose text file is missing,
    /// keep their original content.
    #[instrument(skip(self), fields(project = %self.layout.name()))]
    pub async fn package(&self, suffix: &str) -> RedraftResult<PackagedEpub> {
        let store = self.store();
        let completed = store.completed_outputs().await?;

        let mut outputs = Vec::with_capacity(completed.len());
        for chapter in &completed {
            match store
                .repository()
                .read_rewritten_text(chapter.rewritten_text_file())
                .await?
            {
                Some(text) => outputs.push(ChapterOutput::new(chapter.id().as_str(), text)),
                None => warn!(
                    chapter = *chapter.index(),
                    file = %chapter.rewritten_text_file(),
                    "Rewritten text missing, keeping original chapter"
                ),
            }
        }
        if outputs.is_empty() {
            warn!("No rewritten chapters yet, the package will contain the original text");
        }

        let extracted = self.layout.extracted_dir();
        if !extracted.is_dir() {
            return Err(StorageError::new(StorageErrorKind::NotFound(
                extracted.display().to_string(),
            ))
            .into());
        }

        let path = self.layout.final_epub(self.config.source_epub(), suffix);
        let target = path.clone();
        let chapters_replaced =
            tokio::task::spawn_blocking(move || package_epub(&extracted, &outputs, &target))
                .await
                .map_err(|e| {
                    EpubError::new(EpubErrorKind::Write(format!("packaging task failed: {}", e)))
                })??;

        info!(path = %path.display(), chapters_replaced, "Packaged EPUB");
        Ok(PackagedEpub {
            path,
            chapters_replaced,
            chapters_completed: completed.len(),
        })
    }
}

/// Provider, model and chapter limit for one run.
///
/// Each value comes from the command line if given, else the project's
/// overrides, else the global defaults.
///
/// # Examples
///
/// ```
/// use redraft::{Defaults, ProjectOverrides, RunSettings};
///
/// let overrides = ProjectOverrides {
///     model: Some("gemini-1.5-pro".to_string()),
///     ..ProjectOverrides::default()
/// };
/// let settings = RunSettings::resolve(Some("openai"), None, None, &overrides, &Defaults::default());
/// assert_eq!(settings.provider(), "openai");
/// assert_eq!(settings.model(), "gemini-1.5-pro");
/// assert_eq!(*settings.max_chapters(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RunSettings {
    /// Provider name
    provider: String,
    /// Model name
    model: String,
    /// Chapters per run, 0 = unlimited
    max_chapters: usize,
}

impl RunSettings {
    /// Apply the precedence command line > project > defaults.
    pub fn resolve(
        provider: Option<&str>,
        model: Option<&str>,
        max_chapters: Option<usize>,
        overrides: &ProjectOverrides,
        defaults: &Defaults,
    ) -> Self {
        Self {
            provider: provider
                .map(str::to_string)
                .or_else(|| overrides.provider.clone())
                .unwrap_or_else(|| defaults.provider.clone()),
            model: model
                .map(str::to_string)
                .or_else(|| overrides.model.clone())
                .unwrap_or_else(|| defaults.model.clone()),
            max_chapters: max_chapters
                .or(overrides.max_chapters_per_run)
                .unwrap_or(defaults.max_chapters_per_run),
        }
    }
}

/// The template at `path`, or the bundled one.
pub async fn load_template(path: Option<&Path>) -> RedraftResult<PromptTemplate> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading prompt template");
            PromptTemplate::parse(&read_text(path).await?)
        }
        None => PromptTemplate::bundled(),
    }
}

async fn read_text(path: &Path) -> RedraftResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        let kind = if e.kind() == std::io::ErrorKind::NotFound {
            StorageErrorKind::NotFound(path.display().to_string())
        } else {
            StorageErrorKind::FileRead(format!("{}: {}", path.display(), e))
        };
        StorageError::new(kind).into()
    })
}

/// Drop what a previous project of the same name produced.
async fn remove_stale(layout: &ProjectLayout) -> RedraftResult<()> {
    for dir in [layout.extracted_dir(), layout.rewritten_dir()] {
        if dir.is_dir() {
            tokio::fs::remove_dir_all(&dir).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "remove {}: {}",
                    dir.display(),
                    e
                )))
            })?;
        }
    }
    let glossary = layout.glossary_file();
    if glossary.is_file() {
        tokio::fs::remove_file(&glossary).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "remove {}: {}",
                glossary.display(),
                e
            )))
        })?;
    }
    Ok(())
}
