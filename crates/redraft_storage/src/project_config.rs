//! Per-project settings stored in `project_config.json`.

use crate::filesystem::{read_json, write_json};
use derive_getters::Getters;
use redraft_error::{RedraftResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Values a project may pin instead of the global defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOverrides {
    /// Provider name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Chapters per run, 0 = unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chapters_per_run: Option<usize>,
}

/// Settings fixed when a project is created.
///
/// ```json
/// {
///   "projectName": "dune",
///   "sourceEpub": "dune.epub",
///   "styleReferenceText": "...",
///   "overrides": { "model": "gemini-1.5-pro" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Project name
    project_name: String,
    /// File name of the source archive inside the source directory
    source_epub: String,
    /// Passage whose voice every rewrite should match
    style_reference_text: String,
    /// Project-level overrides of the global defaults
    #[serde(default)]
    overrides: ProjectOverrides,
}

impl ProjectConfig {
    /// Configuration for a new project with no overrides.
    pub fn new(
        project_name: impl Into<String>,
        source_epub: impl Into<String>,
        style_reference_text: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            source_epub: source_epub.into(),
            style_reference_text: style_reference_text.into(),
            overrides: ProjectOverrides::default(),
        }
    }

    /// Replace the overrides.
    pub fn with_overrides(mut self, overrides: ProjectOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load from a `project_config.json` file.
    #[tracing::instrument(fields(path = %path.display()))]
    pub async fn load(path: &Path) -> RedraftResult<Self> {
        let config = read_json(path).await?.ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
        })?;
        Ok(config)
    }

    /// Write to a `project_config.json` file.
    #[tracing::instrument(skip(self), fields(path = %path.display(), project = %self.project_name))]
    pub async fn save(&self, path: &Path) -> RedraftResult<()> {
        write_json(path, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keys_are_camel_case() {
        let config = ProjectConfig::new("dune", "dune.epub", "Spice.");
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["projectName"], "dune");
        assert_eq!(value["sourceEpub"], "dune.epub");
        assert_eq!(value["styleReferenceText"], "Spice.");
        assert_eq!(value["overrides"], serde_json::json!({}));
    }

    #[test]
    fn test_overrides_keep_snake_case_keys() {
        let json = r#"{
            "projectName": "dune",
            "sourceEpub": "dune.epub",
            "styleReferenceText": "",
            "overrides": {"provider": "openai", "max_chapters_per_run": 2}
        }"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.overrides().provider.as_deref(), Some("openai"));
        assert_eq!(config.overrides().max_chapters_per_run, Some(2));
        assert_eq!(config.overrides().model, None);
    }

    #[test]
    fn test_missing_overrides_default() {
        let json = r#"{"projectName": "a", "sourceEpub": "a.epub", "styleReferenceText": "s"}"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.overrides(), &ProjectOverrides::default());
    }
}
