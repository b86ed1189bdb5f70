//! Layered TOML configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (include_str! from redraft.toml)
//! - `~/.config/redraft/redraft.toml`
//! - `./redraft.toml`
//! - An explicit path given on the command line

use crate::RetryPolicy;
use config::{Config, File, FileFormat};
use redraft_error::{ConfigError, RedraftResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_CONFIG: &str = include_str!("../../../redraft.toml");

/// Marker left in example configuration files in place of a real key.
const PLACEHOLDER_KEY: &str = "PASTE_YOUR";

/// Limits and credentials for one provider.
///
/// ```toml
/// [providers.gemini]
/// rpm = 13
/// tpm = 800_000
/// retry_attempts = 3
/// retry_delay = 20.0
/// api_key_env = "GOOGLE_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderLimits {
    /// Requests per minute (0 disables the interval gate)
    #[serde(default = "default_rpm")]
    pub rpm: u32,

    /// Tokens per minute, the bucket capacity (0 disables the bucket)
    #[serde(default = "default_tpm")]
    pub tpm: u64,

    /// Requests per day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpd: Option<u32>,

    /// Concurrent request permits
    #[serde(default = "default_concurrent_calls")]
    pub concurrent_calls: u32,

    /// Attempts after the first one
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base back-off delay in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,

    /// Inline API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Endpoint override, mostly for proxies and tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_rpm() -> u32 {
    13
}

fn default_tpm() -> u64 {
    800_000
}

fn default_concurrent_calls() -> u32 {
    1
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> f64 {
    20.0
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            rpm: default_rpm(),
            tpm: default_tpm(),
            rpd: None,
            concurrent_calls: default_concurrent_calls(),
            retry_attempts: default_retry_attempts(),
            retry_delay: default_retry_delay(),
            api_key: None,
            api_key_env: None,
            base_url: None,
        }
    }
}

impl ProviderLimits {
    /// Retry schedule described by these limits.
    ///
    /// Negative or non-finite delays are treated as zero.
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = if self.retry_delay.is_finite() && self.retry_delay > 0.0 {
            Duration::from_secs_f64(self.retry_delay)
        } else {
            Duration::ZERO
        };
        RetryPolicy::new(self.retry_attempts, delay)
    }

    /// Resolve the API key: the inline key first, then the environment variable.
    ///
    /// Keys still holding the `PASTE_YOUR...` placeholder count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        let usable = |key: &str| {
            let key = key.trim();
            (!key.is_empty() && !key.contains(PLACEHOLDER_KEY)).then(|| key.to_string())
        };

        if let Some(key) = self.api_key.as_deref().and_then(usable) {
            return Some(key);
        }
        let var = self.api_key_env.as_deref()?;
        std::env::var(var).ok().as_deref().and_then(usable)
    }
}

/// The `[defaults]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Provider used when neither the CLI nor the project names one
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model used when neither the CLI nor the project names one
    #[serde(default = "default_model")]
    pub model: String,

    /// Chapters per run, 0 = unlimited
    #[serde(default)]
    pub max_chapters_per_run: usize,

    /// Prompt template path; the bundled template is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<PathBuf>,

    /// Appended to the source file stem when packaging
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Directory holding one sub-directory per project
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_output_suffix() -> String {
    "_rewritten".to_string()
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from("projects")
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            max_chapters_per_run: 0,
            prompt_template: None,
            output_suffix: default_output_suffix(),
            projects_dir: default_projects_dir(),
        }
    }
}

/// Complete redraft configuration.
///
/// # Example
///
/// ```no_run
/// use redraft_rate_limit::RedraftConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RedraftConfig::load()?;
/// let limits = config.provider_limits("gemini");
/// println!("{} requests per minute", limits.rpm);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RedraftConfig {
    /// Global defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Per-provider limits keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderLimits>,
}

impl RedraftConfig {
    /// Load configuration from a single TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> RedraftResult<Self> {
        debug!("Loading configuration file");
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        Ok(config
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Invalid configuration: {}", e)))?)
    }

    /// Load the bundled defaults merged with the user's configuration files.
    pub fn load() -> RedraftResult<Self> {
        Self::load_with(None)
    }

    /// Like [`RedraftConfig::load`], with one more file layered on top.
    ///
    /// # Errors
    ///
    /// An explicit path that does not exist is an error; the implicit
    /// user files are optional.
    #[instrument(skip(extra))]
    pub fn load_with(extra: Option<&Path>) -> RedraftResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let home_config = config_dir.join("redraft").join("redraft.toml");
            debug!(path = %home_config.display(), "Checking user configuration");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("redraft").required(false));

        if let Some(path) = extra {
            debug!(path = %path.display(), "Layering explicit configuration");
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?;

        Ok(config
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Invalid configuration: {}", e)))?)
    }

    /// Limits for a provider, falling back to built-in defaults for names
    /// that have no table.
    pub fn provider_limits(&self, provider: &str) -> ProviderLimits {
        match self.providers.get(provider) {
            Some(limits) => limits.clone(),
            None => {
                warn!(provider, "No limits configured for provider, using defaults");
                ProviderLimits::default()
            }
        }
    }
}
