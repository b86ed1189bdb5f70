//! redraft - rewrite EPUB books chapter by chapter with an LLM.
//!
//! A project copies a source EPUB, extracts its chapters and tracks each
//! one through `pending → completed | failed`. Runs send chapters one at a
//! time to a text generation provider, paced by a shared rate limiter and
//! retried with exponential backoff, and carry a glossary of proper nouns
//! plus the previous chapter's summary into every prompt. Finished chapters
//! are packaged back into a new EPUB.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use redraft::{
//!     PipelineOrchestrator, Project, ProviderKind, RedraftConfig, RequestExecutor,
//!     RunOptions, build_provider, load_template,
//! };
//! use std::path::Path;
//!
//! let config = RedraftConfig::load()?;
//! let project = Project::open(&config.defaults.projects_dir, "dune").await?;
//! let limits = config.provider_limits("gemini");
//! let provider = build_provider(ProviderKind::Gemini, "gemini-2.0-flash", &limits)?;
//! let mut orchestrator = PipelineOrchestrator::new(
//!     "dune",
//!     RequestExecutor::from_limits(provider, &limits),
//!     project.repository(),
//!     load_template(None).await?,
//!     project.config().style_reference_text().clone(),
//! );
//! let report = orchestrator.run(&RunOptions::default()).await?;
//! ```
//!
//! # Architecture
//!
//! - `redraft_error` - Error types
//! - `redraft_core` - Chapter records, project state, glossary, prompt template
//! - `redraft_interface` - `RewriteProvider` and `ProjectRepository` traits
//! - `redraft_rate_limit` - Rate limiter, retry policy, configuration
//! - `redraft_models` - Gemini, AI Studio and OpenAI providers
//! - `redraft_storage` - Project directory layout and file persistence
//! - `redraft_epub` - Chapter extraction and EPUB packaging
//! - `redraft_pipeline` - Executor, context chain, chapter store, orchestrator
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observability;
mod project;

pub use observability::{LoggingConfig, init_logging};
pub use project::{PackagedEpub, Project, RunSettings, load_template};

pub use redraft_core::*;
pub use redraft_error::*;
pub use redraft_interface::*;

pub use redraft_epub::{ChapterOutput, extract_chapters, package_epub, text_to_xhtml_body};
pub use redraft_models::{GeminiProvider, OpenAIProvider, ProviderKind, build_provider};
pub use redraft_pipeline::{
    ChapterStore, ContextChainBuilder, InMemoryRepository, PipelineOrchestrator, RequestExecutor,
    RunOptions, RunOptionsBuilder, RunReport,
};
pub use redraft_rate_limit::{Defaults, ProviderLimits, RateLimiter, RedraftConfig, RetryPolicy};
pub use redraft_storage::{FileSystemRepository, ProjectConfig, ProjectLayout, ProjectOverrides};
