//! The rewrite pipeline.
//!
//! - [`RequestExecutor`] sends prompts through the shared rate limiter and retries failures
//! - [`ContextChainBuilder`] supplies the glossary and previous-chapter summary for each prompt
//! - [`ChapterStore`] owns the durable per-chapter state machine
//! - [`PipelineOrchestrator`] runs pending chapters in order, one at a time
//!
//! # Example
//!
//! ```rust,ignore
//! use redraft_pipeline::{PipelineOrchestrator, RequestExecutor, RunOptions};
//!
//! let executor = RequestExecutor::from_limits(provider, &limits);
//! let mut orchestrator =
//!     PipelineOrchestrator::new("dune", executor, repository, template, style_reference);
//! let report = orchestrator.run(&RunOptions::default()).await?;
//! println!("{} chapters completed", report.completed().len());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod executor;
mod in_memory_repository;
mod orchestrator;
mod store;

pub use context::{ContextChainBuilder, FIRST_CHAPTER, NO_GLOSSARY, NO_SUMMARY};
pub use executor::{DEFAULT_TEMPERATURE, RequestExecutor};
pub use in_memory_repository::InMemoryRepository;
pub use orchestrator::{PipelineOrchestrator, RunOptions, RunOptionsBuilder, RunReport};
pub use store::ChapterStore;
