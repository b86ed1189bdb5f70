//! Trait interfaces for redraft.
//!
//! - [`RewriteProvider`] is the capability every text-generation backend implements
//! - [`ProjectRepository`] is the capability every project persistence backend implements

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod provider;
mod repository;

pub use provider::RewriteProvider;
pub use repository::ProjectRepository;
