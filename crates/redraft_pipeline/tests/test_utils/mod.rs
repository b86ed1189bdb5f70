//! Test utilities for pipeline tests.
//!
//! This module provides a scripted provider and helpers for building
//! small books whose chapters can be recognised in prompts.

#![allow(dead_code)]

pub mod mock_provider;

pub use mock_provider::{CallKind, MockBehavior, MockProvider, book_responder, marker};

use redraft_core::{ChapterUpdate, ProjectState, PromptTemplate, SourceChapter};
use redraft_pipeline::{InMemoryRepository, RequestExecutor};
use redraft_rate_limit::{RateLimiter, RetryPolicy};
use std::time::Duration;

/// Template that makes each prompt section easy to find.
pub fn test_template() -> PromptTemplate {
    PromptTemplate::parse(
        "STYLE: {style_reference}\nGLOSSARY: {context_glossary}\nPREVIOUS: {rolling_context}\nCHAPTER: {chapter_text}",
    )
    .expect("Test template parses")
}

/// A project of `n` chapters whose original texts are `ORIGINAL-<index>`.
pub fn book(n: usize) -> ProjectState {
    let sources = (1..=n)
        .map(|i| {
            SourceChapter::new(
                format!("OEBPS/ch{i}.xhtml"),
                format!("Chapter {i}"),
                format!("ORIGINAL-{i}"),
            )
        })
        .collect();
    ProjectState::new("test-book", sources)
}

/// Mark chapters completed with `REWRITTEN-<index>` text and the given summary.
pub fn complete(state: &mut ProjectState, indices: &[usize], summary: &str) {
    for index in indices {
        state
            .apply(
                *index,
                &ChapterUpdate::completed(format!("REWRITTEN-{index}"), summary),
            )
            .expect("Pending chapter completes");
    }
}

/// Unlimited limiter, `retry_attempts` retries one second apart (doubling).
pub fn executor(provider: MockProvider, retry_attempts: u32) -> RequestExecutor<MockProvider> {
    RequestExecutor::new(
        provider,
        RateLimiter::new(0, 0),
        RetryPolicy::new(retry_attempts, Duration::from_secs(1)),
    )
}

/// Repository holding `state`.
pub fn repository(state: ProjectState) -> InMemoryRepository {
    InMemoryRepository::with_state(state)
}
