//! Glossary and rolling-summary context injected into every chapter prompt.

use crate::{ChapterStore, RequestExecutor};
use redraft_core::Glossary;
use redraft_error::{RedraftErrorKind, RedraftResult};
use redraft_interface::{ProjectRepository, RewriteProvider};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Glossary text used when no glossary exists or it is empty.
pub const NO_GLOSSARY: &str = "No glossary available.";
/// Rolling context for the first chapter.
pub const FIRST_CHAPTER: &str = "This is the first chapter.";
/// Rolling context when the previous chapter has no summary.
pub const NO_SUMMARY: &str = "No summary available for the previous chapter.";

/// Characters kept from each end of the book when sampling for the glossary.
const GLOSSARY_SAMPLE_CHARS: usize = 40_000;
const GLOSSARY_TEMPERATURE: f32 = 0.1;
const SUMMARY_TEMPERATURE: f32 = 0.3;

const GLOSSARY_PROMPT: &str = r#"Analyze the following text from a book. Your task is to identify and extract all significant proper nouns, including:
- Character names (full names and aliases)
- Place names (cities, countries, specific locations)
- Faction or organization names
- Unique in-world terms, concepts, or systems

Return your findings as a single JSON object. The keys are the categories ("characters", "locations", "organizations", "terms") and the values are arrays of the extracted strings. Do not add any text outside the JSON object.

Example format:
{
  "characters": ["Alex", "Master Elara"],
  "locations": ["The Crimson City", "Mount Cinder"],
  "organizations": ["The Silver Hand"],
  "terms": ["Aura Manifestation", "Rift Stones"]
}

TEXT TO ANALYZE:
---
"#;

const SUMMARY_PROMPT: &str = "Summarize the following book chapter in 2-4 sentences. Focus on the key events, character developments, and the state of things at the very end of the chapter. This summary will be used as context for rewriting the next chapter.

CHAPTER TEXT:
---
";

/// Rendered glossary, once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GlossaryCache {
    NotLoaded,
    Loaded(String),
}

/// Builds the glossary and rolling-context blocks for chapter prompts.
///
/// The glossary is read from the repository on first use and cached for
/// the builder's lifetime; building a new glossary refreshes the cache.
pub struct ContextChainBuilder<P: RewriteProvider, R: ProjectRepository> {
    executor: Arc<RequestExecutor<P>>,
    store: Arc<ChapterStore<R>>,
    glossary: GlossaryCache,
}

impl<P: RewriteProvider, R: ProjectRepository> ContextChainBuilder<P, R> {
    /// Create a builder with nothing cached.
    pub fn new(executor: Arc<RequestExecutor<P>>, store: Arc<ChapterStore<R>>) -> Self {
        Self {
            executor,
            store,
            glossary: GlossaryCache::NotLoaded,
        }
    }

    /// Whether a glossary, possibly empty, has been persisted.
    ///
    /// A glossary file that is not a category mapping counts as present;
    /// prompts then use [`NO_GLOSSARY`].
    pub async fn has_glossary(&self) -> RedraftResult<bool> {
        match self.store.repository().load_glossary().await {
            Ok(glossary) => Ok(glossary.is_some()),
            Err(e) if matches!(e.kind(), RedraftErrorKind::Json(_)) => {
                warn!(error = %e, "Glossary is unreadable, treating it as empty");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// The "must preserve" block, or [`NO_GLOSSARY`]. Never fails.
    pub async fn glossary_text(&mut self) -> String {
        if let GlossaryCache::Loaded(text) = &self.glossary {
            return text.clone();
        }

        let text = match self.store.repository().load_glossary().await {
            Ok(glossary) => glossary
                .and_then(|glossary| glossary.render())
                .unwrap_or_else(|| NO_GLOSSARY.to_string()),
            Err(e) => {
                warn!(error = %e, "Could not load glossary");
                NO_GLOSSARY.to_string()
            }
        };
        self.glossary = GlossaryCache::Loaded(text.clone());
        text
    }

    /// The previous chapter's summary verbatim, or a sentinel.
    ///
    /// Only reads; a missing summary is reported, not generated.
    pub async fn rolling_context(&self, chapter_index: usize) -> RedraftResult<String> {
        if chapter_index <= 1 {
            return Ok(FIRST_CHAPTER.to_string());
        }

        let previous = chapter_index - 1;
        match self.store.chapter(previous).await? {
            Some(chapter) if !chapter.summary().is_empty() => Ok(chapter.summary().clone()),
            Some(_) => {
                warn!(chapter = previous, "Previous chapter has no summary yet");
                Ok(NO_SUMMARY.to_string())
            }
            None => {
                warn!(chapter = chapter_index, "No previous chapter found");
                Ok(NO_SUMMARY.to_string())
            }
        }
    }

    /// Extract and persist the project glossary from the book's text.
    ///
    /// A failed request or an unparseable answer persists an empty
    /// glossary, so later runs do not try again.
    ///
    /// # Errors
    ///
    /// Only when the glossary cannot be saved.
    #[instrument(skip(self, all_text), fields(chars = all_text.len()))]
    pub async fn build_glossary(&mut self, all_text: &str) -> RedraftResult<Glossary> {
        let prompt = format!("{}{}\n---\n", GLOSSARY_PROMPT, sample_text(all_text));

        let glossary = match self
            .executor
            .rewrite_chapter(&prompt, GLOSSARY_TEMPERATURE)
            .await
        {
            Ok(response) => Glossary::from_response(&response).unwrap_or_else(|e| {
                error!(error = %e, "Glossary response was not a category mapping");
                Glossary::new()
            }),
            Err(e) => {
                error!(error = %e, "Glossary request failed");
                Glossary::new()
            }
        };

        self.store.repository().save_glossary(&glossary).await?;
        self.glossary = GlossaryCache::Loaded(
            glossary
                .render()
                .unwrap_or_else(|| NO_GLOSSARY.to_string()),
        );
        info!(empty = glossary.is_empty(), "Glossary built");
        Ok(glossary)
    }

    /// A 2–4 sentence summary of a chapter, or an empty string when the
    /// request fails.
    #[instrument(skip(self, chapter_text), fields(chars = chapter_text.len()))]
    pub async fn summarize(&self, chapter_text: &str) -> String {
        let prompt = format!("{}{}\n---\n\nSUMMARY:\n", SUMMARY_PROMPT, chapter_text);
        match self
            .executor
            .rewrite_chapter(&prompt, SUMMARY_TEMPERATURE)
            .await
        {
            Ok(summary) => {
                let summary = summary.trim().to_string();
                debug!(chars = summary.len(), "Generated chapter summary");
                summary
            }
            Err(e) => {
                warn!(error = %e, "Could not generate chapter summary");
                String::new()
            }
        }
    }
}

/// The whole text when short, otherwise its head and tail around `...`.
fn sample_text(all_text: &str) -> String {
    let total = all_text.chars().count();
    if total <= GLOSSARY_SAMPLE_CHARS * 2 {
        return all_text.to_string();
    }
    let head: String = all_text.chars().take(GLOSSARY_SAMPLE_CHARS).collect();
    let tail: String = all_text
        .chars()
        .skip(total - GLOSSARY_SAMPLE_CHARS)
        .collect();
    format!("{}...{}", head, tail)
}
