//! Sequential, resumable rewrite runs over a project's chapters.

use crate::{ChapterStore, ContextChainBuilder, DEFAULT_TEMPERATURE, RequestExecutor};
use derive_builder::Builder;
use derive_getters::Getters;
use redraft_core::{ChapterUpdate, IndexedChapter, PromptContext, PromptTemplate};
use redraft_error::RedraftResult;
use redraft_interface::{ProjectRepository, RewriteProvider};
use std::sync::Arc;
use tracing::{Instrument, Span, error, info, info_span, warn};

/// Which chapters a run covers.
///
/// # Examples
///
/// ```
/// use redraft_pipeline::RunOptions;
///
/// let options = RunOptions::builder().start(5usize).end(8usize).build().unwrap();
/// assert_eq!(*options.start(), 5);
/// assert_eq!(*options.max_chapters(), 0);
/// assert!(!options.retry_failed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Getters)]
#[builder(setter(into))]
pub struct RunOptions {
    /// First chapter index considered
    #[builder(default = "1")]
    start: usize,
    /// Last chapter index considered, unbounded when `None`
    #[builder(default)]
    end: Option<usize>,
    /// Chapters processed at most, 0 = unlimited
    #[builder(default)]
    max_chapters: usize,
    /// Put failed chapters in range back to pending first
    #[builder(default)]
    retry_failed: bool,
}

impl RunOptions {
    /// Creates a new builder for `RunOptions`.
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::default()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            start: 1,
            end: None,
            max_chapters: 0,
            retry_failed: false,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct RunReport {
    /// Chapters completed, in processing order
    completed: Vec<usize>,
    /// `(index, error)` for chapters that failed
    failed: Vec<(usize, String)>,
    /// Chapter whose missing summary was generated and saved before the loop
    backfilled: Option<usize>,
    /// Failed chapters put back to pending
    requeued: Vec<usize>,
    /// Whether the glossary was built during this run
    glossary_built: bool,
}

/// Drives a run: glossary, summary backfill, then each pending chapter in
/// order, one request at a time.
///
/// A chapter whose rewrite fails is recorded as failed and the run moves
/// on. Failing to read or write project state ends the run with an error.
pub struct PipelineOrchestrator<P: RewriteProvider, R: ProjectRepository> {
    executor: Arc<RequestExecutor<P>>,
    store: Arc<ChapterStore<R>>,
    context: ContextChainBuilder<P, R>,
    template: PromptTemplate,
    style_reference: String,
    span: Span,
}

impl<P: RewriteProvider, R: ProjectRepository> PipelineOrchestrator<P, R> {
    /// Create an orchestrator for one project.
    ///
    /// All logging from its runs happens inside a span carrying the
    /// project, provider and model.
    pub fn new(
        project_name: &str,
        executor: RequestExecutor<P>,
        repository: R,
        template: PromptTemplate,
        style_reference: impl Into<String>,
    ) -> Self {
        let span = info_span!(
            "project",
            project = %project_name,
            provider = executor.provider().provider_name(),
            model = %executor.provider().model_name()
        );
        let executor = Arc::new(executor);
        let store = Arc::new(ChapterStore::new(repository));
        let context = ContextChainBuilder::new(executor.clone(), store.clone());
        Self {
            executor,
            store,
            context,
            template,
            style_reference: style_reference.into(),
            span,
        }
    }

    /// The chapter store.
    pub fn store(&self) -> &ChapterStore<R> {
        &self.store
    }

    /// The request executor.
    pub fn executor(&self) -> &RequestExecutor<P> {
        &self.executor
    }

    /// Run the pipeline over the chapters selected by `options`.
    ///
    /// # Errors
    ///
    /// Only state persistence failures; provider failures are recorded on
    /// their chapters.
    pub async fn run(&mut self, options: &RunOptions) -> RedraftResult<RunReport> {
        let span = self.span.clone();
        self.run_in_span(options).instrument(span).await
    }

    async fn run_in_span(&mut self, options: &RunOptions) -> RedraftResult<RunReport> {
        let start = options.start.max(1);
        let mut report = RunReport::default();
        info!(start, end = ?options.end, max_chapters = options.max_chapters, "Starting run");

        self.store.repository().reset_prompt_log().await?;

        if options.retry_failed {
            report.requeued = self.store.requeue_failed(start, options.end).await?;
        }

        if !self.context.has_glossary().await? {
            info!("No glossary yet, building one from the full text");
            let all_text = self.store.state().await?.all_original_text();
            self.context.build_glossary(&all_text).await?;
            report.glossary_built = true;
        }

        report.backfilled = self.backfill_summary(start).await?;

        let pending = self
            .store
            .get_pending(options.max_chapters, start, options.end)
            .await?;
        if pending.is_empty() {
            info!("No pending chapters in range");
        }

        let total = pending.len();
        for (position, chapter) in pending.iter().enumerate() {
            let index = *chapter.index();
            info!(
                chapter = index,
                title = %chapter.chapter().title(),
                "Processing chapter {} ({} of {})",
                index,
                position + 1,
                total
            );
            match self.process_chapter(chapter).await? {
                Ok(()) => report.completed.push(index),
                Err(message) => report.failed.push((index, message)),
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "Run finished"
        );
        Ok(report)
    }

    /// Generate the summary of the chapter before `start` if it is missing,
    /// returning that chapter's index when a summary was saved.
    async fn backfill_summary(&self, start: usize) -> RedraftResult<Option<usize>> {
        let previous = start - 1;
        if previous == 0 {
            return Ok(None);
        }
        let Some(chapter) = self.store.chapter(previous).await? else {
            return Ok(None);
        };
        if !chapter.summary().is_empty() {
            return Ok(None);
        }

        info!(chapter = previous, "Generating missing summary for previous chapter");
        let text = self.store.latest_text(&chapter).await?;
        let summary = self.context.summarize(&text).await;
        if summary.is_empty() {
            warn!(chapter = previous, "Backfill produced no summary");
            return Ok(None);
        }
        self.store
            .update(
                previous,
                ChapterUpdate::summary_only(*chapter.status(), summary),
            )
            .await?;
        Ok(Some(previous))
    }

    /// Rewrite one chapter and record the outcome.
    ///
    /// The outer result carries persistence failures; the inner one the
    /// chapter's own failure message.
    async fn process_chapter(
        &mut self,
        chapter: &IndexedChapter,
    ) -> RedraftResult<Result<(), String>> {
        let index = *chapter.index();
        let glossary = self.context.glossary_text().await;
        let rolling_context = self.context.rolling_context(index).await?;
        let prompt = self.template.render(&PromptContext::new(
            self.style_reference.as_str(),
            glossary,
            rolling_context,
            chapter.chapter().original_text().as_str(),
        ));

        let prompt_tokens = self.executor.estimate_tokens(&prompt).await;
        if let Err(e) = self
            .store
            .repository()
            .append_prompt_log(index, prompt_tokens, &prompt)
            .await
        {
            warn!(chapter = index, error = %e, "Could not append to prompt log");
        }

        match self
            .executor
            .submit(&prompt, DEFAULT_TEMPERATURE, prompt_tokens)
            .await
        {
            Ok(text) => {
                let summary = self.context.summarize(&text).await;
                self.store
                    .update(index, ChapterUpdate::completed(text, summary))
                    .await?;
                info!(chapter = index, "Chapter completed");
                Ok(Ok(()))
            }
            Err(e) => {
                let message = e.kind.to_string();
                error!(chapter = index, error = %message, "Chapter failed");
                self.store
                    .update(index, ChapterUpdate::failed(message.clone()))
                    .await?;
                Ok(Err(message))
            }
        }
    }
}
