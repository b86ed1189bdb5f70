//! Pipeline run command handler.

use redraft::{
    ConfigError, PipelineOrchestrator, Project, ProviderKind, RedraftConfig, RedraftResult,
    RequestExecutor, RunOptions, RunSettings, build_provider, load_template,
};
use tracing::info;

/// Command-line values for one run.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Project name
    pub name: String,
    /// Provider override
    pub provider: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// First chapter considered
    pub start: usize,
    /// Last chapter considered, 0 = to the end
    pub end: Option<usize>,
    /// Chapter limit override
    pub max_chapters: Option<usize>,
    /// Requeue failed chapters first
    pub retry_failed: bool,
}

/// Rewrite the pending chapters of a project.
///
/// The provider is resolved and its key checked before any chapter is
/// touched.
pub async fn run_project(config: &RedraftConfig, args: &RunArgs) -> RedraftResult<()> {
    let project = Project::open(&config.defaults.projects_dir, &args.name).await?;
    let settings = RunSettings::resolve(
        args.provider.as_deref(),
        args.model.as_deref(),
        args.max_chapters,
        project.config().overrides(),
        &config.defaults,
    );

    let kind = ProviderKind::parse(settings.provider())?;
    let limits = config.provider_limits(kind.as_ref());
    info!(
        provider = %kind,
        model = %settings.model(),
        rpm = limits.rpm,
        tpm = limits.tpm,
        "Using provider"
    );
    let provider = build_provider(kind, settings.model(), &limits)?;
    let executor = RequestExecutor::from_limits(provider, &limits);
    let template = load_template(config.defaults.prompt_template.as_deref()).await?;

    let options = RunOptions::builder()
        .start(args.start)
        .end(args.end.filter(|end| *end > 0))
        .max_chapters(*settings.max_chapters())
        .retry_failed(args.retry_failed)
        .build()
        .map_err(|e| ConfigError::new(format!("Invalid run options: {}", e)))?;

    println!("Running project '{}'...", args.name);
    let mut orchestrator = PipelineOrchestrator::new(
        &args.name,
        executor,
        project.repository(),
        template,
        project.config().style_reference_text().as_str(),
    );
    let report = orchestrator.run(&options).await?;

    if !report.requeued().is_empty() {
        println!("Requeued failed chapters: {:?}", report.requeued());
    }
    if let Some(index) = report.backfilled() {
        println!("Generated missing summary for chapter {}.", index);
    }
    println!(
        "Run complete: {} chapter(s) rewritten, {} failed.",
        report.completed().len(),
        report.failed().len()
    );
    for (index, error) in report.failed() {
        println!("  - Chapter {}: {}", index, error);
    }
    println!(
        "Package the book with 'redraft package --name \"{}\"'.",
        args.name
    );
    Ok(())
}
