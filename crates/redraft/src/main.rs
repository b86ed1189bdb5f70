//! redraft CLI binary.
//!
//! - `new` creates a project from an EPUB and a style reference
//! - `run` rewrites pending chapters
//! - `package` writes the final EPUB
//! - `status` shows progress

use clap::Parser;
use redraft::{LoggingConfig, ProjectLayout, RedraftConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, RunArgs, new_project, package_project, run_project, show_status};

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = RedraftConfig::load_with(cli.config.as_deref())?;

    // Project commands also log to the project's rewriter.log
    let layout = ProjectLayout::new(&config.defaults.projects_dir, cli.command.project_name());
    let log_file = match &cli.command {
        Commands::New { .. } => Some(layout.log_file()),
        _ if layout.exists() => Some(layout.log_file()),
        _ => None,
    };
    init_logging(
        &LoggingConfig::new()
            .with_verbose(cli.verbose)
            .with_json_logs(cli.json_logs)
            .with_log_file(log_file),
    )?;

    // Execute the requested command
    let result = match cli.command {
        Commands::New {
            name,
            epub,
            style_ref,
        } => new_project(&config, &name, &epub, &style_ref).await,

        Commands::Run {
            name,
            provider,
            model,
            start,
            end,
            max_chapters,
            retry_failed,
        } => {
            let args = RunArgs {
                name,
                provider,
                model,
                start,
                end,
                max_chapters,
                retry_failed,
            };
            run_project(&config, &args).await
        }

        Commands::Package { name } => package_project(&config, &name).await,

        Commands::Status { name } => show_status(&config, &name).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result?;
    Ok(())
}
