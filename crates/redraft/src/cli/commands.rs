//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// redraft - rewrite an EPUB chapter by chapter with an LLM
#[derive(Parser, Debug)]
#[command(name = "redraft")]
#[command(about = "Rewrite an EPUB chapter by chapter with an LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Extra configuration file layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new rewriting project
    New {
        /// A unique name for the project
        #[arg(long)]
        name: String,

        /// Path to the source EPUB file
        #[arg(long)]
        epub: PathBuf,

        /// Path to a text file holding the style reference passage
        #[arg(long, alias = "style_ref")]
        style_ref: PathBuf,
    },

    /// Run the rewriting pipeline on a project
    Run {
        /// The name of the project to run
        #[arg(long)]
        name: String,

        /// Override the provider (gemini, aistudio, openai)
        #[arg(long)]
        provider: Option<String>,

        /// Override the model
        #[arg(long)]
        model: Option<String>,

        /// First chapter to consider (inclusive)
        #[arg(long, default_value = "1")]
        start: usize,

        /// Last chapter to consider (inclusive); 0 or unset means the end
        #[arg(long)]
        end: Option<usize>,

        /// Process at most this many chapters
        #[arg(long, alias = "max_chapters")]
        max_chapters: Option<usize>,

        /// Put failed chapters in range back in the queue first
        #[arg(long)]
        retry_failed: bool,
    },

    /// Package the rewritten text into a new EPUB file
    Package {
        /// The name of the project to package
        #[arg(long)]
        name: String,
    },

    /// Display the status and progress of a project
    Status {
        /// The name of the project to check
        #[arg(long)]
        name: String,
    },
}

impl Commands {
    /// The project every command acts on.
    pub fn project_name(&self) -> &str {
        match self {
            Commands::New { name, .. }
            | Commands::Run { name, .. }
            | Commands::Package { name }
            | Commands::Status { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "redraft",
            "--verbose",
            "run",
            "--name",
            "dune",
            "--provider",
            "openai",
            "--start",
            "3",
            "--max-chapters",
            "2",
            "--retry-failed",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                name,
                provider,
                model,
                start,
                end,
                max_chapters,
                retry_failed,
            } => {
                assert_eq!(name, "dune");
                assert_eq!(provider.as_deref(), Some("openai"));
                assert_eq!(model, None);
                assert_eq!(start, 3);
                assert_eq!(end, None);
                assert_eq!(max_chapters, Some(2));
                assert!(retry_failed);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_underscore_aliases() {
        let cli = Cli::parse_from([
            "redraft", "new", "--name", "dune", "--epub", "dune.epub", "--style_ref", "style.txt",
        ]);
        assert_eq!(cli.command.project_name(), "dune");
    }
}
