//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the redraft binary.

mod commands;
mod new;
mod package;
mod run;
mod status;

pub use commands::{Cli, Commands};
pub use new::new_project;
pub use package::package_project;
pub use run::{RunArgs, run_project};
pub use status::show_status;
