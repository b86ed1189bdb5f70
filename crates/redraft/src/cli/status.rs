//! Status command handler.

use redraft::{Project, RedraftConfig, RedraftResult};

/// Print a project's progress.
pub async fn show_status(config: &RedraftConfig, name: &str) -> RedraftResult<()> {
    let project = Project::open(&config.defaults.projects_dir, name).await?;
    print!("{}", project.status().await?);
    Ok(())
}
