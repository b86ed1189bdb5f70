//! Packaging command handler.

use redraft::{Project, RedraftConfig, RedraftResult};

/// Write the final EPUB for a project.
pub async fn package_project(config: &RedraftConfig, name: &str) -> RedraftResult<()> {
    let project = Project::open(&config.defaults.projects_dir, name).await?;

    println!("Packaging final EPUB for project '{}'...", name);
    let packaged = project.package(&config.defaults.output_suffix).await?;

    println!(
        "Final EPUB created at {} ({} of {} completed chapters replaced).",
        packaged.path().display(),
        packaged.chapters_replaced(),
        packaged.chapters_completed()
    );
    Ok(())
}
