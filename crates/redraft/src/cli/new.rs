//! Project creation command handler.

use redraft::{Project, RedraftConfig, RedraftResult};
use std::path::Path;

/// Create a project from an EPUB and a style reference file.
pub async fn new_project(
    config: &RedraftConfig,
    name: &str,
    epub: &Path,
    style_ref: &Path,
) -> RedraftResult<()> {
    println!("Creating new project '{}'...", name);
    let (project, state) = Project::create(&config.defaults.projects_dir, name, epub, style_ref).await?;

    println!(
        "Project created at {} with {} chapters.",
        project.layout().root().display(),
        state.total_chapters()
    );
    println!("Run 'redraft run --name \"{}\"' to start processing.", name);
    Ok(())
}
