//! On-disk layout and persistence for redraft projects.
//!
//! Every project lives in its own directory:
//!
//! ```text
//! projects/<name>/
//! ├── 0_source/               copy of the source EPUB
//! ├── 1_extracted/            unpacked archive
//! ├── 2_rewritten_txt/        chapter_001.txt, chapter_002.txt, ...
//! ├── 3_final_epub/           packaged output
//! ├── project_config.json
//! ├── project_state.json
//! ├── context_glossary.json
//! ├── rewriter.log
//! └── prompt_log.txt
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod layout;
mod project_config;

pub use filesystem::FileSystemRepository;
pub use layout::ProjectLayout;
pub use project_config::{ProjectConfig, ProjectOverrides};
