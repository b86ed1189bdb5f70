//! EPUB collaborators for redraft.
//!
//! - [`extract_chapters`] unpacks a source archive and reads its chapters in spine order
//! - [`package_epub`] writes a new archive with rewritten chapter bodies swapped in
//! - [`html_to_text`] and [`text_to_xhtml_body`] convert between chapter markup and plain text

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extract;
mod markup;
mod package;

pub use extract::extract_chapters;
pub use markup::{chapter_title, html_to_text, text_to_xhtml_body};
pub use package::{ChapterOutput, package_epub};
