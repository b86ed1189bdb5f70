//! Repackaging an extracted archive with rewritten chapter bodies.

use crate::markup::text_to_xhtml_body;
use derive_getters::Getters;
use redraft_error::{EpubError, EpubErrorKind, RedraftResult};
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

const MIMETYPE: &str = "mimetype";

static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<body\b[^>]*>).*(</body>)").expect("Valid body regex"));

/// Rewritten text for one completed chapter.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ChapterOutput {
    /// Archive path of the chapter document
    id: String,
    /// Rewritten plain text
    rewritten_text: String,
}

impl ChapterOutput {
    /// Pair a chapter document with its rewritten text.
    pub fn new(id: impl Into<String>, rewritten_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rewritten_text: rewritten_text.into(),
        }
    }
}

/// Write `output_path` from the files under `extracted_dir`, replacing the
/// body of each chapter in `chapters` with its rewritten text.
///
/// `mimetype` is written first and stored uncompressed; every other file
/// is deflated. A chapter whose document is missing is skipped with a
/// warning: it is looked up by archive path first, then by file stem.
/// Returns the number of chapters replaced.
///
/// # Errors
///
/// Fails when the extracted tree cannot be read or the output cannot be
/// written.
#[instrument(skip(chapters), fields(extracted_dir = %extracted_dir.display(), output = %output_path.display(), chapters = chapters.len()))]
pub fn package_epub(
    extracted_dir: &Path,
    chapters: &[ChapterOutput],
    output_path: &Path,
) -> RedraftResult<usize> {
    let files = archive_files(extracted_dir)?;
    let replacements = match_chapters(&files, chapters);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    let file = File::create(output_path).map_err(|e| write_error(output_path, e))?;
    let mut writer = zip::ZipWriter::new(file);

    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

    if let Some((_, path)) = files.iter().find(|(name, _)| name == MIMETYPE) {
        let bytes = read_file(path)?;
        writer
            .start_file(MIMETYPE, stored)
            .map_err(|e| write_error(output_path, e))?;
        writer
            .write_all(&bytes)
            .map_err(|e| write_error(output_path, e))?;
    } else {
        warn!("Extracted tree has no mimetype file");
    }

    let mut replaced = 0;
    for (name, path) in files.iter().filter(|(name, _)| name != MIMETYPE) {
        let mut bytes = read_file(path)?;
        if let Some(chapter) = replacements.get(name) {
            let html = String::from_utf8_lossy(&bytes);
            match replace_body(&html, &text_to_xhtml_body(chapter.rewritten_text())) {
                Some(updated) => {
                    bytes = updated.into_bytes();
                    replaced += 1;
                    debug!(document = %name, "Replaced chapter body");
                }
                None => warn!(document = %name, "Chapter document has no body, left unchanged"),
            }
        }
        writer
            .start_file(name.as_str(), deflated)
            .map_err(|e| write_error(output_path, e))?;
        writer
            .write_all(&bytes)
            .map_err(|e| write_error(output_path, e))?;
    }

    writer.finish().map_err(|e| write_error(output_path, e))?;
    info!(replaced, files = files.len(), "Packaged archive");
    Ok(replaced)
}

/// `(archive name, filesystem path)` for every file, sorted by name.
fn archive_files(extracted_dir: &Path) -> RedraftResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(extracted_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            EpubError::new(EpubErrorKind::Archive(format!(
                "{}: {}",
                extracted_dir.display(),
                e
            )))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(extracted_dir)
            .unwrap_or(entry.path())
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.into_path()));
    }
    Ok(files)
}

fn match_chapters<'a>(
    files: &[(String, PathBuf)],
    chapters: &'a [ChapterOutput],
) -> HashMap<String, &'a ChapterOutput> {
    let mut replacements = HashMap::new();
    for chapter in chapters {
        let by_path = files.iter().find(|(name, _)| name == chapter.id());
        let by_stem = || {
            let stem = file_stem(chapter.id());
            files.iter().find(|(name, _)| file_stem(name) == stem)
        };
        match by_path.or_else(by_stem) {
            Some((name, _)) => {
                replacements.insert(name.clone(), chapter);
            }
            None => warn!(id = %chapter.id(), "Chapter document not found in archive, skipping"),
        }
    }
    replacements
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base)
}

fn replace_body(html: &str, body: &str) -> Option<String> {
    let captures = BODY.captures(html)?;
    let open = captures.get(1)?;
    let close = captures.get(2)?;
    Some(format!(
        "{}\n{}\n{}",
        &html[..open.end()],
        body,
        &html[close.start()..]
    ))
}

fn read_file(path: &Path) -> RedraftResult<Vec<u8>> {
    Ok(std::fs::read(path).map_err(|e| {
        EpubError::new(EpubErrorKind::Archive(format!("{}: {}", path.display(), e)))
    })?)
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> EpubError {
    EpubError::new(EpubErrorKind::Write(format!("{}: {}", path.display(), e)))
}
