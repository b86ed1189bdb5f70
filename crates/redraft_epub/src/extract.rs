//! Chapter extraction from a source archive.

use crate::markup::{chapter_title, html_to_text};
use redraft_core::SourceChapter;
use redraft_error::{EpubError, EpubErrorKind, RedraftResult};
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

static ROOTFILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<rootfile\b[^>]*\bfull-path\s*=\s*["']([^"']+)["']"#)
        .expect("Valid rootfile regex")
});
static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:\w+:)?item\b[^>]*>").expect("Valid item regex"));
static ITEMREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?:\w+:)?itemref\b[^>]*\bidref\s*=\s*["']([^"']+)["']"#)
        .expect("Valid itemref regex")
});
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid\s*=\s*["']([^"']+)["']"#).expect("Valid id regex"));
static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhref\s*=\s*["']([^"']+)["']"#).expect("Valid href regex"));
static MEDIA_TYPE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bmedia-type\s*=\s*["']([^"']+)["']"#).expect("Valid media-type regex")
});

/// Unpack `epub` into `extracted_dir` and read its chapters.
///
/// Chapters follow the package spine. Each chapter's id is the archive
/// path of its document, its title the first `h1`–`h3` heading (or
/// `Chapter N` for spine position N) and its text the document's plain
/// text. If the spine cannot be read or yields nothing, every `.xhtml`
/// file with `chapter` in its name is used instead, in path order.
///
/// # Errors
///
/// Fails when the archive cannot be unpacked, or when neither the spine
/// nor the file scan finds a chapter.
#[instrument(fields(epub = %epub.display(), extracted_dir = %extracted_dir.display()))]
pub fn extract_chapters(epub: &Path, extracted_dir: &Path) -> RedraftResult<Vec<SourceChapter>> {
    unpack(epub, extracted_dir)?;

    let chapters = match spine_chapters(extracted_dir) {
        Ok(chapters) if !chapters.is_empty() => {
            info!(count = chapters.len(), "Extracted chapters in spine order");
            return Ok(chapters);
        }
        Ok(_) => {
            warn!("Spine yielded no chapters, scanning extracted files");
            scan_chapters(extracted_dir)
        }
        Err(e) => {
            warn!(error = %e, "Could not read spine, scanning extracted files");
            scan_chapters(extracted_dir)
        }
    };

    if chapters.is_empty() {
        return Err(EpubError::new(EpubErrorKind::NoChapters(epub.display().to_string())).into());
    }
    info!(count = chapters.len(), "Extracted chapters by file scan");
    Ok(chapters)
}

fn unpack(epub: &Path, extracted_dir: &Path) -> RedraftResult<()> {
    let archive_error =
        |e: &dyn std::fmt::Display| EpubError::new(EpubErrorKind::Archive(format!("{}: {}", epub.display(), e)));

    let file = File::open(epub).map_err(|e| archive_error(&e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_error(&e))?;
    archive.extract(extracted_dir).map_err(|e| archive_error(&e))?;
    debug!(entries = archive.len(), "Unpacked archive");
    Ok(())
}

fn read_document(path: &Path) -> RedraftResult<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        EpubError::new(EpubErrorKind::Archive(format!("{}: {}", path.display(), e)))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Archive path of the package document named by `META-INF/container.xml`.
fn package_path(extracted_dir: &Path) -> RedraftResult<String> {
    let container_path = extracted_dir.join("META-INF").join("container.xml");
    let container = read_document(&container_path)
        .map_err(|e| EpubError::new(EpubErrorKind::Container(e.to_string())))?;
    let full_path = ROOTFILE
        .captures(&container)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| EpubError::new(EpubErrorKind::Container("no rootfile".to_string())))?;
    Ok(full_path)
}

struct ManifestItem {
    href: String,
    is_document: bool,
}

fn spine_chapters(extracted_dir: &Path) -> RedraftResult<Vec<SourceChapter>> {
    let opf_path = package_path(extracted_dir)?;
    let opf = read_document(&extracted_dir.join(&opf_path))
        .map_err(|e| EpubError::new(EpubErrorKind::Package(e.to_string())))?;
    let opf_dir = opf_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();

    let manifest: HashMap<String, ManifestItem> = ITEM
        .find_iter(&opf)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let id = ID_ATTR.captures(tag)?[1].to_string();
            let href = HREF_ATTR.captures(tag)?[1].to_string();
            let is_document = MEDIA_TYPE_ATTR
                .captures(tag)
                .map(|media| media[1].contains("html"))
                .unwrap_or(true);
            Some((id, ManifestItem { href, is_document }))
        })
        .collect();
    debug!(items = manifest.len(), "Read package manifest");

    let mut chapters = Vec::new();
    for (position, captures) in ITEMREF.captures_iter(&opf).enumerate() {
        let idref = &captures[1];
        let Some(item) = manifest.get(idref).filter(|item| item.is_document) else {
            warn!(idref, "Spine entry has no document in the manifest, skipping");
            continue;
        };

        let id = archive_path(&opf_dir, &item.href);
        let html = match read_document(&extracted_dir.join(&id)) {
            Ok(html) => html,
            Err(e) => {
                warn!(id = %id, error = %e, "Spine document unreadable, skipping");
                continue;
            }
        };
        chapters.push(source_chapter(id, &html, position + 1));
    }
    Ok(chapters)
}

fn scan_chapters(extracted_dir: &Path) -> Vec<SourceChapter> {
    let mut paths: Vec<PathBuf> = WalkDir::new(extracted_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            name.ends_with(".xhtml") && name.contains("chapter")
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let mut chapters = Vec::new();
    for path in paths {
        let html = match read_document(&path) {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Failed to read chapter file");
                continue;
            }
        };
        let id = path
            .strip_prefix(extracted_dir)
            .unwrap_or(&path)
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let number = chapters.len() + 1;
        chapters.push(source_chapter(id, &html, number));
    }
    chapters
}

fn source_chapter(id: String, html: &str, number: usize) -> SourceChapter {
    let title = chapter_title(html).unwrap_or_else(|| format!("Chapter {}", number));
    SourceChapter::new(id, title, html_to_text(html))
}

/// Join a manifest href onto the package document's directory,
/// resolving `..` segments.
fn archive_path(opf_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = opf_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
