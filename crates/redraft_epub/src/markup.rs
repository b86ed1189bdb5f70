//! Conversion between chapter XHTML and the plain text sent to providers.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("Valid blank run regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("Valid heading regex"));
static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*\*\*|---)$").expect("Valid rule regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("Valid bold regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+?)\*").expect("Valid italic regex"));

/// Plain text of an XHTML document.
///
/// Script and style content is dropped, each text node lands on its own
/// line, entities are decoded by the parser and runs of blank lines
/// collapse to one.
///
/// # Examples
///
/// ```
/// use redraft_epub::html_to_text;
///
/// let html = "<html><body><h1>One</h1><script>x()</script><p>Tea &amp; toast.</p></body></html>";
/// assert_eq!(html_to_text(html), "One\nTea & toast.");
/// ```
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let lines: Vec<&str> = document
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| matches!(element.name(), "script" | "style"))
            })
        })
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect();

    BLANK_RUN
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

/// Text of the first `h1`–`h3` heading, if any has text.
pub fn chapter_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1, h2, h3").ok()?;
    let heading = document.select(&selector).next()?;
    let title = heading
        .text()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

/// Convert rewritten plain text to the XHTML placed inside `<body>`.
///
/// Blank lines separate paragraphs and consecutive lines of a paragraph
/// are joined with a space. A line of `#` marks followed by text is a
/// heading of that level, and a line holding only `***` or `---` is a
/// rule. Inside blocks, `**bold**` and `*italic*` become `strong` and
/// `em`, `...` becomes an ellipsis and `--` an em dash.
///
/// # Examples
///
/// ```
/// use redraft_epub::text_to_xhtml_body;
///
/// let body = text_to_xhtml_body("## Dawn\nShe *ran*\n-- fast.\n\n***\n\nEnd...");
/// assert_eq!(
///     body,
///     "<h2>Dawn</h2>\n<p>She <em>ran</em> \u{2014} fast.</p>\n<hr/>\n<p>End\u{2026}</p>"
/// );
/// ```
pub fn text_to_xhtml_body(text: &str) -> String {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if RULE.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push("<hr/>".to_string());
        } else if let Some(captures) = HEADING.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let level = captures[1].len();
            blocks.push(format!(
                "<h{level}>{}</h{level}>",
                inline_markup(captures[2].trim())
            ));
        } else {
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    blocks.join("\n")
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    blocks.push(format!("<p>{}</p>", inline_markup(&paragraph.join(" "))));
    paragraph.clear();
}

fn inline_markup(text: &str) -> String {
    let escaped = html_escape::encode_text(text);
    let bold = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>$1</em>");
    italic.replace("...", "\u{2026}").replace("--", "\u{2014}")
}
