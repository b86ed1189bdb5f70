//! Prompt templates and the per-chapter values substituted into them.

use derive_getters::Getters;
use redraft_error::{ChapterError, ChapterErrorKind, RedraftResult};

/// Template shipped with the crate, used when no template path is configured.
const BUNDLED_TEMPLATE: &str = include_str!("../../../prompt_templates/literary_rewrite.txt");

/// Everything substituted into a template for one chapter request.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PromptContext {
    /// Project-level style reference text
    style_reference: String,
    /// Rendered glossary block or its sentinel
    context_glossary: String,
    /// Previous chapter's summary or a sentinel
    rolling_context: String,
    /// Source text of the chapter being rewritten
    chapter_text: String,
}

impl PromptContext {
    /// Assemble the context for one chapter.
    pub fn new(
        style_reference: impl Into<String>,
        context_glossary: impl Into<String>,
        rolling_context: impl Into<String>,
        chapter_text: impl Into<String>,
    ) -> Self {
        Self {
            style_reference: style_reference.into(),
            context_glossary: context_glossary.into(),
            rolling_context: rolling_context.into(),
            chapter_text: chapter_text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum Slot {
    StyleReference,
    ContextGlossary,
    RollingContext,
    ChapterText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// A parsed prompt template.
///
/// Placeholders are `{style_reference}`, `{context_glossary}`,
/// `{rolling_context}` and `{chapter_text}`; `{{` and `}}` produce literal
/// braces.
///
/// # Examples
///
/// ```
/// use redraft_core::{PromptContext, PromptTemplate};
///
/// let template = PromptTemplate::parse("Style: {style_reference}\n{{json}}\n{chapter_text}").unwrap();
/// let context = PromptContext::new("terse", "", "", "It was a dark night.");
/// assert_eq!(template.render(&context), "Style: terse\n{json}\nIt was a dark night.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Fails on unknown placeholder names, unterminated `{`, or a lone `}`.
    pub fn parse(source: &str) -> RedraftResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(template_error(format!(
                                    "unterminated placeholder '{{{}'",
                                    name
                                )));
                            }
                        }
                    }
                    let slot = name
                        .trim()
                        .parse::<Slot>()
                        .map_err(|_| template_error(format!("unknown placeholder '{{{}}}'", name)))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                }
                '}' => return Err(template_error("single '}' encountered".to_string())),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// The template bundled with redraft.
    pub fn bundled() -> RedraftResult<Self> {
        Self::parse(BUNDLED_TEMPLATE)
    }

    /// Substitute the context into the template.
    pub fn render(&self, context: &PromptContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Slot::StyleReference) => out.push_str(&context.style_reference),
                Segment::Slot(Slot::ContextGlossary) => out.push_str(&context.context_glossary),
                Segment::Slot(Slot::RollingContext) => out.push_str(&context.rolling_context),
                Segment::Slot(Slot::ChapterText) => out.push_str(&context.chapter_text),
            }
        }
        out
    }
}

fn template_error(message: String) -> redraft_error::RedraftError {
    ChapterError::new(ChapterErrorKind::Template(message)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PromptContext {
        PromptContext::new("STYLE", "GLOSSARY", "PREVIOUS", "BODY")
    }

    #[test]
    fn test_all_placeholders_substituted() {
        let template =
            PromptTemplate::parse("{style_reference}|{context_glossary}|{rolling_context}|{chapter_text}")
                .unwrap();
        assert_eq!(template.render(&context()), "STYLE|GLOSSARY|PREVIOUS|BODY");
    }

    #[test]
    fn test_placeholder_may_repeat() {
        let template = PromptTemplate::parse("{chapter_text}\n---\n{chapter_text}").unwrap();
        assert_eq!(template.render(&context()), "BODY\n---\nBODY");
    }

    #[test]
    fn test_substituted_values_are_not_reinterpreted() {
        let template = PromptTemplate::parse("[{chapter_text}]").unwrap();
        let ctx = PromptContext::new("", "", "", "a {chapter_text} b }");
        assert_eq!(template.render(&ctx), "[a {chapter_text} b }]");
    }

    #[test]
    fn test_malformed_templates_rejected() {
        assert!(PromptTemplate::parse("{unknown}").is_err());
        assert!(PromptTemplate::parse("open {chapter_text").is_err());
        assert!(PromptTemplate::parse("close } brace").is_err());
    }

    #[test]
    fn test_bundled_template_has_every_slot() {
        let template = PromptTemplate::bundled().unwrap();
        let rendered = template.render(&context());
        for value in ["STYLE", "GLOSSARY", "PREVIOUS", "BODY"] {
            assert!(rendered.contains(value), "bundled template lacks {value}");
        }
    }
}
