//! Project-wide terminology that must survive every rewrite.

use redraft_error::{JsonError, RedraftResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category name to terms, e.g. `characters -> ["Alex", "Master Elara"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary(BTreeMap<String, Vec<String>>);

impl Glossary {
    /// An empty glossary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert terms for a category, trimming them and dropping blanks and
    /// duplicates while keeping first-seen order.
    pub fn insert(&mut self, category: impl Into<String>, terms: impl IntoIterator<Item = String>) {
        let entry = self.0.entry(category.into()).or_default();
        for term in terms {
            let term = term.trim();
            if !term.is_empty() && !entry.iter().any(|existing| existing == term) {
                entry.push(term.to_string());
            }
        }
    }

    /// Terms recorded for a category.
    pub fn terms(&self, category: &str) -> Option<&[String]> {
        self.0.get(category).map(Vec::as_slice)
    }

    /// True when no category holds any term.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Parse the model's answer to a glossary extraction prompt.
    ///
    /// Accepts a bare JSON object, one wrapped in a markdown code fence,
    /// or one surrounded by commentary.
    ///
    /// # Errors
    ///
    /// Returns a JSON error when no object mapping categories to string
    /// arrays can be found.
    ///
    /// # Examples
    ///
    /// ```
    /// use redraft_core::Glossary;
    ///
    /// let response = "```json\n{\"characters\": [\"Alex\"], \"terms\": []}\n```";
    /// let glossary = Glossary::from_response(response).unwrap();
    /// assert_eq!(glossary.terms("characters").unwrap(), ["Alex".to_string()]);
    /// ```
    pub fn from_response(response: &str) -> RedraftResult<Self> {
        let json = extract_json_object(response)
            .ok_or_else(|| JsonError::new("No JSON object found in glossary response"))?;
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| JsonError::new(format!("Failed to parse glossary: {}", e)))?;

        let mut glossary = Glossary::new();
        for (category, terms) in raw {
            glossary.insert(category, terms);
        }
        Ok(glossary)
    }

    /// Render as a prompt block, or `None` when there is nothing to preserve.
    ///
    /// # Examples
    ///
    /// ```
    /// use redraft_core::Glossary;
    ///
    /// let mut glossary = Glossary::new();
    /// glossary.insert("characters", vec!["Alex".to_string(), "Elara".to_string()]);
    /// let text = glossary.render().unwrap();
    /// assert!(text.ends_with("- Characters: Alex, Elara"));
    /// ```
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut parts = vec!["Key Terminology and Names (Must be Preserved):".to_string()];
        for (category, terms) in &self.0 {
            if !terms.is_empty() {
                parts.push(format!("- {}: {}", capitalize(category), terms.join(", ")));
            }
        }
        Some(parts.join("\n"))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Slice out the JSON object in an LLM response.
fn extract_json_object(response: &str) -> Option<&str> {
    let body = match response.find("```") {
        Some(fence) => {
            let after = &response[fence + 3..];
            let after = after.strip_prefix("json").unwrap_or(after);
            match after.find("```") {
                Some(close) => &after[..close],
                None => after,
            }
        }
        None => response,
    };
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}
