//! Request complexity classifier
//!
//! Decides whether a UI request asks for a single focused component or a
//! full application. The result steers both prompt construction and which
//! capability scope the preview is evaluated against.
//!
//! The classifier is intentionally coarse and runs synchronously - it is a
//! keyword heuristic, not an AI call. A complex keyword always wins over a
//! simple one; requests matching neither set fall back to a word-count rule.

use serde::{Deserialize, Serialize};

/// Keywords that indicate a single focused component.
const SIMPLE_KEYWORDS: &[&str] = &[
    "button", "input", "card", "modal", "form", "list item", "header", "footer", "todo",
    "counter", "slider", "toggle", "checkbox",
];

/// Keywords that indicate a full application. These take precedence.
const COMPLEX_KEYWORDS: &[&str] = &[
    "app", "application", "dashboard", "platform", "system", "full", "complete", "entire",
    "comprehensive",
];

/// Requests shorter than this many words default to simple when no keyword matches.
const SHORT_REQUEST_WORDS: usize = 8;

/// Derived complexity of a UI request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    /// Single focused component. Evaluated against the restricted scope.
    Simple,
    /// Multi-component application. Evaluated against the expanded scope.
    Complex,
}

impl RequestCategory {
    /// Human-readable label for the shell.
    pub fn label(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
        }
    }
}

/// Classify a request as simple or complex.
///
/// Case-insensitive substring match against the two keyword sets; any complex
/// keyword wins regardless of simple matches. When neither set matches, short
/// requests (under [`SHORT_REQUEST_WORDS`] words) are treated as simple.
pub fn classify(request: &str) -> RequestCategory {
    let lower = request.to_lowercase();

    if COMPLEX_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return RequestCategory::Complex;
    }
    if SIMPLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return RequestCategory::Simple;
    }

    if request.split_whitespace().count() < SHORT_REQUEST_WORDS {
        RequestCategory::Simple
    } else {
        RequestCategory::Complex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_keyword() {
        assert_eq!(
            classify("Create a button with hover effects"),
            RequestCategory::Simple
        );
    }

    #[test]
    fn test_complex_keyword() {
        assert_eq!(
            classify("Build a music streaming dashboard"),
            RequestCategory::Complex
        );
    }

    #[test]
    fn test_complex_takes_precedence() {
        // Contains both "todo" (simple) and "app" (complex).
        assert_eq!(
            classify("A todo app with categories"),
            RequestCategory::Complex
        );
        assert_eq!(
            classify("complete form with a submit button"),
            RequestCategory::Complex
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("A DASHBOARD for sales"), RequestCategory::Complex);
        assert_eq!(classify("A Button"), RequestCategory::Simple);
    }

    #[test]
    fn test_short_unmatched_defaults_simple() {
        assert_eq!(classify("something small and red"), RequestCategory::Simple);
    }

    #[test]
    fn test_long_unmatched_defaults_complex() {
        let request = "an interactive visualization of global shipping routes \
                       with filters for year and cargo type and per-route detail";
        assert_eq!(classify(request), RequestCategory::Complex);
    }

    #[test]
    fn test_empty_is_simple() {
        assert_eq!(classify(""), RequestCategory::Simple);
    }
}
