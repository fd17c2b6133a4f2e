//! The individual text-transform stages
//!
//! Each stage is a total, pure function over the raw text: it never fails,
//! never executes anything, and returns its input unchanged when there is
//! nothing for it to do. Detection is substring/pattern based, not a parse -
//! best effort by design. The orchestrator in `mod.rs` owns the order and the
//! fallback path that makes the whole pipeline infallible.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fence delimiters with an optional language tag (```jsx, ```tsx, ```…).
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z]*[ \t]*\n?").expect("fence pattern"));

/// Line-anchored module import statements.
static IMPORT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*import\s+.*\n?").expect("import pattern"));

/// Leading `export default` qualifier on a line.
static EXPORT_DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)export\s+default\s+").expect("export-default pattern"));

/// Leading `export` qualifier on a line.
static EXPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)export\s+").expect("export pattern"));

/// First function declaration and the name it binds.
static FUNCTION_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async\s+)?function\s+([A-Za-z_$][A-Za-z0-9_$]*)")
        .expect("function-declaration pattern")
});

/// First `const`/`let`/`var` assignment and the name it binds.
static BINDING_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=")
        .expect("binding-declaration pattern")
});

/// Line prefixes that begin a function or variable declaration.
const DECLARATION_STARTS: &[&str] = &["function ", "async function ", "const ", "let ", "var "];

/// Remove fenced code-block delimiters and any language tag following them.
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").into_owned()
}

/// Remove line-anchored import statements and leading export qualifiers.
pub fn strip_module_lines(text: &str) -> String {
    let text = IMPORT_LINE_RE.replace_all(text, "");
    let text = EXPORT_DEFAULT_RE.replace_all(&text, "$1");
    EXPORT_RE.replace_all(&text, "$1").into_owned()
}

/// Drop leading explanatory prose: the first line that begins a declaration
/// becomes the new start. Text without any declaration line is left
/// untouched - that case is handled by synthesis or the fallback, not here.
pub fn strip_leading_prose(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let first_decl = lines.iter().position(|line| {
        let t = line.trim_start();
        DECLARATION_STARTS.iter().any(|p| t.starts_with(p))
    });
    match first_decl {
        Some(0) | None => text.to_string(),
        Some(i) => lines[i..].join("\n"),
    }
}

/// The name bound by the first function declaration, else by the first
/// `const`/`let`/`var` assignment. `None` means no declaration exists.
pub fn entry_identifier(text: &str) -> Option<String> {
    if let Some(caps) = FUNCTION_DECL_RE.captures(text) {
        return Some(caps[1].to_string());
    }
    BINDING_DECL_RE.captures(text).map(|caps| caps[1].to_string())
}

/// Angle-bracket syntax that is plausibly markup. Substring heuristic, same
/// as the declaration checks.
pub fn looks_like_markup(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

/// Wrap bare markup in a zero-argument declaration returning it verbatim.
pub fn synthesize_wrapper(markup: &str, entry: &str) -> String {
    format!(
        "function {entry}() {{\n  return (\n    {}\n  );\n}}",
        markup.trim()
    )
}

/// Byte ranges of complete `render(...)` invocations, in order.
///
/// A small scanner rather than a regex: the argument list may span lines and
/// contain nested parens, strings or markup. Property accesses such as
/// `ReactDOM.render(` are not counted - only the helper itself.
pub fn find_render_invocations(text: &str) -> Vec<std::ops::Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = text[search_from..].find("render") {
        let start = search_from + rel;
        search_from = start + "render".len();

        // Word boundary on the left; a preceding `.` or identifier char
        // means this is a method or a longer name.
        if start > 0 {
            let prev = bytes[start - 1];
            if prev == b'.' || prev == b'$' || prev == b'_' || prev.is_ascii_alphanumeric() {
                continue;
            }
        }

        // Skip whitespace to the opening paren.
        let mut i = start + "render".len();
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'(' {
            continue;
        }

        // Scan to the matching close paren, honoring string literals.
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut end = None;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(q) => {
                    if b == b'\\' {
                        i += 1;
                    } else if b == q {
                        quote = None;
                    }
                }
                None => match b {
                    b'\'' | b'"' | b'`' => quote = Some(b),
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(i + 1);
                            break;
                        }
                    }
                    _ => {}
                },
            }
            i += 1;
        }

        let Some(mut end) = end else { continue };
        if end < bytes.len() && bytes[end] == b';' {
            end += 1;
        }
        search_from = end;
        ranges.push(start..end);
    }

    ranges
}

/// Guarantee exactly one render invocation: append `render(<entry>);` when
/// none exists, drop all but the last when the model emitted several.
pub fn ensure_single_render_invocation(text: &str, entry: &str) -> String {
    let invocations = find_render_invocations(text);
    match invocations.len() {
        0 => {
            let mut out = text.trim_end().to_string();
            out.push_str(&format!("\n\nrender({entry});"));
            out
        }
        1 => text.to_string(),
        _ => {
            let mut out = String::with_capacity(text.len());
            let mut cursor = 0;
            for range in &invocations[..invocations.len() - 1] {
                out.push_str(&text[cursor..range.start]);
                cursor = range.end;
            }
            out.push_str(&text[cursor..]);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let raw = "```jsx\nfunction A() {}\n```";
        assert_eq!(strip_fences(raw), "function A() {}\n");
        assert_eq!(strip_fences("no fences"), "no fences");
    }

    #[test]
    fn test_strip_fences_language_tag_variants() {
        for tag in ["```javascript\n", "```tsx\n", "```\n", "```"] {
            assert!(!strip_fences(tag).contains("```"));
        }
    }

    #[test]
    fn test_strip_module_lines() {
        let raw = "import React from 'react';\nimport './app.css';\nexport default function A() {}\nexport const B = 1;";
        let out = strip_module_lines(raw);
        assert!(!out.contains("import"));
        assert!(out.contains("function A() {}"));
        assert!(out.contains("const B = 1;"));
        assert!(!out.contains("export"));
    }

    #[test]
    fn test_strip_module_lines_keeps_mid_line_mentions() {
        // Only line-anchored statements are module syntax.
        let raw = "const note = 'we import nothing';";
        assert_eq!(strip_module_lines(raw), raw);
    }

    #[test]
    fn test_strip_leading_prose() {
        let raw = "Here is your component:\nIt counts clicks.\nfunction Counter() {}\nrender(Counter);";
        let out = strip_leading_prose(raw);
        assert!(out.starts_with("function Counter"));
        assert!(out.contains("render(Counter);"));
    }

    #[test]
    fn test_strip_leading_prose_without_declaration_is_untouched() {
        let raw = "just prose\nmore prose";
        assert_eq!(strip_leading_prose(raw), raw);
    }

    #[test]
    fn test_entry_identifier_prefers_function_declaration() {
        let text = "const helper = 1;\nfunction Widget() {}\n";
        assert_eq!(entry_identifier(text).as_deref(), Some("Widget"));
    }

    #[test]
    fn test_entry_identifier_falls_back_to_binding() {
        let text = "const Widget = () => {};\n";
        assert_eq!(entry_identifier(text).as_deref(), Some("Widget"));
        assert_eq!(entry_identifier("plain prose"), None);
    }

    #[test]
    fn test_synthesize_wrapper() {
        let out = synthesize_wrapper("<div>Hello</div>", "GeneratedComponent");
        assert!(out.starts_with("function GeneratedComponent()"));
        assert!(out.contains("<div>Hello</div>"));
    }

    #[test]
    fn test_find_render_invocations_skips_method_calls() {
        let text = "ReactDOM.render(<A />);\nrender(A);";
        let found = find_render_invocations(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].clone()], "render(A);");
    }

    #[test]
    fn test_find_render_invocations_multiline() {
        let text = "render(\n  App\n);";
        let found = find_render_invocations(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].clone()], text);
    }

    #[test]
    fn test_ensure_single_render_appends_when_missing() {
        let out = ensure_single_render_invocation("function A() {}", "A");
        assert!(out.ends_with("render(A);"));
    }

    #[test]
    fn test_ensure_single_render_keeps_existing() {
        let text = "function A() {}\n\nrender(A);";
        assert_eq!(ensure_single_render_invocation(text, "A"), text);
    }

    #[test]
    fn test_ensure_single_render_drops_all_but_last() {
        let text = "function A() {}\nrender(A);\nfunction B() {}\nrender(B);";
        let out = ensure_single_render_invocation(text, "A");
        assert_eq!(find_render_invocations(&out).len(), 1);
        assert!(out.contains("render(B);"));
        assert!(!out.contains("render(A);"));
    }

    #[test]
    fn test_render_scanner_honors_strings() {
        let text = "render('a )( tricky string');";
        let found = find_render_invocations(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].clone()], text);
    }
}
