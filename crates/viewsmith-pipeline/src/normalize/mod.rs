//! Code normalizer
//!
//! Converts an arbitrary model reply into exactly one evaluable,
//! render-invoking unit without ever executing the text. The stages run in a
//! fixed order and each is total; when every heuristic comes up empty the
//! pipeline substitutes a fixed error-display unit, so normalization always
//! returns a non-empty renderable unit.
//!
//! Re-running normalization on its own output is a no-op: the stripping
//! stages find nothing left to strip and the render-invocation stage sees
//! its invariant already satisfied.

mod stages;

pub use stages::find_render_invocations;

use serde::{Deserialize, Serialize};

/// Entry name used when the reply binds no name of its own.
pub const FALLBACK_ENTRY: &str = "GeneratedComponent";

/// Entry name of the fixed error-display unit.
pub const FALLBACK_NOTICE_ENTRY: &str = "GenerationNotice";

/// The fixed unit substituted when the reply contains neither a declaration
/// nor markup. Self-describing so the preview explains itself.
const FALLBACK_NOTICE_UNIT: &str = "\
function GenerationNotice() {
  return (
    <div style={{ padding: 16, color: '#b91c1c', fontFamily: 'sans-serif' }}>
      The model reply did not contain a renderable component.
    </div>
  );
}

render(GenerationNotice);";

/// How the unit's entry declaration came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOrigin {
    /// The reply declared the entry itself.
    Declared,
    /// Bare markup was wrapped in a synthesized declaration.
    Synthesized,
    /// Nothing renderable was found; the fixed notice unit was substituted.
    Fallback,
}

/// The cleaned, guaranteed-renderable form of a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUnit {
    /// The evaluable source, containing exactly one render invocation.
    pub code: String,
    /// The declaration name the render invocation targets.
    pub entry: String,
    pub origin: UnitOrigin,
}

/// Normalize raw model text into a renderable unit. Total: never fails, for
/// any input including the empty string, pure prose and malformed markup.
pub fn normalize(raw: &str) -> NormalizedUnit {
    let text = stages::strip_fences(raw);
    let text = stages::strip_module_lines(&text);
    let text = stages::strip_leading_prose(&text);
    let text = text.trim();

    if let Some(entry) = stages::entry_identifier(text) {
        let code = stages::ensure_single_render_invocation(text, &entry);
        return NormalizedUnit { code, entry, origin: UnitOrigin::Declared };
    }

    if stages::looks_like_markup(text) {
        let wrapped = stages::synthesize_wrapper(text, FALLBACK_ENTRY);
        let code = stages::ensure_single_render_invocation(&wrapped, FALLBACK_ENTRY);
        return NormalizedUnit {
            code,
            entry: FALLBACK_ENTRY.to_string(),
            origin: UnitOrigin::Synthesized,
        };
    }

    log::debug!("reply had no declaration and no markup; substituting notice unit");
    NormalizedUnit {
        code: FALLBACK_NOTICE_UNIT.to_string(),
        entry: FALLBACK_NOTICE_ENTRY.to_string(),
        origin: UnitOrigin::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_idempotent(raw: &str) {
        let once = normalize(raw);
        let twice = normalize(&once.code);
        assert_eq!(once.code, twice.code, "normalization must be a no-op on its own output");
        assert_eq!(once.entry, twice.entry);
    }

    #[test]
    fn test_fenced_import_scenario() {
        let raw = "```jsx\nimport React from 'react';\nfunction Btn(){return <button>Hi</button>;}\n```";
        let unit = normalize(raw);
        assert!(!unit.code.contains("```"));
        assert!(!unit.code.contains("import"));
        assert!(unit.code.contains("function Btn()"));
        assert_eq!(unit.entry, "Btn");
        assert_eq!(unit.origin, UnitOrigin::Declared);
        let invocations = find_render_invocations(&unit.code);
        assert_eq!(invocations.len(), 1);
        assert!(unit.code.trim_end().ends_with("render(Btn);"));
    }

    #[test]
    fn test_bare_markup_synthesizes_wrapper() {
        let unit = normalize("<div>Hello</div>");
        assert_eq!(unit.origin, UnitOrigin::Synthesized);
        assert_eq!(unit.entry, FALLBACK_ENTRY);
        assert!(unit.code.contains("<div>Hello</div>"));
        assert!(unit.code.contains("function GeneratedComponent()"));
        assert_eq!(find_render_invocations(&unit.code).len(), 1);
    }

    #[test]
    fn test_empty_and_prose_fall_back_to_notice_unit() {
        for raw in ["", "   \n ", "Sorry, I can only help with UI requests."] {
            let unit = normalize(raw);
            assert_eq!(unit.origin, UnitOrigin::Fallback, "input {raw:?}");
            assert_eq!(unit.entry, FALLBACK_NOTICE_ENTRY);
            assert!(!unit.code.is_empty());
            assert_eq!(find_render_invocations(&unit.code).len(), 1);
        }
    }

    #[test]
    fn test_leading_prose_is_dropped() {
        let raw = "Sure! Here is the component you asked for:\n\nfunction Card() { return <div>card</div>; }";
        let unit = normalize(raw);
        assert!(unit.code.starts_with("function Card()"));
        assert_eq!(unit.entry, "Card");
    }

    #[test]
    fn test_export_default_qualifier_is_stripped() {
        let raw = "export default function App() { return <div />; }";
        let unit = normalize(raw);
        assert!(unit.code.starts_with("function App()"));
        assert_eq!(unit.entry, "App");
    }

    #[test]
    fn test_arrow_binding_entry() {
        let raw = "const Toggle = () => <button>on</button>;";
        let unit = normalize(raw);
        assert_eq!(unit.entry, "Toggle");
        assert!(unit.code.trim_end().ends_with("render(Toggle);"));
    }

    #[test]
    fn test_existing_render_invocation_is_not_duplicated() {
        let raw = "function App() { return <div />; }\nrender(App);";
        let unit = normalize(raw);
        assert_eq!(find_render_invocations(&unit.code).len(), 1);
    }

    #[test]
    fn test_surplus_render_invocations_collapse_to_last() {
        let raw = "function A() { return <i />; }\nrender(A);\nfunction B() { return <b />; }\nrender(B);";
        let unit = normalize(raw);
        let found = find_render_invocations(&unit.code);
        assert_eq!(found.len(), 1);
        assert!(unit.code.contains("render(B);"));
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "",
            "pure prose, nothing else",
            "<div>Hello</div>",
            "```jsx\nimport React from 'react';\nfunction Btn(){return <button>Hi</button>;}\n```",
            "Sure! Here you go:\nfunction Card() { return <div>card</div>; }",
            "const Toggle = () => <button>on</button>;",
            "function A() { return <i />; }\nrender(A);\nrender(A);",
            "<div>unclosed markup",
        ];
        for raw in inputs {
            assert_idempotent(raw);
        }
    }

    #[test]
    fn test_malformed_markup_still_yields_unit() {
        // '<' with no '>' is not markup by the heuristic, and there is no
        // declaration: the fixed notice unit applies.
        let unit = normalize("<div oops");
        assert_eq!(unit.origin, UnitOrigin::Fallback);

        // '<' and '>' present but unbalanced: wrapped verbatim; containment
        // of any evaluation failure is the renderer's job.
        let unit = normalize("<div>unclosed");
        assert_eq!(unit.origin, UnitOrigin::Synthesized);
    }
}
