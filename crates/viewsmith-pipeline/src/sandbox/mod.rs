//! Sandbox renderer
//!
//! Evaluates a normalized unit against a selected capability scope inside an
//! embedded JavaScript engine and turns the result into a preview outcome.
//! Evaluation runs in three steps: a static reference check against the
//! scope, markup lowering, then execution of a harness script in boa. Every
//! failure - unresolved symbol, syntax defect, thrown error, timeout - is
//! caught and represented as a failed [`RenderOutcome`]; nothing escapes to
//! the host.

pub mod lower;
pub mod renderer;

pub use lower::lower_unit;
pub use renderer::SandboxRenderer;

use serde::{Deserialize, Serialize};

/// Renderer lifecycle. Transitions: Idle → Evaluating → Rendered | Errored;
/// re-entry into Evaluating happens only when a new unit is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    Idle,
    Evaluating,
    Rendered,
    Errored,
}

/// Result of one render attempt. Superseded wholesale by the next attempt -
/// old and new output are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub success: bool,
    /// The markup-text projection, present on success.
    pub output: Option<String>,
    /// Human-readable error, present on failure. Displayed in the error
    /// channel, separate from the preview output.
    pub error: Option<String>,
}

impl RenderOutcome {
    pub fn rendered(output: String) -> Self {
        Self { success: true, output: Some(output), error: None }
    }

    pub fn failed(error: String) -> Self {
        Self { success: false, output: None, error: Some(error) }
    }
}
