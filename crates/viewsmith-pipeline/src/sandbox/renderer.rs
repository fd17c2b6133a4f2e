//! Harness assembly and sandboxed evaluation
//!
//! The harness wires three pieces in front of the lowered unit: the JavaScript
//! stubs for every capability in the selected scope, a `render(target)` helper
//! that invokes the entry declaration and captures its projection, and a
//! try/catch envelope that converts any thrown error into a sentinel string.
//! Nothing outside the scope's stubs is installed, so a symbol absent from
//! the mapping fails with a reference error instead of resolving from some
//! ambient namespace.
//!
//! Evaluation runs on a watchdog thread: boa cannot be interrupted once
//! started, so the caller polls for completion and gives up after the
//! configured timeout rather than hanging the host on a runaway unit.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use boa_engine::{Context, Source};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{lower_unit, RenderOutcome, RenderState};
use crate::normalize::NormalizedUnit;
use crate::scope::ScopeDefinition;

/// Default evaluation timeout in milliseconds.
pub const DEFAULT_EVAL_TIMEOUT_MS: u64 = 5000;

const PENDING_SENTINEL: &str = "__RENDER_PENDING__";
const ERROR_PREFIX: &str = "ERROR: ";

/// Capitalized tags used as components: `<MyComponent`.
static COMPONENT_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Z][A-Za-z0-9_$]*)").expect("component tag pattern"));

/// Hook-style calls: `useSomething(`.
static HOOK_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(use[A-Z][A-Za-z0-9_$]*)\s*\(").expect("hook call pattern"));

/// Every name the unit declares locally.
static LOCAL_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:function\s+|(?:const|let|var)\s+)([A-Za-z_$][A-Za-z0-9_$]*)")
        .expect("local declaration pattern")
});

const RENDER_HELPER: &str = "\
var __render_output = null;
function render(target) {
  if (typeof target === 'function') {
    __render_output = target();
  } else if (target === null || target === undefined) {
    throw new Error('render target is ' + target);
  } else {
    __render_output = target;
  }
}
";

/// Evaluates normalized units against a scope, one outcome at a time.
///
/// The previous outcome is retained while a new unit evaluates and replaced
/// wholesale once the attempt resolves. Supplying the same unit again does
/// not re-enter evaluation.
pub struct SandboxRenderer {
    state: RenderState,
    outcome: Option<RenderOutcome>,
    last_code: Option<String>,
    timeout_ms: u64,
}

impl SandboxRenderer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            state: RenderState::Idle,
            outcome: None,
            last_code: None,
            timeout_ms,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The outcome of the most recent resolved attempt.
    pub fn current(&self) -> Option<&RenderOutcome> {
        self.outcome.as_ref()
    }

    /// Evaluate a unit against a scope.
    ///
    /// A unit identical to the previous one short-circuits to the retained
    /// outcome; surrounding state changes alone never restart evaluation.
    pub fn render(&mut self, unit: &NormalizedUnit, scope: &ScopeDefinition) -> RenderOutcome {
        if self.last_code.as_deref() == Some(unit.code.as_str()) {
            if let Some(outcome) = &self.outcome {
                return outcome.clone();
            }
        }

        self.state = RenderState::Evaluating;
        let outcome = evaluate(unit, scope, self.timeout_ms);
        self.state = if outcome.success {
            RenderState::Rendered
        } else {
            RenderState::Errored
        };
        self.last_code = Some(unit.code.clone());
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl Default for SandboxRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_EVAL_TIMEOUT_MS)
    }
}

/// One full evaluation: static reference check, lowering, harness run.
fn evaluate(unit: &NormalizedUnit, scope: &ScopeDefinition, timeout_ms: u64) -> RenderOutcome {
    if let Some(symbol) = unresolved_reference(&unit.code, scope) {
        return RenderOutcome::failed(format!(
            "symbol '{symbol}' is not available in the {} scope",
            scope.name()
        ));
    }

    let script = build_harness(&unit.code, scope);
    match run_with_watchdog(script, timeout_ms) {
        EvalResult::Value(value) => interpret_result(&value),
        EvalResult::EngineError(message) => RenderOutcome::failed(triage(&message)),
        EvalResult::Timeout => RenderOutcome::failed(format!(
            "evaluation timed out after {timeout_ms}ms; the unit may contain an infinite loop"
        )),
        EvalResult::Panicked => RenderOutcome::failed("evaluation panicked".to_string()),
    }
}

/// First referenced component or hook that is neither locally declared nor in
/// the scope. Substring heuristics, same family as the normalizer's.
fn unresolved_reference(code: &str, scope: &ScopeDefinition) -> Option<String> {
    let locals: HashSet<&str> = LOCAL_DECL_RE
        .captures_iter(code)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    for caps in COMPONENT_TAG_RE.captures_iter(code) {
        let name = &caps[1];
        if !locals.contains(name) && !scope.contains(name) {
            return Some(name.to_string());
        }
    }
    for caps in HOOK_CALL_RE.captures_iter(code) {
        let name = &caps[1];
        if !locals.contains(name) && !scope.contains(name) {
            return Some(name.to_string());
        }
    }
    None
}

/// Assemble the harness script around the lowered unit.
fn build_harness(code: &str, scope: &ScopeDefinition) -> String {
    let lowered = lower_unit(code);
    let mut script = String::with_capacity(lowered.len() + 1024);
    script.push_str(&scope.stub_prelude());
    script.push_str(RENDER_HELPER);
    script.push_str("var __outcome = '");
    script.push_str(PENDING_SENTINEL);
    script.push_str("';\ntry {\n");
    script.push_str(&lowered);
    script.push_str("\nif (__render_output === null) { throw new Error('render was never called'); }\n");
    script.push_str("__outcome = String(__render_output);\n");
    script.push_str("} catch (e) {\n  __outcome = 'ERROR: ' + e.message;\n}\n__outcome;\n");
    script
}

enum EvalResult {
    Value(String),
    EngineError(String),
    Timeout,
    Panicked,
}

/// Run the script in a fresh engine context on a watchdog thread.
///
/// The thread cannot be killed on timeout; it is left to finish on its own
/// while the renderer reports the timeout.
fn run_with_watchdog(script: String, timeout_ms: u64) -> EvalResult {
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = Arc::clone(&completed);

    let handle = thread::spawn(move || {
        let mut context = Context::default();
        let result = context.eval(Source::from_bytes(&script));
        completed_clone.store(true, Ordering::SeqCst);

        match result {
            Ok(value) => {
                let text = value
                    .to_string(&mut context)
                    .map(|s| s.to_std_string_escaped())
                    .unwrap_or_default();
                Ok(text)
            }
            Err(e) => Err(e.to_string()),
        }
    });

    let timeout = Duration::from_millis(timeout_ms);
    let start = std::time::Instant::now();
    loop {
        if completed.load(Ordering::SeqCst) {
            break;
        }
        if start.elapsed() >= timeout {
            return EvalResult::Timeout;
        }
        thread::sleep(Duration::from_millis(10));
    }

    match handle.join() {
        Ok(Ok(value)) => EvalResult::Value(value),
        Ok(Err(message)) => EvalResult::EngineError(message),
        Err(_) => EvalResult::Panicked,
    }
}

/// Map the harness result string to an outcome.
fn interpret_result(value: &str) -> RenderOutcome {
    if value == PENDING_SENTINEL {
        return RenderOutcome::failed("evaluation produced no result".to_string());
    }
    if let Some(message) = value.strip_prefix(ERROR_PREFIX) {
        return RenderOutcome::failed(triage(message));
    }
    RenderOutcome::rendered(value.to_string())
}

/// Rewrite engine error strings into messages the preview can show.
fn triage(message: &str) -> String {
    if message.contains("is not defined") {
        return format!("unresolved symbol: {message}");
    }
    message.to_string()
}
