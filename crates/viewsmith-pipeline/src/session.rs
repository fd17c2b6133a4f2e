//! Session state and the submission flow
//!
//! A session owns the single "current result" slot the shell reads from and
//! runs the whole pipeline per submission: classify, build the prompt, call
//! the gateway, normalize, select the scope, render. The shell is expected to
//! prevent overlapping submissions with the advisory busy flag, but the slot
//! itself is protected regardless: every submission is stamped with a
//! monotonically increasing sequence number, and a response that arrives
//! after a newer submission was stamped is discarded instead of overwriting
//! the newer result. Cancellation is exactly that discard - there is no
//! active abort and no timeout imposed on the gateway.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::classify::{classify, RequestCategory};
use crate::error::PipelineError;
use crate::gateway::ModelGateway;
use crate::normalize::{normalize, NormalizedUnit};
use crate::prompt::PromptBuilder;
use crate::sandbox::{RenderOutcome, SandboxRenderer};
use crate::scope::{ScopeChoice, ScopeRegistry};

/// Everything one resolved submission produced. The raw gateway text is
/// retained for diagnostics even though the unit supersedes it.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub sequence: u64,
    pub request: String,
    pub category: RequestCategory,
    pub raw_text: String,
    pub unit: NormalizedUnit,
    pub scope_name: &'static str,
    pub outcome: RenderOutcome,
}

/// How a submission ended from the caller's point of view.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The pipeline ran to completion and the current slot was replaced.
    Completed(GenerationResult),
    /// A newer submission was stamped while this one awaited the gateway;
    /// its response was discarded and the current slot left alone.
    Superseded,
}

/// One user session: pipeline collaborators plus the current-result slot.
pub struct Session {
    gateway: Arc<dyn ModelGateway>,
    scopes: Arc<ScopeRegistry>,
    prompts: PromptBuilder,
    renderer: Mutex<SandboxRenderer>,
    current: Mutex<Option<GenerationResult>>,
    scope_override: Mutex<Option<ScopeChoice>>,
    sequence: AtomicU64,
    busy: AtomicBool,
}

impl Session {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        scopes: Arc<ScopeRegistry>,
        prompts: PromptBuilder,
        renderer: SandboxRenderer,
    ) -> Self {
        Self {
            gateway,
            scopes,
            prompts,
            renderer: Mutex::new(renderer),
            current: Mutex::new(None),
            scope_override: Mutex::new(None),
            sequence: AtomicU64::new(0),
            busy: AtomicBool::new(false),
        }
    }

    /// Run one request through the whole pipeline.
    pub async fn submit(&self, request: &str) -> Result<SubmitOutcome, PipelineError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(PipelineError::EmptyRequest);
        }

        let _busy = BusyGuard::engage(&self.busy);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let category = classify(request);
        let choice = *self.scope_override.lock();
        let scope = self.scopes.select(category, choice);
        let bundle = self.prompts.build(category, request, scope);

        log::info!(
            "submission #{sequence}: category {}, scope {}, model {}",
            category.label(),
            scope.name(),
            bundle.params.model
        );

        let raw_text = self
            .gateway
            .generate(&bundle.system, &bundle.user, &bundle.params)
            .await?;

        if self.sequence.load(Ordering::SeqCst) != sequence {
            log::info!("submission #{sequence}: superseded while awaiting the gateway, discarding");
            return Ok(SubmitOutcome::Superseded);
        }

        let unit = normalize(&raw_text);
        let outcome = self.renderer.lock().render(&unit, scope);

        let result = GenerationResult {
            sequence,
            request: request.to_string(),
            category,
            raw_text,
            unit,
            scope_name: scope.name(),
            outcome,
        };

        let mut slot = self.current.lock();
        if self.sequence.load(Ordering::SeqCst) != sequence {
            log::info!("submission #{sequence}: superseded during rendering, discarding");
            return Ok(SubmitOutcome::Superseded);
        }
        *slot = Some(result.clone());
        Ok(SubmitOutcome::Completed(result))
    }

    /// Whether a submission is currently in flight. Advisory: the shell uses
    /// it to disable resubmission; the sequence stamp is the real guard.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn set_scope_override(&self, choice: Option<ScopeChoice>) {
        *self.scope_override.lock() = choice;
    }

    pub fn current(&self) -> Option<GenerationResult> {
        self.current.lock().clone()
    }

    pub fn current_unit(&self) -> Option<NormalizedUnit> {
        self.current.lock().as_ref().map(|r| r.unit.clone())
    }

    pub fn current_outcome(&self) -> Option<RenderOutcome> {
        self.current.lock().as_ref().map(|r| r.outcome.clone())
    }

    pub fn current_scope_name(&self) -> Option<&'static str> {
        self.current.lock().as_ref().map(|r| r.scope_name)
    }
}

/// Raises the busy flag for the duration of a submission.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
