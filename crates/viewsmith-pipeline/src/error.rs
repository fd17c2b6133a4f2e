//! Pipeline error taxonomy
//!
//! Only two things can make a submission fail: the request itself (rejected
//! before any external call) and the model gateway. Normalization never
//! fails - it degrades to the fixed notice unit - and render failures are
//! data, carried inside the [`RenderOutcome`](crate::sandbox::RenderOutcome)
//! rather than raised. Nothing here is ever fatal to the host.

use crate::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Empty or blank request text; user-visible, no retry needed.
    #[error("request text is empty")]
    EmptyRequest,

    /// The model service failed; recoverable by resubmission.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
