//! Mode orchestrators.
//!
//! ```text
//! raw request
//!   ↓
//! normalize_params() → ensure_fork_prerequisites()
//!   ↓
//! run_single | run_chain | run_parallel
//!   ↓            ↓            ↓
//! prepare_task() (skill prompt + config) per item
//!   ↓
//! run_prepared() → fork session → runner::run_task()
//!   ↓
//! ExecutionOutcome
//! ```

mod chain;
mod output;
mod parallel;
mod prepare;
mod scheduler;
mod single;
mod types;

use serde_json::Value;
use tracing::Instrument;

use crate::context::ExecutionContext;
use crate::error::TaskError;
use crate::fork::ensure_fork_prerequisites;
use crate::request::{normalize_params, Mode, NormalizedParams};

pub use chain::{run_chain, render_chain_placeholder, PREVIOUS_PLACEHOLDER};
pub use output::{format_tokens, format_usage, preview};
pub use parallel::run_parallel;
pub use prepare::{prepare_task, run_prepared, PreparedTask};
pub use scheduler::map_with_concurrency_limit;
pub use single::run_single;
pub use types::{ExecutionOutcome, ProgressTx, ProgressUpdate};

/// Validate a raw request and run it in its mode.
///
/// Request, configuration, skill and fork-prerequisite errors end the call as
/// `Err` before any agent is spawned (a chain may already have run earlier
/// steps; those come back in an `Ok` outcome with `is_error` set).
pub async fn execute(
    raw: &Value,
    ctx: &ExecutionContext,
    progress: Option<&ProgressTx>,
) -> Result<ExecutionOutcome, TaskError> {
    let params = normalize_params(raw, ctx.config.max_parallel_tasks)?;
    execute_params(&params, ctx, progress).await
}

pub async fn execute_params(
    params: &NormalizedParams,
    ctx: &ExecutionContext,
    progress: Option<&ProgressTx>,
) -> Result<ExecutionOutcome, TaskError> {
    ensure_fork_prerequisites(params, ctx.session_file.as_deref())?;

    let call_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("execute", %call_id, mode = %params.mode, tasks = params.tasks.len());
    async {
        let res = match params.mode {
            Mode::Single => run_single(params, ctx, progress).await,
            Mode::Chain => run_chain(params, ctx, progress).await,
            Mode::Parallel => run_parallel(params, ctx, progress).await,
        };
        match &res {
            Ok(outcome) => tracing::info!(
                is_error = outcome.is_error,
                results = outcome.results.len(),
                cost = outcome.usage.cost,
                "call finished"
            ),
            Err(e) => tracing::warn!(error.kind = e.kind(), error.message = %e, "call rejected"),
        }
        res
    }
    .instrument(span)
    .await
}
