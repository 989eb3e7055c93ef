use tokio::sync::mpsc;

use crate::context::ExecutionContext;
use crate::error::TaskError;
use crate::request::{Mode, NormalizedParams};
use crate::runner::SingleResult;

use super::prepare::{prepare_task, run_prepared};
use super::types::{publish, ExecutionOutcome, ProgressTx, ProgressUpdate};

/// Token in a chain step's prompt that is replaced by the previous step's output.
pub const PREVIOUS_PLACEHOLDER: &str = "{previous}";

/// How a step that has not run yet is shown.
pub fn render_chain_placeholder(prompt: &str) -> String {
    prompt.replace(PREVIOUS_PLACEHOLDER, "...")
}

/// Run steps in order, feeding each step's output into the next.
///
/// Stops at the first step that fails or cannot be prepared; steps after it are
/// never started. Earlier results are kept.
pub async fn run_chain(
    params: &NormalizedParams,
    ctx: &ExecutionContext,
    progress: Option<&ProgressTx>,
) -> Result<ExecutionOutcome, TaskError> {
    let total = params.tasks.len();
    let mut results: Vec<SingleResult> = Vec::with_capacity(total);
    let mut previous = String::new();

    for (step, item) in params.tasks.iter().enumerate() {
        let step_item = item.with_prompt(item.prompt.replace(PREVIOUS_PLACEHOLDER, &previous));

        let task = match prepare_task(step, step_item, params, ctx).await {
            Ok(task) => task,
            Err(e) if step == 0 => return Err(e),
            Err(e) => {
                tracing::warn!(step = step + 1, error.kind = e.kind(), error.message = %e, "chain step rejected");
                return Ok(stopped(results, step, total, &e.to_string()));
            }
        };

        let mut current = SingleResult::pending(step, &task.item);
        current.model = task.config.model_label.clone();
        current.thinking = Some(task.config.thinking);
        publish(progress, || {
            ProgressUpdate::new(Mode::Chain, String::new(), &chain_view(&results, &current, params))
        });

        let (tx, mut rx) = mpsc::unbounded_channel::<SingleResult>();
        let run = async {
            let tx = tx;
            run_prepared(&task, ctx, Some(&tx)).await
        };
        let consume = async {
            while let Some(snapshot) = rx.recv().await {
                let text = snapshot.output();
                publish(progress, || {
                    ProgressUpdate::new(Mode::Chain, text, &chain_view(&results, &snapshot, params))
                });
            }
        };
        let (result, ()) = tokio::join!(run, consume);

        let failed = result.is_failed();
        let error = result.error_text();
        if !failed {
            previous = result.output();
        }
        results.push(result);

        if failed {
            tracing::warn!(step = step + 1, total, "chain stopped on failed step");
            return Ok(stopped(results, step, total, &error));
        }
    }

    let text = results
        .last()
        .map(SingleResult::output)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "(no output)".to_string());
    Ok(ExecutionOutcome::new(Mode::Chain, text, false, results))
}

// Finished steps, the active one, then placeholders for the rest.
fn chain_view(
    finished: &[SingleResult],
    current: &SingleResult,
    params: &NormalizedParams,
) -> Vec<SingleResult> {
    let next = current.index + 1;
    let mut view = finished.to_vec();
    view.push(current.clone());
    view.extend(params.tasks.iter().enumerate().skip(next).map(|(i, item)| {
        SingleResult::pending(i, &item.with_prompt(render_chain_placeholder(&item.prompt)))
    }));
    view
}

fn stopped(results: Vec<SingleResult>, step: usize, total: usize, error: &str) -> ExecutionOutcome {
    let text = format!("Chain stopped at step {}/{}: {error}", step + 1, total);
    ExecutionOutcome::new(Mode::Chain, text, true, results)
}
