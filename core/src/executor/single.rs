use tokio::sync::mpsc;

use crate::context::ExecutionContext;
use crate::error::TaskError;
use crate::request::{Mode, NormalizedParams};
use crate::runner::SingleResult;

use super::prepare::{prepare_task, run_prepared};
use super::types::{publish, ExecutionOutcome, ProgressTx, ProgressUpdate};

pub async fn run_single(
    params: &NormalizedParams,
    ctx: &ExecutionContext,
    progress: Option<&ProgressTx>,
) -> Result<ExecutionOutcome, TaskError> {
    let item = params
        .tasks
        .first()
        .cloned()
        .ok_or_else(|| TaskError::Validation("Single mode requires exactly 1 task, got 0".into()))?;

    let task = prepare_task(0, item, params, ctx).await?;

    let mut current = SingleResult::pending(0, &task.item);
    current.model = task.config.model_label.clone();
    current.thinking = Some(task.config.thinking);
    publish(progress, || {
        ProgressUpdate::new(Mode::Single, "(running...)".to_string(), std::slice::from_ref(&current))
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<SingleResult>();
    let run = async move {
        let tx = tx;
        run_prepared(&task, ctx, Some(&tx)).await
    };
    let consume = async {
        while let Some(snapshot) = rx.recv().await {
            let text = snapshot.output();
            publish(progress, || {
                ProgressUpdate::new(Mode::Single, text, std::slice::from_ref(&snapshot))
            });
        }
    };
    let (result, ()) = tokio::join!(run, consume);

    let (text, is_error) = if result.is_failed() {
        let verb = if result.is_aborted() { "aborted" } else { "failed" };
        (format!("Task {verb}: {}", result.error_text()), true)
    } else {
        let out = result.output();
        let text = if out.trim().is_empty() {
            "(no output)".to_string()
        } else {
            out
        };
        (text, false)
    };

    Ok(ExecutionOutcome::new(Mode::Single, text, is_error, vec![result]))
}
