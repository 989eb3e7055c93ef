use tokio::sync::mpsc;

use crate::context::ExecutionContext;
use crate::error::TaskError;
use crate::request::{Mode, NormalizedParams};
use crate::runner::SingleResult;

use super::output::preview;
use super::prepare::{prepare_task, run_prepared, PreparedTask};
use super::scheduler::map_with_concurrency_limit;
use super::types::{publish, ExecutionOutcome, ProgressTx, ProgressUpdate};

const LABEL_CHARS: usize = 60;

/// Run every item concurrently under `max_concurrency`.
///
/// All items are prepared first; one bad item rejects the whole call before
/// any agent starts. Task failures do not stop the other tasks.
pub async fn run_parallel(
    params: &NormalizedParams,
    ctx: &ExecutionContext,
    progress: Option<&ProgressTx>,
) -> Result<ExecutionOutcome, TaskError> {
    let mut prepared: Vec<PreparedTask> = Vec::with_capacity(params.tasks.len());
    for (i, item) in params.tasks.iter().enumerate() {
        prepared.push(prepare_task(i, item.clone(), params, ctx).await?);
    }

    let mut results: Vec<SingleResult> = prepared
        .iter()
        .map(|t| {
            let mut r = SingleResult::pending(t.index, &t.item);
            r.model = t.config.model_label.clone();
            r.thinking = Some(t.config.thinking);
            r
        })
        .collect();
    publish(progress, || {
        ProgressUpdate::new(Mode::Parallel, String::new(), &results)
    });

    let limit = ctx.config.max_concurrency;
    let (tx, mut rx) = mpsc::unbounded_channel::<SingleResult>();
    let prepared_ref = &prepared;
    let run_all = async move {
        let tx = tx;
        let tx_ref = &tx;
        map_with_concurrency_limit(prepared_ref, limit, move |_, task| {
            run_prepared(task, ctx, Some(tx_ref))
        })
        .await
    };
    let consume = async {
        while let Some(snapshot) = rx.recv().await {
            let text = snapshot.output();
            if let Some(slot) = results.get_mut(snapshot.index) {
                *slot = snapshot;
            }
            publish(progress, || {
                ProgressUpdate::new(Mode::Parallel, text, &results)
            });
        }
    };
    let (finals, ()) = tokio::join!(run_all, consume);

    let succeeded = finals.iter().filter(|r| !r.is_failed()).count();
    let text = parallel_report(&finals, succeeded, ctx.config.preview_chars);
    Ok(ExecutionOutcome::new(
        Mode::Parallel,
        text,
        succeeded < finals.len(),
        finals,
    ))
}

fn parallel_report(results: &[SingleResult], succeeded: usize, preview_chars: usize) -> String {
    let mut text = format!("Parallel: {succeeded}/{} succeeded", results.len());
    for r in results {
        let (icon, body) = if r.is_aborted() {
            ("⊘ aborted", r.error_text())
        } else if r.is_failed() {
            ("✗", r.error_text())
        } else {
            ("✓", r.output())
        };
        let label = r.skill.as_deref().unwrap_or(&r.prompt);
        text.push_str(&format!(
            "\n\n[{}] {icon} {}: {}",
            r.index + 1,
            preview(label, LABEL_CHARS),
            preview(&body, preview_chars)
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TaskWorkItem;

    #[test]
    fn report_tags_each_outcome() {
        let mut ok = SingleResult::pending(0, &TaskWorkItem::new("find the bug"));
        ok.exit_code = 0;
        ok.messages.push(
            serde_json::from_value(serde_json::json!({"role": "assistant", "content": "found it in a very long explanation"}))
                .unwrap(),
        );
        let mut failed = SingleResult::pending(1, &TaskWorkItem::new("lint"));
        failed.exit_code = 2;
        failed.stderr = "lint: not found".into();
        let mut aborted = SingleResult::pending(2, &TaskWorkItem::new("slow"));
        aborted.exit_code = 143;
        aborted.stop_reason = Some("aborted".into());

        let text = parallel_report(&[ok, failed, aborted], 1, 12);
        assert_eq!(
            text,
            "Parallel: 1/3 succeeded\n\n[1] ✓ find the bug: found it in…\n\n[2] ✗ lint: lint: not fo…\n\n[3] ⊘ aborted slow: Task was abo…"
        );
    }
}
