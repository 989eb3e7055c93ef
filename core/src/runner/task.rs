use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::request::TaskWorkItem;
use crate::resolve::ResolvedTaskConfig;
use crate::util::RingBytes;

use super::abort::{terminate_session, AbortSignal};
use super::events::{apply_event, decode_event_line};
use super::io_pump;
use super::traits::RunnerPlugin;
use super::types::{RunOutcome, RunnerStartArgs, SingleResult, EXIT_RUNNING};

pub struct RunTaskArgs<'a> {
    pub runner: &'a dyn RunnerPlugin,
    pub agent_bin: &'a str,
    pub cwd: Option<&'a Path>,
    pub index: usize,
    pub item: &'a TaskWorkItem,
    /// Final prompt, appended as the last positional argument.
    pub prompt: &'a str,
    pub config: &'a ResolvedTaskConfig,
    /// Agent flags; `config.args`, possibly rewritten for a fork session.
    pub args: Vec<String>,
    pub abort: &'a AbortSignal,
    pub abort_grace: Duration,
    pub stderr_capture_bytes: usize,
    /// Receives a snapshot on start, on every accepted event and at the end.
    pub updates: Option<&'a mpsc::UnboundedSender<SingleResult>>,
}

/// Run one agent process to completion.
///
/// Never fails: spawn errors, nonzero exits and aborts are all recorded on the
/// returned result.
pub async fn run_task(args: RunTaskArgs<'_>) -> SingleResult {
    let RunTaskArgs {
        runner,
        agent_bin,
        cwd,
        index,
        item,
        prompt,
        config,
        args,
        abort,
        abort_grace,
        stderr_capture_bytes,
        updates,
    } = args;

    let mut result = SingleResult::pending(index, item);
    result.model = config.model_label.clone();
    result.thinking = Some(config.thinking);

    let publish = |r: &SingleResult| {
        if let Some(tx) = updates {
            let _ = tx.send(r.clone());
        }
    };

    if abort.is_aborted() {
        result.exit_code = 1;
        result.mark_aborted();
        result.error_message = Some("Aborted before start".to_string());
        publish(&result);
        return result;
    }

    let mut cmd_args = args;
    cmd_args.push(prompt.to_string());
    let start = RunnerStartArgs {
        cmd: agent_bin.to_string(),
        args: cmd_args,
        envs: HashMap::new(),
        cwd: cwd.map(Path::to_path_buf),
    };

    let mut session = match runner.start_session(&start).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error.kind = "spawn", task.index = index, cmd = %agent_bin, error.message = %e);
            let msg = format!("failed to spawn {agent_bin}: {e}");
            result.exit_code = 1;
            result.stderr = msg.clone();
            result.error_message = Some(msg);
            publish(&result);
            return result;
        }
    };

    let started_at = Instant::now();
    result.exit_code = EXIT_RUNNING;
    publish(&result);
    tracing::info!(task.index = index, model = ?result.model, thinking = %config.thinking, "task started");

    // Agents run non-interactively; an open stdin can make some wait for input.
    drop(session.stdin());

    let ring_err = RingBytes::new(stderr_capture_bytes);
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let out_task = session.stdout().map(|rd| io_pump::pump_lines(rd, line_tx));
    let err_task = session
        .stderr()
        .map(|rd| io_pump::pump_stderr(rd, ring_err.clone()));

    let mut skipped = 0u64;
    let mut on_line = |result: &mut SingleResult, line: String| {
        if apply_event(result, decode_event_line(&line)) {
            publish(result);
        } else if !line.trim().is_empty() {
            skipped += 1;
        }
    };

    let mut aborted = false;
    let exit_status = {
        let wait_fut = session.wait();
        tokio::pin!(wait_fut);

        loop {
            tokio::select! {
                biased;

                res = &mut wait_fut => break Some(res),

                _ = abort.aborted() => {
                    aborted = true;
                    break None;
                }

                line = line_rx.recv() => match line {
                    Some(line) => on_line(&mut result, line),
                    // stdout closed; keep waiting for exit or abort.
                    None => {
                        let exit = tokio::select! {
                            res = &mut wait_fut => Some(res),
                            _ = abort.aborted() => None,
                        };
                        aborted = exit.is_none();
                        break exit;
                    }
                },
            }
        }
    };

    let exit_status = match exit_status {
        Some(status) => status,
        None => {
            tracing::warn!(error.kind = "user.abort", task.index = index, "aborting task");
            terminate_session(&mut session, abort_grace).await
        }
    };

    while let Some(line) = line_rx.recv().await {
        on_line(&mut result, line);
    }
    if let Some(task) = out_task {
        if let Ok(Err(e)) = task.await {
            tracing::warn!(error.kind = "stream.io", task.index = index, error.message = %e);
        }
    }
    if let Some(task) = err_task {
        let _ = task.await;
    }
    result.stderr = ring_err.to_string_lossy();
    let dropped = ring_err.dropped();
    if dropped > 0 {
        result.stderr = format!("[{dropped} earlier stderr bytes dropped]\n{}", result.stderr);
    }

    result.exit_code = match exit_status {
        Ok(RunOutcome { exit_code }) => exit_code,
        Err(e) => {
            tracing::error!(error.kind = "wait", task.index = index, error.message = %e);
            if result.error_message.is_none() {
                result.error_message = Some(format!("failed to wait for agent: {e}"));
            }
            1
        }
    };
    if aborted {
        result.mark_aborted();
    }

    tracing::info!(
        task.index = index,
        exit_code = result.exit_code,
        state = ?result.state(),
        stop_reason = ?result.stop_reason,
        turns = result.usage.turns,
        skipped_lines = skipped,
        duration_ms = started_at.elapsed().as_millis() as u64,
        "task finished"
    );
    publish(&result);
    result
}
