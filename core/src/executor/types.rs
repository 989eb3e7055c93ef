use serde::Serialize;
use tokio::sync::mpsc;

use crate::request::Mode;
use crate::runner::{aggregate_usage, SingleResult, TaskState, UsageStats};

pub type ProgressTx = mpsc::UnboundedSender<ProgressUpdate>;

/// Snapshot published whenever any task of the call changes.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub mode: Mode,
    /// Latest text worth showing: the active task's output so far.
    pub text: String,
    pub results: Vec<SingleResult>,
    pub done: usize,
    pub running: usize,
    pub total: usize,
}

impl ProgressUpdate {
    pub fn new(mode: Mode, text: String, results: &[SingleResult]) -> Self {
        let done = results.iter().filter(|r| r.is_finished()).count();
        let running = results
            .iter()
            .filter(|r| r.state() == TaskState::Running)
            .count();
        Self {
            mode,
            text,
            results: results.to_vec(),
            done,
            running,
            total: results.len(),
        }
    }
}

pub(crate) fn publish(progress: Option<&ProgressTx>, update: impl FnOnce() -> ProgressUpdate) {
    if let Some(tx) = progress {
        let _ = tx.send(update());
    }
}

/// Result of one top-level call.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub mode: Mode,
    pub text: String,
    pub is_error: bool,
    pub results: Vec<SingleResult>,
    pub usage: UsageStats,
}

impl ExecutionOutcome {
    pub fn new(mode: Mode, text: String, is_error: bool, results: Vec<SingleResult>) -> Self {
        let usage = aggregate_usage(&results);
        Self {
            mode,
            text,
            is_error,
            results,
            usage,
        }
    }
}
