use tokio::sync::mpsc;

use crate::context::ExecutionContext;
use crate::error::TaskError;
use crate::fork::{apply_fork_args, cleanup_fork_session, create_fork_session};
use crate::request::{NormalizedParams, TaskWorkItem};
use crate::resolve::{resolve_task_config, ResolveDefaults, ResolvedTaskConfig};
use crate::runner::{run_task, RunTaskArgs, SingleResult};
use crate::skills::build_task_prompt;

/// An item with its final prompt and agent flags, ready to spawn.
#[derive(Debug, Clone)]
pub struct PreparedTask {
    pub index: usize,
    pub item: TaskWorkItem,
    pub prompt: String,
    pub config: ResolvedTaskConfig,
}

/// Build the skill-wrapped prompt and resolve configuration for one item.
pub async fn prepare_task(
    index: usize,
    item: TaskWorkItem,
    params: &NormalizedParams,
    ctx: &ExecutionContext,
) -> Result<PreparedTask, TaskError> {
    let prompt = build_task_prompt(&item, &ctx.skills, ctx.skill_list_limit).await?;
    let defaults = ResolveDefaults {
        model: params.model.as_deref(),
        thinking: params.thinking,
        inherited_thinking: ctx.inherited_thinking,
        session_model: ctx.session_model.as_ref(),
        active_tools: &ctx.active_tools,
    };
    let config = resolve_task_config(&item, &defaults)?;
    Ok(PreparedTask {
        index,
        item,
        prompt,
        config,
    })
}

/// Run a prepared task, inside its own fork session when it forks.
pub async fn run_prepared(
    task: &PreparedTask,
    ctx: &ExecutionContext,
    updates: Option<&mpsc::UnboundedSender<SingleResult>>,
) -> SingleResult {
    let fork = if task.item.fork {
        let created = match ctx.session_file.as_deref() {
            Some(path) => create_fork_session(path).await,
            None => Err(TaskError::ForkPrerequisite(
                "Cannot fork: no session file is available".to_string(),
            )),
        };
        match created {
            Ok(session) => Some(session),
            Err(e) => return setup_failure(task, e, updates),
        }
    } else {
        None
    };

    let args = match fork.as_ref() {
        Some(session) => apply_fork_args(&task.config.args, session),
        None => task.config.args.clone(),
    };

    let result = run_task(RunTaskArgs {
        runner: ctx.runner.as_ref(),
        agent_bin: &ctx.config.agent_bin,
        cwd: ctx.cwd.as_deref(),
        index: task.index,
        item: &task.item,
        prompt: &task.prompt,
        config: &task.config,
        args,
        abort: &ctx.abort,
        abort_grace: ctx.abort_grace(),
        stderr_capture_bytes: ctx.config.stderr_capture_bytes,
        updates,
    })
    .await;

    cleanup_fork_session(fork);
    result
}

fn setup_failure(
    task: &PreparedTask,
    err: TaskError,
    updates: Option<&mpsc::UnboundedSender<SingleResult>>,
) -> SingleResult {
    tracing::error!(error.kind = err.kind(), task.index = task.index, error.message = %err);
    let mut result = SingleResult::pending(task.index, &task.item);
    result.model = task.config.model_label.clone();
    result.thinking = Some(task.config.thinking);
    result.exit_code = 1;
    result.error_message = Some(err.to_string());
    if let Some(tx) = updates {
        let _ = tx.send(result.clone());
    }
    result
}
