use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use subagent_core::api::{
    execute, format_usage, get_subagent_data_dir, AbortSignal, AppConfig, CliError,
    ExecutionContext, ExecutionOutcome, ProcessRunnerPlugin, ProviderModel, SkillCatalog,
    ThinkingLevel,
};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::commands::cli::RunArgs;
use crate::progress::ProgressMonitor;
use crate::skills::{FsSkillProvider, SkillRoot};

/// `subagent run`: returns the process exit code.
pub async fn run_command(
    args: RunArgs,
    skills_dir: &[String],
    mut cfg: AppConfig,
) -> Result<i32, CliError> {
    let raw = read_request(args.request.as_deref()).await?;

    if let Some(bin) = args.agent_bin.clone() {
        cfg.runner.agent_bin = bin;
    }
    if let Some(n) = args.max_concurrency {
        cfg.runner.max_concurrency = n;
    }
    let thinking = ThinkingLevel::parse(&args.thinking).ok_or_else(|| {
        CliError::Request(format!("invalid --thinking \"{}\"", args.thinking))
    })?;
    let session_model = args
        .session_model
        .as_deref()
        .map(ProviderModel::parse)
        .transpose()?;
    let tools = if args.no_tools {
        Vec::new()
    } else if args.tools.is_empty() {
        cfg.runner.tools.clone()
    } else {
        args.tools.clone()
    };

    let catalog = load_skills(skills_dir, &cfg)?;
    let abort = AbortSignal::new();
    let ctx = ExecutionContext::new(Arc::new(ProcessRunnerPlugin::new()), cfg.runner.clone())
        .with_skills(catalog, cfg.skills.list_limit)
        .with_session_file(args.session_file.clone())
        .with_session_model(session_model)
        .with_active_tools(tools)
        .with_inherited_thinking(thinking)
        .with_cwd(args.cwd.clone())
        .with_abort(abort.clone());

    spawn_abort_triggers(&abort, args.timeout_secs);

    let show_progress = !args.quiet && !args.json && atty::is(atty::Stream::Stderr);
    let mut monitor = ProgressMonitor::new(show_progress);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = async {
        let tx = tx;
        execute(&raw, &ctx, Some(&tx)).await
    };
    let render = async {
        while let Some(update) = rx.recv().await {
            monitor.update(&update);
        }
    };
    let (outcome, ()) = tokio::join!(run, render);
    let outcome = outcome?;
    monitor.finish(!outcome.is_error);
    drop(monitor);

    if args.json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::Anyhow(e.into()))?;
        println!("{json}");
    } else {
        println!("{}", outcome.text);
        let usage = format_usage(&outcome.usage, shared_model(&outcome).as_deref());
        if !usage.is_empty() {
            println!("\n{usage}");
        }
    }

    Ok(if outcome.is_error { 1 } else { 0 })
}

async fn read_request(path: Option<&str>) -> Result<Value, CliError> {
    let text = match path {
        None | Some("-") => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
        Some(p) => tokio::fs::read_to_string(p).await?,
    };
    serde_json::from_str(&text).map_err(|e| CliError::Request(format!("request is not valid JSON: {e}")))
}

/// Explicit dirs win; otherwise config dirs; otherwise `~/.subagent/skills`
/// and `./.subagent/skills`.
pub fn skill_roots(explicit: &[String], cfg: &AppConfig) -> Vec<SkillRoot> {
    if !explicit.is_empty() {
        return explicit.iter().map(|d| SkillRoot::new("cli", d)).collect();
    }
    if !cfg.skills.directories.is_empty() {
        return cfg
            .skills
            .directories
            .iter()
            .map(|d| SkillRoot::new("config", d))
            .collect();
    }
    let mut roots = Vec::new();
    if let Ok(data_dir) = get_subagent_data_dir() {
        roots.push(SkillRoot::new("user", &data_dir.join("skills").to_string_lossy()));
    }
    roots.push(SkillRoot::new("project", ".subagent/skills"));
    roots
}

pub fn load_skills(explicit: &[String], cfg: &AppConfig) -> Result<SkillCatalog, CliError> {
    let provider = FsSkillProvider::new(skill_roots(explicit, cfg));
    Ok(SkillCatalog::from_provider(&provider)?)
}

// Ctrl-C and the wall-clock limit both raise the call's abort signal.
fn spawn_abort_triggers(abort: &AbortSignal, timeout_secs: Option<u64>) {
    let on_ctrl_c = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(error.kind = "user.interrupt", "interrupted, aborting tasks");
            on_ctrl_c.abort();
        }
    });

    if let Some(secs) = timeout_secs {
        let on_timeout = abort.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!(error.kind = "timeout", timeout_secs = secs, "time limit reached, aborting tasks");
            on_timeout.abort();
        });
    }
}

/// The model label, when every task that reported one agrees.
fn shared_model(outcome: &ExecutionOutcome) -> Option<String> {
    let mut models = outcome.results.iter().filter_map(|r| r.model.as_deref());
    let first = models.next()?;
    models.all(|m| m == first).then(|| first.to_string())
}
