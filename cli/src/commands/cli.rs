use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "subagent", version, about = "Run isolated agent tasks in single, chain or parallel mode")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file. Defaults to ~/.subagent/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra skill roots scanned for `<name>/SKILL.md`. Can be given multiple times.
    #[arg(long = "skills-dir", action = clap::ArgAction::Append, global = true)]
    pub skills_dir: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a task request.
    Run(RunArgs),
    /// List the skills that would be available to a run.
    Skills,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// JSON request file: {"type": ..., "tasks": [...]}. Reads stdin when omitted or "-".
    #[arg(long)]
    pub request: Option<String>,

    #[arg(long)]
    pub agent_bin: Option<String>,

    /// Session log copied into forked tasks.
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Model of the calling session ("provider/modelId"), used when no task or
    /// request model is given.
    #[arg(long)]
    pub session_model: Option<String>,

    /// Thinking level that "inherit" resolves to.
    #[arg(long, default_value = "medium")]
    pub thinking: String,

    /// Tool allow-list passed to every agent.
    #[arg(long, value_delimiter = ',', conflicts_with = "no_tools")]
    pub tools: Vec<String>,

    #[arg(long)]
    pub no_tools: bool,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Abort every running agent after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Working directory for the agents.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// No progress display.
    #[arg(long)]
    pub quiet: bool,

    /// Print the full outcome as JSON.
    #[arg(long)]
    pub json: bool,
}
