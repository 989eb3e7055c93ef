use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub skills: SkillsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "subagent_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Agent executable spawned for every task.
    #[serde(default = "default_agent_bin")]
    pub agent_bin: String,

    /// Upper bound on `tasks.len()` for chain and parallel requests.
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,

    /// How many parallel tasks may run at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Grace window between SIGTERM and SIGKILL when a task is aborted.
    #[serde(default = "default_abort_grace_ms")]
    pub abort_grace_ms: u64,

    /// Maximum characters of task output shown in the parallel report.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Bytes of stderr kept per task (tail).
    #[serde(default = "default_stderr_capture_bytes")]
    pub stderr_capture_bytes: usize,

    /// Tool allow-list handed to agents when the caller names none. Empty
    /// means agents run with tools disabled.
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

fn default_agent_bin() -> String {
    "agent".to_string()
}

fn default_max_parallel_tasks() -> usize {
    8
}

fn default_max_concurrency() -> usize {
    4
}

fn default_abort_grace_ms() -> u64 {
    5_000
}

fn default_preview_chars() -> usize {
    200
}

fn default_stderr_capture_bytes() -> usize {
    64 * 1024
}

fn default_tools() -> Vec<String> {
    ["read", "bash", "edit", "write"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            agent_bin: default_agent_bin(),
            max_parallel_tasks: default_max_parallel_tasks(),
            max_concurrency: default_max_concurrency(),
            abort_grace_ms: default_abort_grace_ms(),
            preview_chars: default_preview_chars(),
            stderr_capture_bytes: default_stderr_capture_bytes(),
            tools: default_tools(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Roots scanned for `<name>/SKILL.md`. `~` is expanded.
    #[serde(default)]
    pub directories: Vec<String>,

    /// How many skill names an unknown-skill error lists before "+N more".
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_list_limit() -> usize {
    10
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            list_limit: default_list_limit(),
        }
    }
}
