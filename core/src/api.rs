//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `subagent_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_subagent_data_dir, load_default, load_from_path, AppConfig, LoggingConfig, RunnerConfig,
    SkillsConfig,
};
pub use crate::context::ExecutionContext;
pub use crate::error::{CliError, RunnerError, TaskError};
pub use crate::executor::{
    execute, execute_params, format_usage, preview, ExecutionOutcome, ProgressTx, ProgressUpdate,
};
pub use crate::fork::{create_fork_session, cleanup_fork_session, ForkSession};
pub use crate::request::{
    normalize_params, Mode, NormalizedParams, TaskWorkItem, ThinkingLevel, ThinkingSetting,
};
pub use crate::resolve::{resolve_task_config, ProviderModel, ResolveDefaults, ResolvedTaskConfig};
pub use crate::runner::{
    aggregate_usage, final_output, AbortSignal, ProcessRunnerPlugin, RunOutcome, RunnerPlugin,
    RunnerSession, RunnerStartArgs, Signal, SingleResult, TaskState, UsageStats,
};
pub use crate::skills::{
    build_task_prompt, parse_frontmatter_field, SkillCatalog, SkillProvider, SkillRecord,
};
