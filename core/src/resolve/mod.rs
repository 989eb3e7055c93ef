//! Per-item configuration: effective model, thinking level and agent flags.

mod args;
mod model;
mod resolver;

pub use args::{build_agent_args, NO_SESSION_FLAG, SESSION_DIR_FLAG, SESSION_FLAG};
pub use model::ProviderModel;
pub use resolver::{resolve_task_config, ResolveDefaults, ResolvedTaskConfig};
