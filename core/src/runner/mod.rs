mod abort;
mod events;
mod io_pump;
mod process;
mod task;
mod traits;
pub mod types;

pub use abort::{terminate_session, AbortSignal};
pub use events::{apply_event, decode_event_line, AgentEvent};
pub use process::ProcessRunnerPlugin;
pub use task::{run_task, RunTaskArgs};
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{
    aggregate_usage, final_output, AgentMessage, MessageRole, MessageUsage, RunOutcome,
    RunnerStartArgs, Signal, SingleResult, TaskState, UsageStats, EXIT_PENDING, EXIT_RUNNING,
};
