//! Isolated sub-agent task orchestration.
//!
//! A request names one or more prompts and a mode. Each prompt runs in its own
//! agent subprocess; the executor threads outputs through a chain, fans tasks
//! out in parallel under a concurrency bound, or runs a single task.
//!
//! ```text
//! raw request (JSON)
//!   ↓
//! request::normalize_params() → NormalizedParams
//!   ↓
//! skills::build_task_prompt() + resolve::resolve_task_config()
//!   ↓
//! executor::{run_single, run_chain, run_parallel}
//!   ↓
//! fork::create_fork_session() (optional) → runner::run_task() per item
//!   ↓
//! ExecutionOutcome
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod fork;
pub mod request;
pub mod resolve;
pub mod runner;
pub mod skills;
pub mod util;
