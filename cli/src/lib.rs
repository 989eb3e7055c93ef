//! subagent CLI library: modules exposed for the binary and its unit tests.

pub mod commands;
pub mod progress;
pub mod run;
pub mod skills;
