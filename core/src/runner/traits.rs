use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::types::{RunOutcome, RunnerStartArgs, Signal};

/// One live agent process.
#[async_trait]
pub trait RunnerSession: Send {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>>;
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    /// Deliver a signal. A no-op once the process has exited.
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()>;
    /// Wait for exit. Cancel-safe: may be dropped and called again.
    async fn wait(&mut self) -> anyhow::Result<RunOutcome>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}
