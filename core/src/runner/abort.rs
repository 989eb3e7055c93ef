use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::traits::RunnerSession;
use super::types::{RunOutcome, Signal};

/// Cancellation shared by every task of one top-level call.
///
/// Clones observe the same signal. Raising it twice is harmless.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn abort(&self) {
        self.tx.send_if_modified(|raised| !std::mem::replace(raised, true));
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal has been raised.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so this only returns once raised.
        let _ = rx.wait_for(|raised| *raised).await;
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Graceful terminate, then force-kill if the process outlives `grace`.
pub async fn terminate_session(
    session: &mut Box<dyn RunnerSession>,
    grace: Duration,
) -> anyhow::Result<RunOutcome> {
    if let Err(e) = session.signal(Signal::Term).await {
        tracing::warn!(error.kind = "abort.term_failed", error.message = %e);
    }

    match tokio::time::timeout(grace, session.wait()).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "agent ignored terminate, killing"
            );
            let _ = session.signal(Signal::Kill).await;
            session.wait().await
        }
    }
}
