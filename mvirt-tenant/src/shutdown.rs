//! Cooperative shutdown signal checked at phase and retry boundaries.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

/// Read side of a shutdown flag. Without a receiver, shutdown is never requested.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    rx: Option<watch::Receiver<bool>>,
}

impl Shutdown {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_requested(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleep for `duration`. Returns `true` if shutdown was requested before
    /// the pause elapsed.
    pub async fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let Some(rx) = &self.rx else {
            sleep_until(deadline).await;
            return false;
        };

        let mut rx = rx.clone();
        let stopped = tokio::select! {
            _ = sleep_until(deadline) => return false,
            changed = rx.wait_for(|stop| *stop) => changed.is_ok(),
        };

        // Sender gone: nobody can request shutdown anymore, finish the pause.
        if !stopped {
            sleep_until(deadline).await;
        }
        stopped
    }
}
