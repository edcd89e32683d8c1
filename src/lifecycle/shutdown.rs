//! Stop request fan-out.
//!
//! One `Shutdown` is owned by whoever decides the process should stop (the
//! signal handler, or a test). The HTTP server holds a `ShutdownSignal` and
//! drains in-flight exchanges once it fires.
//!
//! The trigger is latched in a `watch` channel, so a signal handed out after
//! `trigger` still resolves immediately.

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A future-producing handle for one listener of the stop request.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask every signal holder to stop. Repeated calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the owning `Shutdown` is triggered or dropped.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn wait(mut self) {
        // Err means every `Shutdown` is gone; nobody is left to keep us up.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
