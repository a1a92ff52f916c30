//! Cancellable suspension shared by flight waits, retry backoffs and queue polls.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::TransportError;

/// Sender half, held by whoever decides the process should stop.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.sender.send(true);
    }
}

/// Receiver half, cloned into every component that may suspend.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (ShutdownTrigger, Shutdown) {
        let (sender, receiver) = watch::channel(false);
        (ShutdownTrigger { sender }, Shutdown { receiver })
    }

    /// A signal that never fires. Handy for tests and one-shot tools.
    pub fn never() -> Shutdown {
        let (_, receiver) = watch::channel(false);
        Shutdown { receiver }
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown fires; pending forever if it never does.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        wait_for_trigger(&mut receiver).await;
    }

    /// Drives `fut` to completion unless shutdown fires first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, TransportError> {
        if self.is_triggered() {
            return Err(TransportError::Cancelled);
        }

        tokio::select! {
            output = fut => Ok(output),
            _ = self.cancelled() => Err(TransportError::Cancelled),
        }
    }

    /// Sleeps for `duration` unless shutdown fires first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), TransportError> {
        self.guard(tokio::time::sleep(duration)).await
    }
}

async fn wait_for_trigger(receiver: &mut watch::Receiver<bool>) {
    loop {
        if *receiver.borrow_and_update() {
            return;
        }
        if receiver.changed().await.is_err() {
            // Sender dropped without firing: nothing can cancel us any more.
            std::future::pending::<()>().await;
        }
    }
}
