//! Request cancellation
//!
//! An [`AbortController`] pairs a trigger with any number of
//! [`AbortSignal`]s. Aborting is idempotent. A signal whose controller is
//! dropped without aborting simply never fires.

use std::sync::Arc;
use tokio::sync::watch;

/// Trigger side of a cancellation pair
#[derive(Debug, Clone)]
pub struct AbortController {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// A signal observing this controller
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            receiver: self.receiver.clone(),
        }
    }

    /// Cancel every exchange watching this controller
    pub fn abort(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.receiver.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation pair
#[derive(Debug, Clone)]
pub struct AbortSignal {
    receiver: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the controller aborts
    pub async fn aborted(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Controller gone without aborting
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Resolves when either signal fires
pub(crate) async fn either_aborted(first: &AbortSignal, second: Option<&AbortSignal>) {
    match second {
        Some(second) => {
            tokio::select! {
                _ = first.aborted() => {}
                _ = second.aborted() => {}
            }
        }
        None => first.aborted().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_abort_wakes_signal() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        let waiter = tokio::spawn(async move { signal.aborted().await });
        controller.abort();
        waiter.await.unwrap();
        assert!(controller.is_aborted());
    }

    #[tokio::test]
    async fn test_abort_is_idempotent() {
        let controller = AbortController::new();
        controller.abort();
        controller.abort();
        controller.signal().aborted().await;
        assert!(controller.signal().is_aborted());
    }

    #[tokio::test]
    async fn test_dropped_controller_never_fires() {
        let signal = {
            let controller = AbortController::new();
            controller.signal()
        };

        let fired = tokio::time::timeout(Duration::from_millis(50), signal.aborted()).await;
        assert!(fired.is_err());
    }

    #[tokio::test]
    async fn test_either_aborted() {
        let first = AbortController::new();
        let second = AbortController::new();
        second.abort();

        either_aborted(&first.signal(), Some(&second.signal())).await;
        assert!(!first.is_aborted());
    }
}
