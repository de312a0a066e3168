//! Single-assignment signals with multiple observers (§9): the unblock
//! outcome and per-request phase completions are represented this way.
//! Resolving one twice is a programming error, not a recoverable state.

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};

pub struct DeferredSender<T> {
    sender: Option<oneshot::Sender<T>>,
}

impl<T> DeferredSender<T> {
    /// Resolves the deferred. Calling this a second time is a logic bug;
    /// debug builds assert, release builds drop the duplicate resolution
    /// silently since the first one already reached every observer.
    pub fn resolve(&mut self, value: T) {
        match self.sender.take() {
            Some(tx) => {
                let _ = tx.send(value);
            }
            None => debug_assert!(false, "deferred resolved more than once"),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.is_none()
    }
}

#[derive(Clone)]
pub struct Deferred<T: Clone> {
    shared: Shared<oneshot::Receiver<T>>,
}

impl<T: Clone> Deferred<T> {
    pub async fn wait(&self) -> T {
        self.shared
            .clone()
            .await
            .expect("deferred sender dropped without resolving")
    }
}

pub fn deferred<T: Clone>() -> (DeferredSender<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (
        DeferredSender { sender: Some(tx) },
        Deferred { shared: rx.shared() },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiple_observers_see_the_same_value() {
        let (mut tx, deferred) = deferred::<u32>();
        let a = deferred.clone();
        let b = deferred.clone();
        tx.resolve(7);
        assert_eq!(a.wait().await, 7);
        assert_eq!(b.wait().await, 7);
    }
}
