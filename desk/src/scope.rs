//! Cooperative cancellation scopes.
//!
//! Every background task owns a [`ScopeHandle`] and checks it before
//! mutating shared state. Cancellation is cooperative: in-flight
//! requests still resolve, their results are simply discarded once the
//! scope is gone. Dropping the [`Scope`] cancels it, so teardown is
//! deterministic across navigations.

use tokio::sync::watch;

/// Owner side of a cancellation scope.
pub struct Scope {
    state: watch::Sender<bool>,
}

impl Scope {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// A handle for a task running under this scope.
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            state: self.state.subscribe(),
        }
    }

    /// Cancel the scope. Idempotent.
    pub fn cancel(&self) {
        let _ = self.state.send(true);
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let _ = self.state.send(true);
    }
}

/// Task-side view of a scope.
#[derive(Clone)]
pub struct ScopeHandle {
    state: watch::Receiver<bool>,
}

impl ScopeHandle {
    /// True until the owning scope is cancelled or dropped.
    ///
    /// Checked before every shared-state write; a request that resolves
    /// after teardown sees `false` and drops its result silently.
    pub fn is_live(&self) -> bool {
        !*self.state.borrow()
    }

    /// Resolves when the scope is cancelled.
    pub async fn cancelled(&mut self) {
        // An Err means the Scope was dropped, which also cancels.
        let _ = self.state.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_until_cancelled() {
        let scope = Scope::new();
        let handle = scope.handle();
        assert!(handle.is_live());

        scope.cancel();
        assert!(!handle.is_live());
    }

    #[test]
    fn drop_cancels() {
        let scope = Scope::new();
        let handle = scope.handle();
        drop(scope);
        assert!(!handle.is_live());
    }

    #[test]
    fn cancel_is_idempotent() {
        let scope = Scope::new();
        let handle = scope.handle();
        scope.cancel();
        scope.cancel();
        assert!(!handle.is_live());
    }

    #[tokio::test]
    async fn cancelled_resolves_on_cancel() {
        let scope = Scope::new();
        let mut handle = scope.handle();

        let waiter = tokio::spawn(async move {
            handle.cancelled().await;
        });

        scope.cancel();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_on_drop() {
        let scope = Scope::new();
        let mut handle = scope.handle();

        let waiter = tokio::spawn(async move {
            handle.cancelled().await;
        });

        drop(scope);
        waiter.await.unwrap();
    }
}
