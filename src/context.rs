//! Lifetime of one network call.

use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};

/// Cancellation scope for one call.
///
/// Cancelled explicitly (header timeout, stream end, consumer gone) or by the
/// lifetime deadline, whichever comes first. Every task touching the
/// connection observes the same token.
#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
}

impl CallContext {
    /// Create a context that cancels itself once `lifetime` has elapsed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_lifetime(lifetime: Duration) -> Self {
        let token = CancellationToken::new();
        let watchdog = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = watchdog.cancelled() => {}
                () = tokio::time::sleep(lifetime) => {
                    tracing::debug!(?lifetime, "call lifetime elapsed");
                    watchdog.cancel();
                }
            }
        });
        Self { token }
    }

    /// Cancel the call. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the call is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A guard that cancels the call when dropped.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_lifetime_cancels() {
        let ctx = CallContext::with_lifetime(Duration::from_secs(120));
        assert!(!ctx.is_cancelled());

        tokio::time::sleep(Duration::from_secs(119)).await;
        assert!(!ctx.is_cancelled());

        tokio::time::timeout(Duration::from_secs(2), ctx.cancelled())
            .await
            .expect("lifetime deadline should cancel the context");
    }

    #[tokio::test]
    async fn test_drop_guard_cancels() {
        let ctx = CallContext::with_lifetime(Duration::from_secs(120));
        let guard = ctx.drop_guard();
        drop(guard);
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_disarmed_guard_does_not_cancel() {
        let ctx = CallContext::with_lifetime(Duration::from_secs(120));
        let _token = ctx.drop_guard().disarm();
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }
}
