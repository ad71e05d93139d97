//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] is a cloneable latch: once triggered it stays
//! triggered, and every waiter, including ones that start waiting later,
//! completes. A [`ConnectionTracker`] counts open connections so the server
//! can wait for them to drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

/// Cloneable, idempotent shutdown latch.
///
/// ```rust
/// use stepform_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates a signal that triggers on SIGTERM or SIGINT.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }

    /// Triggers shutdown. Further calls have no effect.
    pub fn trigger(&self) {
        self.state
            .send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes when shutdown is triggered, immediately if it already was.
    pub async fn recv(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            () = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to register SIGINT handler");
                    std::future::pending::<()>().await;
                }
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to register Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }
}

#[derive(Debug, Default)]
struct Connections {
    active: AtomicUsize,
    drained: Notify,
}

/// Counts open connections.
///
/// ```rust
/// use stepform_server::shutdown::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let guard = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(guard);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    inner: Arc<Connections>,
}

impl ConnectionTracker {
    /// Creates a tracker with no open connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the returned guard is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Completes once no connection is open.
    pub async fn drained(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.active_connections() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps one connection registered with a [`ConnectionTracker`].
#[derive(Debug)]
pub struct ConnectionGuard {
    inner: Arc<Connections>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_idempotent_and_shared() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_shutdown());

        signal.trigger();
        signal.trigger();

        assert!(signal.is_shutdown());
        assert!(observer.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_wakes_on_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");
    }

    #[test]
    fn test_recv_pending_until_trigger() {
        let signal = ShutdownSignal::new();
        let mut recv = tokio_test::task::spawn(signal.recv());

        tokio_test::assert_pending!(recv.poll());
        signal.trigger();
        assert!(recv.is_woken());
        tokio_test::assert_ready!(recv.poll());
    }

    #[tokio::test]
    async fn test_recv_after_trigger_is_immediate() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[test]
    fn test_tracker_counts_guards() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_drained_without_connections() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(10), tracker.drained())
            .await
            .expect("drained should complete immediately");
    }

    #[tokio::test]
    async fn test_drained_waits_for_last_guard() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.acquire();

        let waiter = tracker.clone();
        let handle = tokio::spawn(async move { waiter.drained().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());
        drop(guard);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("drained should complete")
            .expect("task should not panic");
    }
}
