//! Shutdown signal handling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shutdown signal (SIGINT/SIGTERM)
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Mark shutdown as requested and wake waiters
    pub fn trigger(&self) {
        trigger(&self.shutdown, &self.notify);
    }

    /// Wait until shutdown is requested
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_shutdown() {
                return;
            }
            notified.await;
        }
    }

    /// Setup signal handlers
    #[cfg(unix)]
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        use tokio::signal::unix::{signal, SignalKind};

        for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
            let mut stream = signal(kind)?;
            let shutdown = Arc::clone(&self.shutdown);
            let notify = Arc::clone(&self.notify);
            tokio::spawn(async move {
                if stream.recv().await.is_some() {
                    log::debug!("Shutdown signal received");
                    trigger(&shutdown, &notify);
                }
            });
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn setup(&self) -> Result<(), std::io::Error> {
        let shutdown = Arc::clone(&self.shutdown);
        let notify = Arc::clone(&self.notify);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::debug!("Ctrl+C received");
                trigger(&shutdown, &notify);
            }
        });
        Ok(())
    }
}

fn trigger(shutdown: &AtomicBool, notify: &Notify) {
    shutdown.store(true, Ordering::SeqCst);
    notify.notify_waiters();
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn shutdown_signal_default_is_false() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
    }

    #[tokio::test]
    async fn wait_returns_after_trigger() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn wait_after_trigger_is_immediate() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("already shut down");
    }
}
