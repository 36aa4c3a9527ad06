//! # Interrupt Routing
//!
//! One SIGINT listener for the whole process, installed at startup and
//! forwarded over a channel. Installing before the first prompt keeps an
//! interrupt inside the process: the menu loop decides whether it means
//! "back to the menu" or "exit", and either way the session's shutdown
//! path still runs before the process ends.

use tokio::sync::mpsc;
use tracing::debug;

/// Receiver side of the process-wide interrupt signal.
pub struct InterruptListener {
    rx: mpsc::Receiver<()>,
}

impl InterruptListener {
    /// Install the SIGINT listener and return its receiver.
    ///
    /// The forwarding task holds the signal registration for the life of
    /// the process; interrupts arriving while nobody is waiting coalesce
    /// into the single buffered slot.
    #[must_use]
    pub fn install() -> Self {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received");
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }

    /// A listener fed by a plain channel instead of the signal handler.
    #[must_use]
    pub fn from_channel(rx: mpsc::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Wait for the next interrupt. A closed channel counts as one, so a
    /// dead forwarding task can never wedge the console.
    pub async fn next(&mut self) {
        let _ = self.rx.recv().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_next_completes_per_interrupt() {
        let (tx, rx) = mpsc::channel(1);
        let mut listener = InterruptListener::from_channel(rx);

        tx.send(()).await.unwrap();
        timeout(Duration::from_secs(1), listener.next())
            .await
            .expect("interrupt not delivered");
    }

    #[tokio::test]
    async fn test_closed_channel_counts_as_interrupt() {
        let (tx, rx) = mpsc::channel::<()>(1);
        let mut listener = InterruptListener::from_channel(rx);
        drop(tx);

        timeout(Duration::from_secs(1), listener.next())
            .await
            .expect("closed channel should release the waiter");
    }
}
