//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcasts a single stop event to the replay server, the admin API and
/// any other long-running task that subscribed.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers that have not yet dropped their receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve when a stop is broadcast or the coordinator is dropped.
pub async fn stopped(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
