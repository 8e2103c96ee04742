//! Fan-out of change events to connected clients.

use tokio::sync::broadcast;

use crate::event::ChangeEvent;

/// Default number of events buffered per slow subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Broadcasts change events to every open event stream.
#[derive(Debug, Clone)]
pub struct HmrHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl HmrHub {
    /// Create a hub buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe a new client.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Send an event; returns how many clients received it.
    pub fn send(&self, event: ChangeEvent) -> usize {
        let file = event.file.clone();
        match self.tx.send(event) {
            Ok(clients) => {
                tracing::info!(file = %file, clients, "hmr broadcast");
                clients
            }
            Err(_) => {
                tracing::debug!(file = %file, "hmr change with no clients connected");
                0
            }
        }
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_subscribers() {
        let hub = HmrHub::default();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.client_count(), 2);

        let event = ChangeEvent::new("/styles.css", "1");
        assert_eq!(hub.send(event.clone()), 2);
        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[test]
    fn test_send_without_clients() {
        let hub = HmrHub::default();
        assert_eq!(hub.send(ChangeEvent::new("/a.css", "1")), 0);
    }

    #[test]
    fn test_dropped_receiver_unsubscribes() {
        let hub = HmrHub::new(4);
        let rx = hub.subscribe();
        drop(rx);
        assert_eq!(hub.client_count(), 0);
    }
}
