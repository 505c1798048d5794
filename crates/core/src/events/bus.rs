use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ContentEvent;

/// In-process event bus backed by `tokio::broadcast`. Single node only.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<ContentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: ContentEvent) -> Result<usize, broadcast::error::SendError<ContentEvent>> {
        self.sender.send(event)
    }

    /// Publish, treating "nobody is listening" as delivery to zero receivers.
    pub fn notify(&self, event: ContentEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(_) => {
                tracing::debug!("no event subscribers");
                0
            }
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(ContentEvent::Welcome).unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ContentEvent::Welcome));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ContentEvent::Reconnect).unwrap();

        assert!(matches!(rx1.recv().await.unwrap(), ContentEvent::Reconnect));
        assert!(matches!(rx2.recv().await.unwrap(), ContentEvent::Reconnect));
    }

    #[test]
    fn notify_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(4);
        assert_eq!(bus.notify(ContentEvent::Welcome), 0);
    }
}
