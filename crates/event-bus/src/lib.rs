//! Broadcast bus carrying runner, dialog and page-lifecycle events.
//!
//! The engine publishes; any number of observers subscribe. Delivery is
//! fan-out without replay: a subscriber only sees events published after it
//! subscribed, which matches how the reference runner's event emitter behaves.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

#[derive(Debug, Error)]
pub enum BusError {
    /// Every receiver is gone; the event was dropped.
    #[error("event bus has no subscribers")]
    NoSubscribers,
}

#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<(), BusError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-memory bus backed by a tokio broadcast channel.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Publish without caring whether anyone listens. Runner notifications
    /// are advisory; a run with no observers is still a valid run.
    pub fn publish_lossy(&self, event: E) {
        if self.sender.send(event).is_err() {
            debug!("event dropped: no subscribers");
        }
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<(), BusError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| BusError::NoSubscribers)
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Materialise an mpsc receiver from a bus subscription so callers can await
/// events without handling broadcast lag semantics directly.
pub fn to_mpsc<E>(bus: Arc<InMemoryBus<E>>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        while let Ok(ev) = rx.recv().await {
            if tx.send(ev).await.is_err() {
                break;
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Ping {
        One,
        Two,
    }

    #[tokio::test]
    async fn subscribers_see_events_published_after_subscribing() {
        let bus = InMemoryBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Ping::One).await.unwrap();
        bus.publish(Ping::Two).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Ping::One);
        assert_eq!(rx.recv().await.unwrap(), Ping::Two);
    }

    #[tokio::test]
    async fn publish_without_subscribers_reports_and_lossy_does_not() {
        let bus = InMemoryBus::new(8);
        assert!(bus.publish(Ping::One).await.is_err());
        bus.publish_lossy(Ping::Two);
    }

    #[tokio::test]
    async fn mpsc_materialiser_forwards_in_order() {
        let bus = InMemoryBus::new(8);
        let mut rx = to_mpsc(bus.clone(), 8);
        // Give the forwarding task a chance to subscribe before publishing.
        tokio::task::yield_now().await;
        bus.publish_lossy(Ping::One);
        bus.publish_lossy(Ping::Two);
        assert_eq!(rx.recv().await.unwrap(), Ping::One);
        assert_eq!(rx.recv().await.unwrap(), Ping::Two);
    }
}
