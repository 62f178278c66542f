use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use enact_core_types::WindowId;

use crate::protocol::{FrameEnvelope, FrameMessage};

/// Transport seam between one document and the others it talks to.
///
/// Delivery is fire and forget, like window messaging: there is no retry
/// and no acknowledgement beyond the existence ping.
#[async_trait]
pub trait FrameChannel: Send + Sync {
    /// Deliver `message` to the document in `to`.
    async fn send(&self, to: &WindowId, message: FrameMessage);

    /// Messages arriving at this endpoint, in delivery order.
    fn incoming(&self) -> broadcast::Receiver<FrameEnvelope>;

    /// Probe whether the document in `window` answers within `timeout`.
    async fn ping(&self, window: &WindowId, timeout: Duration) -> bool;
}

#[cfg(feature = "stub")]
pub use stub_channel::{InMemoryFrameChannel, InMemoryFrameNetwork};

#[cfg(feature = "stub")]
mod stub_channel {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use dashmap::{DashMap, DashSet};
    use tokio::sync::broadcast;
    use tokio::time::sleep;
    use tracing::debug;

    use enact_core_types::WindowId;
    use enact_event_bus::{EventBus, InMemoryBus};

    use crate::channel::FrameChannel;
    use crate::protocol::{FrameEnvelope, FrameMessage};

    /// In-process message fabric. Each window gets one endpoint; whatever
    /// one endpoint sends shows up on the destination's incoming stream.
    pub struct InMemoryFrameNetwork {
        endpoints: DashMap<WindowId, Arc<InMemoryBus<FrameEnvelope>>>,
        ping_delays: DashMap<WindowId, Duration>,
        silent: DashSet<WindowId>,
    }

    impl InMemoryFrameNetwork {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                endpoints: DashMap::new(),
                ping_delays: DashMap::new(),
                silent: DashSet::new(),
            })
        }

        /// Create (or fetch) the endpoint owned by `window`.
        pub fn endpoint(self: &Arc<Self>, window: &WindowId) -> Arc<InMemoryFrameChannel> {
            let bus = self
                .endpoints
                .entry(window.clone())
                .or_insert_with(|| InMemoryBus::new(64))
                .clone();
            Arc::new(InMemoryFrameChannel {
                window: window.clone(),
                network: self.clone(),
                bus,
            })
        }

        /// Make pings to `window` take `delay` before answering.
        pub fn set_ping_delay(&self, window: &WindowId, delay: Duration) {
            self.ping_delays.insert(window.clone(), delay);
        }

        /// Make `window` stop answering pings, as a never-loading document
        /// would.
        pub fn silence(&self, window: &WindowId) {
            self.silent.insert(window.clone());
        }
    }

    /// One window's side of the in-memory fabric.
    pub struct InMemoryFrameChannel {
        window: WindowId,
        network: Arc<InMemoryFrameNetwork>,
        bus: Arc<InMemoryBus<FrameEnvelope>>,
    }

    #[async_trait]
    impl FrameChannel for InMemoryFrameChannel {
        async fn send(&self, to: &WindowId, message: FrameMessage) {
            match self.network.endpoints.get(to) {
                Some(bus) => bus.publish_lossy(FrameEnvelope {
                    from: self.window.clone(),
                    message,
                }),
                None => debug!(window = %to, "message to unknown window dropped"),
            }
        }

        fn incoming(&self) -> broadcast::Receiver<FrameEnvelope> {
            self.bus.subscribe()
        }

        async fn ping(&self, window: &WindowId, timeout: Duration) -> bool {
            let reachable = self.network.endpoints.contains_key(window)
                && !self.network.silent.contains(window);
            if !reachable {
                sleep(timeout).await;
                return false;
            }
            let delay = self
                .network
                .ping_delays
                .get(window)
                .map(|d| *d)
                .unwrap_or(Duration::ZERO);
            if delay >= timeout {
                sleep(timeout).await;
                return false;
            }
            sleep(delay).await;
            true
        }
    }
}
