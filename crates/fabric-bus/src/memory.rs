//! # In-Memory Fabric
//!
//! An in-process `BusGateway` used by tests and the console's demo mode.
//! Events flow through a single delivery task, so delivery order matches
//! publish order for every topic. Requests are answered by service handlers
//! registered on the fabric, standing in for the remote services a real
//! broker would route to.

use crate::gateway::{BusGateway, EventHandler, ServiceHandler};
use async_trait::async_trait;
use fabric_types::{ConnectionError, QueryError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::DEFAULT_CHANNEL_CAPACITY;

/// Connection lifecycle states.
const STATE_IDLE: u8 = 0;
const STATE_CONNECTED: u8 = 1;
const STATE_DISCONNECTED: u8 = 2;

enum DeliveryItem {
    Event { topic: String, payload: Vec<u8> },
    Shutdown,
}

/// In-process fabric with ordered per-topic delivery and a service registry.
pub struct InMemoryFabric {
    /// Registered event handlers by topic.
    handlers: Arc<RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>>,

    /// Registered request/response services by service id.
    services: RwLock<HashMap<String, Arc<dyn ServiceHandler>>>,

    /// Sender feeding the delivery task.
    delivery_tx: mpsc::Sender<DeliveryItem>,

    /// Receiver handed to the delivery task on connect.
    delivery_rx: Mutex<Option<mpsc::Receiver<DeliveryItem>>>,

    /// Connection lifecycle state.
    state: AtomicU8,

    /// Total events accepted for delivery.
    events_published: AtomicU64,

    /// Total requests routed to services.
    requests_served: AtomicU64,

    /// Times the connection was actually released.
    disconnects: AtomicU64,
}

impl InMemoryFabric {
    /// Create a new fabric with default delivery capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new fabric with a specific delivery queue capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (delivery_tx, delivery_rx) = mpsc::channel(capacity);
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            services: RwLock::new(HashMap::new()),
            delivery_tx,
            delivery_rx: Mutex::new(Some(delivery_rx)),
            state: AtomicU8::new(STATE_IDLE),
            events_published: AtomicU64::new(0),
            requests_served: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
        }
    }

    /// Register a service that answers requests on this fabric.
    ///
    /// Registration is allowed before `connect` so demo/test fixtures can be
    /// wired up ahead of the session.
    pub fn register_service(&self, service: &str, handler: Arc<dyn ServiceHandler>) {
        if let Ok(mut services) = self.services.write() {
            services.insert(service.to_string(), handler);
        }
    }

    /// Publish an event to a topic. Handlers run on the delivery task.
    pub async fn publish_event(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<(), ConnectionError> {
        if self.state.load(Ordering::Acquire) != STATE_CONNECTED {
            return Err(ConnectionError::NotConnected);
        }

        self.events_published.fetch_add(1, Ordering::Relaxed);

        let item = DeliveryItem::Event {
            topic: topic.to_string(),
            payload,
        };
        if self.delivery_tx.send(item).await.is_err() {
            warn!(topic = %topic, "Event dropped (delivery task gone)");
        }
        Ok(())
    }

    /// Number of handlers registered for a topic.
    #[must_use]
    pub fn handler_count(&self, topic: &str) -> usize {
        self.handlers
            .read()
            .map(|h| h.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Total events accepted for delivery.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Total requests routed to services.
    #[must_use]
    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    /// Times the connection was released. Never more than one.
    #[must_use]
    pub fn disconnect_count(&self) -> u64 {
        self.disconnects.load(Ordering::Relaxed)
    }

    /// Whether the gateway is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CONNECTED
    }

}

impl Default for InMemoryFabric {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusGateway for InMemoryFabric {
    async fn connect(&self) -> Result<(), ConnectionError> {
        let swapped = self.state.compare_exchange(
            STATE_IDLE,
            STATE_CONNECTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if swapped.is_err() {
            return Err(ConnectionError::AlreadyConnected);
        }

        let receiver = {
            let mut slot = self
                .delivery_rx
                .lock()
                .map_err(|_| ConnectionError::Unreachable("delivery state poisoned".into()))?;
            slot.take()
        };
        let Some(mut rx) = receiver else {
            return Err(ConnectionError::Unreachable(
                "delivery task already started".into(),
            ));
        };

        let handlers = self.handlers.clone();
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                match item {
                    DeliveryItem::Event { topic, payload } => {
                        let targets: Vec<Arc<dyn EventHandler>> = handlers
                            .read()
                            .map(|h| h.get(&topic).cloned().unwrap_or_default())
                            .unwrap_or_default();
                        debug!(topic = %topic, handlers = targets.len(), "Delivering event");
                        for handler in targets {
                            handler.handle(&topic, &payload);
                        }
                    }
                    DeliveryItem::Shutdown => break,
                }
            }
            debug!("Delivery task stopped");
        });

        debug!("Connected to in-memory fabric");
        Ok(())
    }

    async fn disconnect(&self) {
        let swapped = self.state.compare_exchange(
            STATE_CONNECTED,
            STATE_DISCONNECTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if swapped.is_err() {
            // Idempotent: already released or never connected.
            return;
        }

        self.disconnects.fetch_add(1, Ordering::Relaxed);
        let _ = self.delivery_tx.send(DeliveryItem::Shutdown).await;
        debug!("Disconnected from in-memory fabric");
    }

    fn subscribe_event(
        &self,
        topic: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ConnectionError> {
        if self.state.load(Ordering::Acquire) != STATE_CONNECTED {
            return Err(ConnectionError::NotConnected);
        }
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.entry(topic.to_string()).or_default().push(handler);
        }
        debug!(topic = %topic, "Handler registered");
        Ok(())
    }

    async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, QueryError> {
        if self.state.load(Ordering::Acquire) != STATE_CONNECTED {
            return Err(QueryError::ServiceFailure {
                service: service.to_string(),
                operation: operation.to_string(),
                message: "not connected".to_string(),
            });
        }

        let handler = self
            .services
            .read()
            .ok()
            .and_then(|s| s.get(service).cloned())
            .ok_or_else(|| QueryError::UnknownService(service.to_string()))?;

        let correlation_id = Uuid::new_v4();
        debug!(
            correlation_id = %correlation_id,
            service = %service,
            operation = %operation,
            "Issuing request"
        );

        self.requests_served.fetch_add(1, Ordering::Relaxed);

        handler
            .invoke(operation, &params)
            .map_err(|e| QueryError::ServiceFailure {
                service: service.to_string(),
                operation: operation.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ServiceError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::timeout;

    struct CountingHandler {
        seen: AtomicUsize,
    }

    impl EventHandler for CountingHandler {
        fn handle(&self, _topic: &str, _payload: &[u8]) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_connect_once() {
        let fabric = InMemoryFabric::new();
        fabric.connect().await.unwrap();
        assert_eq!(
            fabric.connect().await,
            Err(ConnectionError::AlreadyConnected)
        );
    }

    #[tokio::test]
    async fn test_disconnect_idempotent() {
        let fabric = InMemoryFabric::new();
        fabric.connect().await.unwrap();
        fabric.disconnect().await;
        fabric.disconnect().await;
        fabric.disconnect().await;
        assert_eq!(fabric.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let fabric = InMemoryFabric::new();
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
        });
        assert_eq!(
            fabric.subscribe_event("/t", handler),
            Err(ConnectionError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_event_delivery() {
        let fabric = InMemoryFabric::new();
        fabric.connect().await.unwrap();

        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
        });
        fabric.subscribe_event("/t", handler.clone()).unwrap();

        fabric.publish_event("/t", b"one".to_vec()).await.unwrap();
        fabric.publish_event("/t", b"two".to_vec()).await.unwrap();
        fabric.publish_event("/other", b"x".to_vec()).await.unwrap();

        timeout(Duration::from_secs(1), async {
            while handler.seen.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("delivery timed out");

        // The /other event never reaches the /t handler.
        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
        assert_eq!(fabric.events_published(), 3);
    }

    #[tokio::test]
    async fn test_request_routing() {
        let fabric = InMemoryFabric::new();
        fabric.register_service(
            "echo",
            Arc::new(|op: &str, params: &Value| {
                Ok::<Value, ServiceError>(json!({ "operation": op, "params": params }))
            }),
        );
        fabric.connect().await.unwrap();

        let response = fabric
            .request("echo", "ping", json!({"n": 1}))
            .await
            .unwrap();
        assert_eq!(response["operation"], "ping");
        assert_eq!(response["params"]["n"], 1);
        assert_eq!(fabric.requests_served(), 1);
    }

    #[tokio::test]
    async fn test_request_unknown_service() {
        let fabric = InMemoryFabric::new();
        fabric.connect().await.unwrap();
        let err = fabric.request("nope", "op", json!({})).await.unwrap_err();
        assert_eq!(err, QueryError::UnknownService("nope".to_string()));
    }

    #[tokio::test]
    async fn test_request_service_error_maps() {
        let fabric = InMemoryFabric::new();
        fabric.register_service(
            "flaky",
            Arc::new(|_: &str, _: &Value| {
                Err::<Value, _>(ServiceError::new(-1, "backend down"))
            }),
        );
        fabric.connect().await.unwrap();

        let err = fabric.request("flaky", "op", json!({})).await.unwrap_err();
        assert!(matches!(err, QueryError::ServiceFailure { .. }));
        assert!(err.to_string().contains("backend down"));
    }
}
