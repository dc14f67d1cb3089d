// Thin gateway over the nostr-sdk relay pool
use std::sync::atomic::{AtomicBool, Ordering};

use nostr_sdk::prelude::*;
use tokio::sync::broadcast;

use crate::error::{Result, ServiceError};

/// Wrapper around the shared relay pool.
///
/// One gateway owns one pool for the life of the client; `connect` and
/// `disconnect` are both idempotent.
pub struct RelayGateway {
    client: Client,
    relays: Vec<String>,
    connected: AtomicBool,
}

/// Opaque handle to a long-lived subscription. The subscription stays
/// open past end-of-stored-events until `stop` is called or the gateway
/// disconnects.
pub struct SubscriptionHandle {
    id: SubscriptionId,
    client: Client,
}

impl SubscriptionHandle {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub async fn stop(self) {
        self.client.unsubscribe(&self.id).await;
    }
}

impl RelayGateway {
    pub fn new(relays: &[String]) -> Result<Self> {
        if relays.is_empty() {
            return Err(ServiceError::EmptyRelayList);
        }
        Ok(Self {
            client: Client::default(),
            relays: relays.to_vec(),
            connected: AtomicBool::new(false),
        })
    }

    /// Connect the pool. Repeated calls share the already-connected pool.
    pub async fn connect(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        for url in &self.relays {
            self.client
                .add_relay(url.as_str())
                .await
                .map_err(|e| ServiceError::Relay(format!("failed to add relay {url}: {e}")))?;
        }
        self.client.connect().await;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open a long-lived subscription for `filter`.
    pub async fn subscribe(&self, filter: Filter) -> Result<SubscriptionHandle> {
        if !self.is_connected() {
            return Err(ServiceError::NotConnected);
        }
        let output = self
            .client
            .subscribe(filter, None)
            .await
            .map_err(|e| ServiceError::Relay(e.to_string()))?;
        Ok(SubscriptionHandle {
            id: output.val,
            client: self.client.clone(),
        })
    }

    /// Publish a signed event; succeeds once at least one relay accepts.
    pub async fn publish(&self, event: &Event) -> Result<EventId> {
        if !self.is_connected() {
            return Err(ServiceError::NotConnected);
        }
        let output = self
            .client
            .send_event(event)
            .await
            .map_err(|e| ServiceError::Relay(e.to_string()))?;
        if output.success.is_empty() {
            return Err(ServiceError::PublishFailed);
        }
        Ok(*output.id())
    }

    /// Typed event stream shared by every subscription on the pool.
    pub fn notifications(&self) -> broadcast::Receiver<RelayPoolNotification> {
        self.client.notifications()
    }

    /// Stop all subscriptions and tear the pool down. Idempotent.
    pub async fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        self.client.unsubscribe_all().await;
        self.client.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_relay_list_fails_construction() {
        assert!(matches!(
            RelayGateway::new(&[]),
            Err(ServiceError::EmptyRelayList)
        ));
    }

    #[tokio::test]
    async fn subscribe_before_connect_fails() {
        let gateway = RelayGateway::new(&["wss://relay.mostro.network".to_string()]).unwrap();
        assert!(matches!(
            gateway.subscribe(Filter::new()).await,
            Err(ServiceError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let gateway = RelayGateway::new(&["wss://relay.mostro.network".to_string()]).unwrap();
        gateway.disconnect().await;
        gateway.disconnect().await;
        assert!(!gateway.is_connected());
    }
}
