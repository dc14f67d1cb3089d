// Client orchestrator: owns the gateway, keys, and correlation state
mod actions;
mod router;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use nostr_sdk::prelude::*;
use tokio::sync::broadcast;

use crate::correlator::{PendingReply, RequestCorrelator};
use crate::error::{Result, ServiceError};
use crate::filters::{
    create_dm_filter, create_order_feed_filter, order_from_tags, OrderFilters,
};
use crate::keys::{parse_public_key, KeyEncoding, UserKeys};
use crate::message::{Action, Message};
use crate::order::{MostroInfo, Order};
use crate::relay::RelayGateway;
use crate::settings::Settings;

/// Default wait for a Mode-1 reply to a trade action.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Accumulation window for a one-shot order search.
pub const SEARCH_WINDOW: Duration = Duration::from_secs(5);

/// Events surfaced on the client's broadcast channel.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A (re-)published order document matched the order filter.
    OrderUpdate {
        order: Order,
        event: Box<Event>,
    },
    /// A Mostro instance published its configuration document.
    MostroInfo(MostroInfo),
    /// Any decrypted inbound DM, including replies already routed to a
    /// waiter and late replies whose record timed out.
    Dm {
        message: Message,
        sender: PublicKey,
    },
}

/// Handle to one Mostro client session.
///
/// The caller owns the value; teardown is explicit via [`disconnect`]
/// and is idempotent.
///
/// [`disconnect`]: MostroClient::disconnect
pub struct MostroClient {
    keys: Arc<RwLock<Option<UserKeys>>>,
    mostro_pubkey: Option<PublicKey>,
    gateway: RelayGateway,
    correlator: RequestCorrelator,
    tx: broadcast::Sender<ClientEvent>,
    debug: bool,
}

impl MostroClient {
    /// Connect to the configured relays and start routing events.
    ///
    /// With a `mostro_pubkey`, subscribes to that author's kind-38383
    /// documents over the last 14 days; with a `private_key`, subscribes
    /// to inbound kind-4 DMs addressed to us from now onward.
    pub async fn connect(settings: Settings) -> Result<(Self, broadcast::Receiver<ClientEvent>)> {
        let user_keys = settings
            .private_key
            .as_deref()
            .map(UserKeys::parse)
            .transpose()?;
        let mostro_pubkey = settings
            .mostro_pubkey
            .as_deref()
            .map(parse_public_key)
            .transpose()?;

        let gateway = RelayGateway::new(&settings.relays)?;
        gateway.connect().await?;

        // Open the notification stream before subscribing so the router
        // cannot miss early events.
        let notifications = gateway.notifications();

        if let Some(author) = mostro_pubkey {
            gateway.subscribe(create_order_feed_filter(author)).await?;
        }
        if let Some(keys) = &user_keys {
            gateway.subscribe(create_dm_filter(keys.public_key())).await?;
        }

        let keys = Arc::new(RwLock::new(user_keys));
        let correlator = RequestCorrelator::new();
        let (tx, rx) = broadcast::channel(256);

        tokio::spawn(router::run(
            notifications,
            router::RouterContext {
                keys: Arc::clone(&keys),
                correlator: correlator.clone(),
                tx: tx.clone(),
                debug: settings.debug,
            },
        ));

        Ok((
            Self {
                keys,
                mostro_pubkey,
                gateway,
                correlator,
                tx,
                debug: settings.debug,
            },
            rx,
        ))
    }

    /// Get an additional receiver for client events.
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// The loaded key's public half, hex or npub encoded.
    pub fn public_key(&self, encoding: KeyEncoding) -> Result<String> {
        self.keys
            .read()
            .expect("keys lock poisoned")
            .as_ref()
            .ok_or(ServiceError::KeyNotSet)?
            .encoded_public_key(encoding)
    }

    /// One-shot order search: subscribe, accumulate matches for
    /// [`SEARCH_WINDOW`], stop the subscription and return the set.
    /// Replaceable re-publications collapse to the latest per id.
    pub async fn search_orders(&self, filters: &OrderFilters) -> Result<Vec<Order>> {
        let mut notifications = self.gateway.notifications();
        let subscription = self.gateway.subscribe(filters.to_relay_filter()?).await?;
        let mut latest: HashMap<String, Order> = HashMap::new();

        let _ = tokio::time::timeout(SEARCH_WINDOW, async {
            loop {
                match notifications.recv().await {
                    Ok(RelayPoolNotification::Event {
                        subscription_id,
                        event,
                        ..
                    }) => {
                        if subscription_id != *subscription.id() || !filters.matches(&event) {
                            continue;
                        }
                        let Some(order) = order_from_tags(&event) else {
                            continue;
                        };
                        let Some(id) = order.id.clone() else {
                            continue;
                        };
                        match latest.entry(id) {
                            Entry::Occupied(mut slot) => {
                                if order.created_at >= slot.get().created_at {
                                    slot.insert(order);
                                }
                            }
                            Entry::Vacant(slot) => {
                                slot.insert(order);
                            }
                        }
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
        .await;

        subscription.stop().await;
        Ok(latest.into_values().collect())
    }

    /// Wait for a server-initiated lifecycle message keyed on
    /// `(action, order_id)`.
    pub fn await_action(&self, action: Action, order_id: &str, timeout: Duration) -> PendingReply {
        self.correlator.await_action(action, order_id, timeout)
    }

    /// Replace the loaded private key.
    ///
    /// Every outstanding waiter fails with `Disconnected` before the
    /// swap; inbound DMs are then followed on the new key.
    pub async fn update_private_key(&self, private_key: &str) -> Result<()> {
        let new_keys = UserKeys::parse(private_key)?;
        let pubkey = new_keys.public_key();
        self.correlator.disconnect_all();
        *self.keys.write().expect("keys lock poisoned") = Some(new_keys);
        self.gateway.subscribe(create_dm_filter(pubkey)).await?;
        Ok(())
    }

    /// Stop every subscription, fail all outstanding waiters with
    /// `Disconnected`, and tear the pool down. Idempotent.
    pub async fn disconnect(&self) {
        self.gateway.disconnect().await;
        self.correlator.disconnect_all();
    }
}
