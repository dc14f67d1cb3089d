// Inbound event routing: classify, decrypt, correlate, emit
use std::sync::{Arc, RwLock};

use nostr_sdk::prelude::*;
use tokio::sync::broadcast;

use super::ClientEvent;
use crate::correlator::RequestCorrelator;
use crate::crypto;
use crate::filters::{info_from_tags, order_from_tags, OrderFilters, NOSTR_REPLACEABLE_EVENT_KIND};
use crate::keys::UserKeys;
use crate::message::Message;

pub(super) struct RouterContext {
    pub keys: Arc<RwLock<Option<UserKeys>>>,
    pub correlator: RequestCorrelator,
    pub tx: broadcast::Sender<ClientEvent>,
    pub debug: bool,
}

/// Pump the gateway's notification stream until shutdown.
///
/// For a fixed subscription the pool delivers events in relay order, so
/// routing inline here preserves that order.
pub(super) async fn run(
    mut notifications: broadcast::Receiver<RelayPoolNotification>,
    ctx: RouterContext,
) {
    let order_filter = OrderFilters {
        document_type: Some("order".to_string()),
        ..Default::default()
    };

    loop {
        match notifications.recv().await {
            Ok(RelayPoolNotification::Event { event, .. }) => {
                route_event(*event, &order_filter, &ctx);
            }
            Ok(RelayPoolNotification::Shutdown) => break,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("notification stream lagged, {skipped} events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn route_event(event: Event, order_filter: &OrderFilters, ctx: &RouterContext) {
    if event.kind == Kind::Custom(NOSTR_REPLACEABLE_EVENT_KIND) {
        // Info documents are recognized by their mostro_pubkey tag;
        // everything else goes through the order filter.
        if let Some(info) = info_from_tags(&event) {
            let _ = ctx.tx.send(ClientEvent::MostroInfo(info));
        } else if order_filter.matches(&event) {
            if let Some(order) = order_from_tags(&event) {
                let _ = ctx.tx.send(ClientEvent::OrderUpdate {
                    order,
                    event: Box::new(event),
                });
            }
        }
    } else if event.kind == Kind::EncryptedDirectMessage {
        route_dm(event, ctx);
    }
}

// Inbound failures are local: log, drop, keep the stream alive.
fn route_dm(event: Event, ctx: &RouterContext) {
    let user = ctx.keys.read().expect("keys lock poisoned").clone();
    let Some(user) = user else {
        if ctx.debug {
            log::debug!("dropping DM {}: no private key loaded", event.id);
        }
        return;
    };

    let plaintext = match crypto::decrypt_nip04(&event.content, user.keys(), &event.pubkey) {
        Ok(plaintext) => plaintext,
        Err(_) => {
            log::warn!("could not decrypt DM {}", event.id);
            return;
        }
    };
    let message = match Message::from_json(&plaintext) {
        Ok(message) => message,
        Err(_) => {
            log::warn!("could not parse DM {} as a protocol message", event.id);
            return;
        }
    };

    // A reply resolves its Mode-1 record when one is outstanding, and
    // unconditionally also tries the (action, order_id) waiters.
    if let Some(request_id) = message.request_id() {
        ctx.correlator.deliver(request_id, message.clone());
    }
    ctx.correlator.deliver_action(&message);

    let _ = ctx.tx.send(ClientEvent::Dm {
        message,
        sender: event.pubkey,
    });
}
