// Filter creation and tag projection for Nostr order documents
use std::collections::HashMap;
use std::str::FromStr;

use nostr_sdk::prelude::*;

use crate::error::Result;
use crate::keys::parse_public_key;
use crate::order::{MostroInfo, Order, OrderKind, Status};

/// Parameterized-replaceable kind used for Mostro order and info documents.
pub const NOSTR_REPLACEABLE_EVENT_KIND: u16 = 38383;

/// How far back the standing order subscription looks.
pub const ORDER_LOOKBACK_DAYS: i64 = 14;

/// Structured predicate over a kind-38383 event's tag set.
///
/// A missing field imposes no constraint. `authors` is not matched
/// against tags; it becomes the relay-side `authors` filter.
#[derive(Debug, Clone, Default)]
pub struct OrderFilters {
    pub document_type: Option<String>,
    pub order_type: Option<OrderKind>,
    pub currency: Option<String>,
    pub status: Option<Status>,
    pub platform: Option<String>,
    pub payment_methods: Vec<String>,
    pub authors: Vec<String>,
}

impl OrderFilters {
    /// True iff every set field is satisfied by the corresponding tag.
    pub fn matches(&self, event: &Event) -> bool {
        let tags = tag_map(event);
        let first = |key: &str| tags.get(key).and_then(|v| v.first()).map(String::as_str);

        if let Some(doc) = &self.document_type {
            if first("z") != Some(doc.as_str()) {
                return false;
            }
        }
        if let Some(kind) = self.order_type {
            if first("k").and_then(|v| OrderKind::from_str(v).ok()) != Some(kind) {
                return false;
            }
        }
        if let Some(currency) = &self.currency {
            if first("f") != Some(currency.to_uppercase().as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if first("s").and_then(|v| Status::from_str(v).ok()) != Some(status) {
                return false;
            }
        }
        if let Some(platform) = &self.platform {
            if first("y") != Some(platform.as_str()) {
                return false;
            }
        }
        if !self.payment_methods.is_empty() {
            // Comma-split the tag value; case-insensitive on both sides.
            let advertised: Vec<String> = tags
                .get("pm")
                .map(|values| {
                    values
                        .iter()
                        .flat_map(|v| v.split(','))
                        .map(|m| m.trim().to_lowercase())
                        .collect()
                })
                .unwrap_or_default();
            let mut wanted = self
                .payment_methods
                .iter()
                .map(|m| m.trim().to_lowercase());
            if !wanted.any(|m| advertised.contains(&m)) {
                return false;
            }
        }
        true
    }

    /// Relay-side filter for this predicate: kind 38383 plus `authors`.
    pub fn to_relay_filter(&self) -> Result<Filter> {
        let mut filter = Filter::new().kind(Kind::Custom(NOSTR_REPLACEABLE_EVENT_KIND));
        if !self.authors.is_empty() {
            let mut authors = Vec::with_capacity(self.authors.len());
            for author in &self.authors {
                authors.push(parse_public_key(author)?);
            }
            filter = filter.authors(authors);
        }
        Ok(filter)
    }
}

/// Project an order out of a matched event's tags.
///
/// Events missing the mandatory `d` or `k` tags are not orders; the
/// caller drops them without reporting an error.
pub fn order_from_tags(event: &Event) -> Option<Order> {
    let mut order = Order::default();

    for tag in event.tags.iter() {
        let t = tag.as_slice();
        if t.len() < 2 {
            continue;
        }
        let values = &t[1..];
        let v = values[0].as_str();

        match t[0].as_str() {
            "d" => {
                order.id = Some(v.to_string());
            }
            "k" => {
                order.kind = OrderKind::from_str(v).ok();
            }
            "s" => {
                order.status = Status::from_str(v).ok().or(Some(Status::Pending));
            }
            "f" => {
                order.fiat_code = v.to_string();
            }
            "fa" => {
                if v.contains('.') {
                    continue;
                }
                if let Some(range) = parse_fiat_range(v, values.get(1)) {
                    (order.fiat_amount, order.min_amount, order.max_amount) = range;
                }
            }
            "amt" => {
                order.amount = v.parse::<i64>().unwrap_or(0);
            }
            "pm" => {
                order.payment_method = values.join(",");
            }
            "premium" => {
                order.premium = v.parse::<i64>().unwrap_or(0);
            }
            "y" => {
                order.platform = Some(v.to_string());
            }
            _ => {}
        }
    }

    order.id.as_ref()?;
    order.kind?;
    order.created_at = Some(event.created_at.as_u64() as i64);
    Some(order)
}

// A ranged fiat amount arrives either as two tag values or as "min-max".
fn parse_fiat_range(v: &str, second: Option<&String>) -> Option<(i64, Option<i64>, Option<i64>)> {
    if let Some(max) = second {
        return Some((0, v.parse().ok(), max.parse().ok()));
    }
    if let Some((min, max)) = v.split_once('-') {
        if let (Ok(min), Ok(max)) = (min.parse(), max.parse()) {
            return Some((0, Some(min), Some(max)));
        }
    }
    v.parse().ok().map(|fa| (fa, None, None))
}

/// Project a Mostro instance document; shape is recognized by the
/// presence of the `mostro_pubkey` tag.
pub fn info_from_tags(event: &Event) -> Option<MostroInfo> {
    let tags = tag_map(event);
    let first = |key: &str| tags.get(key).and_then(|v| v.first()).map(String::as_str);

    let mut info = MostroInfo {
        mostro_pubkey: first("mostro_pubkey")?.to_string(),
        ..Default::default()
    };
    info.mostro_version = first("mostro_version").map(str::to_string);
    info.mostro_commit_id = first("mostro_commit_id").map(str::to_string);
    let int = |key: &str, fallback: i64| {
        first(key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(fallback)
    };
    info.max_order_amount = int("max_order_amount", 0);
    info.min_order_amount = int("min_order_amount", 0);
    info.expiration_hours = int("expiration_hours", 24);
    info.expiration_seconds = int("expiration_seconds", 900);
    info.fee = first("fee")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);
    info.hold_invoice_expiration_window = int("hold_invoice_expiration_window", 120);
    info.invoice_expiration_window = int("invoice_expiration_window", 120);
    Some(info)
}

/// Standing subscription for one Mostro author's documents over the
/// last `ORDER_LOOKBACK_DAYS`.
pub fn create_order_feed_filter(author: PublicKey) -> Filter {
    let since = chrono::Utc::now()
        .checked_sub_signed(chrono::Duration::days(ORDER_LOOKBACK_DAYS))
        .map(|t| t.timestamp() as u64)
        .unwrap_or(0);
    Filter::new()
        .author(author)
        .kind(Kind::Custom(NOSTR_REPLACEABLE_EVENT_KIND))
        .since(Timestamp::from(since))
}

/// Inbound legacy DMs addressed to us, from now onward.
pub fn create_dm_filter(recipient: PublicKey) -> Filter {
    Filter::new()
        .pubkey(recipient)
        .kind(Kind::EncryptedDirectMessage)
        .since(Timestamp::now())
}

fn tag_map(event: &Event) -> HashMap<&str, &[String]> {
    let mut map: HashMap<&str, &[String]> = HashMap::new();
    for tag in event.tags.iter() {
        let t = tag.as_slice();
        if t.len() >= 2 {
            map.entry(t[0].as_str()).or_insert(&t[1..]);
        }
    }
    map
}
