// Order book records and Mostro instance metadata
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Direction of an order from the maker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Buy,
    Sell,
}

impl FromStr for OrderKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(ServiceError::MalformedMessage),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order lifecycle status as published in the `s` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    WaitingBuyerInvoice,
    WaitingSellerToPay,
    Active,
    InProgress,
    FiatSent,
    Success,
    Canceled,
    CooperativelyCanceled,
    InDispute,
    Expired,
}

impl Status {
    /// Terminal statuses destroy the order on the client side.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Canceled | Self::CooperativelyCanceled | Self::Expired
        )
    }
}

impl FromStr for Status {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| ServiceError::MalformedMessage)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => write!(f, "{s}"),
            _ => Err(fmt::Error),
        }
    }
}

/// An order as projected from a kind-38383 event's tags, or as carried
/// inside a protocol message.
///
/// `amount = 0` encodes "market price". A ranged fiat amount uses
/// `min_amount`/`max_amount` with `fiat_amount = 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<OrderKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub amount: i64,
    pub fiat_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<i64>,
    pub fiat_amount: i64,
    pub payment_method: String,
    #[serde(default)]
    pub premium: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Order {
    /// Fill submission defaults and validate amounts.
    ///
    /// `created_at` defaults to now and `status` to pending; negative
    /// amounts are rejected before anything touches the wire.
    pub fn normalize(&mut self) -> Result<()> {
        if self.amount < 0 || self.fiat_amount < 0 {
            return Err(ServiceError::InvalidAmount);
        }
        if self.min_amount.is_some_and(|m| m < 0) || self.max_amount.is_some_and(|m| m < 0) {
            return Err(ServiceError::InvalidAmount);
        }
        self.status.get_or_insert(Status::Pending);
        self.created_at
            .get_or_insert_with(|| chrono::Utc::now().timestamp());
        Ok(())
    }
}

/// Configuration document published by a Mostro instance (kind 38383,
/// `z` tag `info`). Missing tags fall back to the protocol defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostroInfo {
    pub mostro_pubkey: String,
    pub mostro_version: Option<String>,
    pub mostro_commit_id: Option<String>,
    pub max_order_amount: i64,
    pub min_order_amount: i64,
    pub expiration_hours: i64,
    pub expiration_seconds: i64,
    pub fee: f64,
    pub hold_invoice_expiration_window: i64,
    pub invoice_expiration_window: i64,
}

impl Default for MostroInfo {
    fn default() -> Self {
        Self {
            mostro_pubkey: String::new(),
            mostro_version: None,
            mostro_commit_id: None,
            max_order_amount: 0,
            min_order_amount: 0,
            expiration_hours: 24,
            expiration_seconds: 900,
            fee: 0.0,
            hold_invoice_expiration_window: 120,
            invoice_expiration_window: 120,
        }
    }
}

/// Reputation counters for a traded-with peer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub total_reviews: u64,
    pub total_rating: f64,
    pub last_rating: u8,
    pub max_rate: u8,
    pub min_rate: u8,
}

impl Rating {
    /// Average over all reviews, `0` when there are none.
    pub fn average(&self) -> f64 {
        if self.total_reviews == 0 {
            0.0
        } else {
            self.total_rating / self.total_reviews as f64
        }
    }

    /// Fold one review into the counters, keeping
    /// `min_rate <= last_rating <= max_rate`.
    pub fn add_review(&mut self, value: u8) {
        if self.total_reviews == 0 {
            self.min_rate = value;
            self.max_rate = value;
        } else {
            self.min_rate = self.min_rate.min(value);
            self.max_rate = self.max_rate.max(value);
        }
        self.last_rating = value;
        self.total_reviews += 1;
        self.total_rating += f64::from(value);
    }
}
