// Wire format of the encrypted Mostro protocol messages
use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, ServiceError};
use crate::order::Order;

/// Protocol version carried by every message.
pub const PROTOCOL_VERSION: u8 = 1;

/// Closed action set of the deployed protocol.
///
/// Unknown actions deserialize into `Unknown` instead of failing, so a
/// newer Mostro cannot break the inbound pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    NewOrder,
    TakeSell,
    TakeBuy,
    PayInvoice,
    AddInvoice,
    FiatSent,
    FiatSentOk,
    Release,
    Released,
    Cancel,
    Canceled,
    WaitingBuyerInvoice,
    WaitingSellerToPay,
    BuyerTookOrder,
    HoldInvoicePaymentAccepted,
    HoldInvoicePaymentSettled,
    HoldInvoicePaymentCanceled,
    CooperativeCancelInitiatedByYou,
    CooperativeCancelInitiatedByPeer,
    CooperativeCancelAccepted,
    Rate,
    RateUser,
    RateReceived,
    Dispute,
    DisputeInitiatedByYou,
    DisputeInitiatedByPeer,
    CantDo,
    OutOfRangeFiatAmount,
    IsNotYourDispute,
    NotFound,
    IncorrectInvoiceAmount,
    InvalidSatsAmount,
    OutOfRangeSatsAmount,
    PaymentFailed,
    InvoiceUpdated,
    #[serde(untagged)]
    Unknown(String),
}

impl FromStr for Action {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| ServiceError::MalformedMessage)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => write!(f, "{s}"),
            _ => Err(fmt::Error),
        }
    }
}

/// Counterparty identity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub pubkey: String,
}

/// Dispute handle with the per-side access tokens Mostro hands out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeTokens {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_token: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_token: Option<u16>,
}

/// On-wire `payment_request` tuple: `[order|null, invoice, amount?]`.
///
/// The trailing amount is omitted entirely when absent, producing a
/// two-element array. A parallel object form exists in older clients but
/// never appears on the wire, so only the tuple is implemented.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub order: Option<Order>,
    pub invoice: String,
    pub amount: Option<i64>,
}

impl Serialize for PaymentRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.amount.is_some() { 3 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.order)?;
        seq.serialize_element(&self.invoice)?;
        if let Some(amount) = self.amount {
            seq.serialize_element(&amount)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PaymentRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let elements = Vec::<serde_json::Value>::deserialize(deserializer)?;
        if elements.len() < 2 || elements.len() > 3 {
            return Err(D::Error::custom("payment_request expects 2 or 3 elements"));
        }
        let order = serde_json::from_value(elements[0].clone()).map_err(D::Error::custom)?;
        let invoice = serde_json::from_value(elements[1].clone()).map_err(D::Error::custom)?;
        let amount = match elements.get(2) {
            Some(v) => serde_json::from_value(v.clone()).map_err(D::Error::custom)?,
            None => None,
        };
        Ok(Self {
            order,
            invoice,
            amount,
        })
    }
}

/// Heterogeneous `content` union, discriminated by which key is present.
///
/// `Raw` is the forward-compatibility escape hatch for shapes this
/// version does not know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Order { order: Order },
    PaymentRequest { payment_request: PaymentRequest },
    Amount { amount: i64 },
    TextMessage { text_message: String },
    Peer { peer: Peer },
    RatingUser { rating_user: u8 },
    Dispute { dispute: DisputeTokens },
    Raw(serde_json::Value),
}

/// Body of an `order` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageKind {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    pub action: Action,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Body of a `cant-do` refusal.
///
/// A refusal is a successful reply at the transport level; its
/// `text_message` content describes why the server would not act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CantDoKind {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    pub pubkey: String,
    pub action: Action,
    #[serde(default)]
    pub content: Option<Content>,
}

/// A protocol message: exactly one of the two keys is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Message {
    Order(MessageKind),
    CantDo(CantDoKind),
}

impl Message {
    /// Build an outgoing `order` message.
    pub fn new_order(
        id: Option<String>,
        request_id: Option<u64>,
        action: Action,
        content: Option<Content>,
    ) -> Self {
        Self::Order(MessageKind {
            version: PROTOCOL_VERSION,
            id,
            request_id,
            action,
            content,
            created_at: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| ServiceError::MalformedMessage)
    }

    pub fn as_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|_| ServiceError::MalformedMessage)
    }

    pub fn action(&self) -> &Action {
        match self {
            Self::Order(kind) => &kind.action,
            Self::CantDo(kind) => &kind.action,
        }
    }

    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::Order(kind) => kind.request_id,
            Self::CantDo(kind) => kind.request_id,
        }
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::Order(kind) => kind.id.as_deref(),
            Self::CantDo(kind) => kind.id.as_deref(),
        }
    }

    /// Server refusal text, when this is a `cant-do` reply.
    pub fn refusal_text(&self) -> Option<&str> {
        match self {
            Self::CantDo(kind) => match &kind.content {
                Some(Content::TextMessage { text_message }) => Some(text_message),
                _ => None,
            },
            Self::Order(_) => None,
        }
    }
}
