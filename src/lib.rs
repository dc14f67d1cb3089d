// Client-side library for the Mostro P2P exchange protocol over Nostr
pub mod client;
pub mod correlator;
pub mod crypto;
pub mod error;
pub mod filters;
pub mod giftwrap;
pub mod keys;
pub mod message;
pub mod order;
pub mod relay;
pub mod settings;

// Re-export commonly used items
pub use client::{ClientEvent, MostroClient, REQUEST_TIMEOUT, SEARCH_WINDOW};
pub use correlator::{PendingReply, RequestCorrelator};
pub use error::{Result, ServiceError};
pub use filters::{OrderFilters, NOSTR_REPLACEABLE_EVENT_KIND};
pub use keys::{KeyEncoding, UserKeys};
pub use message::{Action, Content, Message, PaymentRequest, PROTOCOL_VERSION};
pub use order::{MostroInfo, Order, OrderKind, Rating, Status};
pub use settings::Settings;
