// NIP-59 gift wrap construction for messages to Mostro
use nostr_sdk::prelude::*;
use rand::Rng;

use crate::crypto;
use crate::error::{Result, ServiceError};
use crate::keys::random_ephemeral_keys;

/// Clock-smearing window: wrap timestamps land in `[now - 2 days, now]`.
pub const WRAP_TIMESTAMP_WINDOW: u64 = 2 * 24 * 3600;

/// Wrap a JSON payload for `recipient`.
///
/// The inner rumor is an unsigned kind-1 event authored by `sender`'s
/// public key; its id is a fresh random 32-byte value rather than the
/// recipient-derivable hash, matching the deployed Mostro convention.
/// The outer kind-1059 event is signed by a one-shot ephemeral key and
/// carries a past-biased random timestamp so relays cannot correlate
/// wraps with the sends that produced them.
pub fn wrap(payload: &str, sender: &Keys, recipient: &PublicKey) -> Result<Event> {
    let ephemeral = random_ephemeral_keys();

    let mut rumor = EventBuilder::text_note(payload).build(sender.public_key());
    rumor.id = Some(random_rumor_id()?);
    let rumor_json = rumor.as_json();

    let content = crypto::encrypt_nip44(&rumor_json, &ephemeral, recipient)?;

    let created_at = smeared_timestamp();
    let builder = EventBuilder::new(Kind::GiftWrap, content)
        .tag(Tag::public_key(*recipient))
        .custom_created_at(created_at);

    crypto::sign_event(builder, &ephemeral)
}

/// Unwrap one of our own inbound wraps: decrypt the outer layer with
/// `local` and return the rumor.
pub fn unwrap(event: &Event, local: &Keys) -> Result<UnsignedEvent> {
    let rumor_json = crypto::decrypt_nip44(&event.content, local, &event.pubkey)?;
    UnsignedEvent::from_json(rumor_json.as_bytes()).map_err(|_| ServiceError::DecryptFailed)
}

fn random_rumor_id() -> Result<EventId> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    EventId::from_hex(&hex::encode(bytes)).map_err(|e| ServiceError::Crypto(e.to_string()))
}

fn smeared_timestamp() -> Timestamp {
    let now = Timestamp::now().as_u64();
    let offset = rand::thread_rng().gen_range(0..=WRAP_TIMESTAMP_WINDOW);
    Timestamp::from(now - offset)
}
