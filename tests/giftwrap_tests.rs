// Integration tests for gift wrap construction
use mostro_client::giftwrap::{self, WRAP_TIMESTAMP_WINDOW};
use nostr_sdk::prelude::*;

#[test]
fn test_wrap_produces_signed_kind_1059_for_recipient() {
    let sender = Keys::generate();
    let recipient = Keys::generate();

    let event = giftwrap::wrap(r#"{"order":{}}"#, &sender, &recipient.public_key()).unwrap();

    assert_eq!(event.kind, Kind::GiftWrap);
    assert!(event.verify().is_ok());
    // Authored by a one-shot ephemeral key, never by the sender.
    assert_ne!(event.pubkey, sender.public_key());

    let p_tag = event
        .tags
        .iter()
        .map(|t| t.as_slice())
        .find(|t| t.first().map(String::as_str) == Some("p"))
        .expect("wrap carries a p tag");
    assert_eq!(p_tag[1], recipient.public_key().to_hex());
}

#[test]
fn test_wrap_timestamp_is_past_biased_within_two_days() {
    let sender = Keys::generate();
    let recipient = Keys::generate();

    let before = Timestamp::now().as_u64();
    let event = giftwrap::wrap("{}", &sender, &recipient.public_key()).unwrap();
    let after = Timestamp::now().as_u64();

    let created_at = event.created_at.as_u64();
    assert!(created_at <= after);
    assert!(created_at + WRAP_TIMESTAMP_WINDOW >= before);
}

#[test]
fn test_recipient_can_unwrap_the_rumor() {
    let sender = Keys::generate();
    let recipient = Keys::generate();
    let payload = r#"{"order":{"version":1,"request_id":0,"action":"new-order","content":null}}"#;

    let event = giftwrap::wrap(payload, &sender, &recipient.public_key()).unwrap();
    let rumor = giftwrap::unwrap(&event, &recipient).unwrap();

    assert_eq!(rumor.content, payload);
    assert_eq!(rumor.kind, Kind::TextNote);
    // The rumor names the real sender even though the wrap does not.
    assert_eq!(rumor.pubkey, sender.public_key());
}

#[test]
fn test_wrong_recipient_cannot_unwrap() {
    let sender = Keys::generate();
    let recipient = Keys::generate();
    let eavesdropper = Keys::generate();

    let event = giftwrap::wrap("{}", &sender, &recipient.public_key()).unwrap();
    assert!(giftwrap::unwrap(&event, &eavesdropper).is_err());
}

#[test]
fn test_each_wrap_uses_fresh_ephemeral_key_and_rumor_id() {
    let sender = Keys::generate();
    let recipient = Keys::generate();

    let a = giftwrap::wrap("{}", &sender, &recipient.public_key()).unwrap();
    let b = giftwrap::wrap("{}", &sender, &recipient.public_key()).unwrap();

    assert_ne!(a.pubkey, b.pubkey);

    let rumor_a = giftwrap::unwrap(&a, &recipient).unwrap();
    let rumor_b = giftwrap::unwrap(&b, &recipient).unwrap();
    assert_ne!(rumor_a.id, rumor_b.id);
}
