// Integration tests for key loading and projection
use mostro_client::error::ServiceError;
use mostro_client::keys::{KeyEncoding, UserKeys};
use nostr_sdk::prelude::*;

const HEX_KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

#[test]
fn test_loads_hex_key_case_insensitively() {
    let lower = UserKeys::parse(HEX_KEY).unwrap();
    let upper = UserKeys::parse(&HEX_KEY.to_uppercase()).unwrap();
    assert_eq!(lower.public_key(), upper.public_key());
}

#[test]
fn test_loads_bech32_nsec() {
    let generated = Keys::generate();
    let nsec = generated.secret_key().to_bech32().unwrap();

    let loaded = UserKeys::parse(&nsec).unwrap();
    assert_eq!(loaded.public_key(), generated.public_key());
}

#[test]
fn test_public_key_projections() {
    let keys = UserKeys::parse(HEX_KEY).unwrap();

    let hex = keys.encoded_public_key(KeyEncoding::Hex).unwrap();
    assert_eq!(hex.len(), 64);
    assert_eq!(hex, keys.public_key().to_hex());

    let npub = keys.encoded_public_key(KeyEncoding::Npub).unwrap();
    assert!(npub.starts_with("npub1"));
}

#[test]
fn test_rejects_malformed_keys() {
    assert!(matches!(
        UserKeys::parse(""),
        Err(ServiceError::InvalidKeyFormat)
    ));
    assert!(matches!(
        UserKeys::parse("0101"),
        Err(ServiceError::InvalidKeyFormat)
    ));
    // Right length, not hex.
    assert!(matches!(
        UserKeys::parse(&"zz".repeat(32)),
        Err(ServiceError::InvalidKeyFormat)
    ));
}

#[test]
fn test_rejects_malformed_nsec_distinctly() {
    assert!(matches!(
        UserKeys::parse("nsec1notreallyakey"),
        Err(ServiceError::InvalidBech32)
    ));
}
