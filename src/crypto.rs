// Event encryption and signing helpers
//
// Two codepaths on purpose: gift-wrap payloads carry NIP-44 v2 base64
// strings, while legacy kind-4 DMs carry base64 over the raw v2
// ciphertext bytes, the format the deployed Mostro ecosystem speaks.
use base64::engine::general_purpose;
use base64::Engine;
use nostr_sdk::prelude::*;

use crate::error::{Result, ServiceError};

/// NIP-44 v2 encryption for gift-wrap payloads.
pub fn encrypt_nip44(plaintext: &str, sender: &Keys, recipient: &PublicKey) -> Result<String> {
    nip44::encrypt(sender.secret_key(), recipient, plaintext, nip44::Version::V2)
        .map_err(|e| ServiceError::Crypto(e.to_string()))
}

/// NIP-44 v2 decryption. MAC or format failures all collapse into
/// `DecryptFailed`; callers on the inbound path log and drop.
pub fn decrypt_nip44(payload: &str, local: &Keys, peer: &PublicKey) -> Result<String> {
    nip44::decrypt(local.secret_key(), peer, payload).map_err(|_| ServiceError::DecryptFailed)
}

/// Kind-4 DM encryption: v2 conversation key, raw ciphertext bytes,
/// base64 transport.
pub fn encrypt_nip04(plaintext: &str, local: &Keys, peer: &PublicKey) -> Result<String> {
    let ck = nip44::v2::ConversationKey::derive(local.secret_key(), peer)
        .map_err(|e| ServiceError::Crypto(e.to_string()))?;
    let ciphertext = nip44::v2::encrypt_to_bytes(&ck, plaintext.as_bytes())
        .map_err(|e| ServiceError::Crypto(e.to_string()))?;
    Ok(general_purpose::STANDARD.encode(ciphertext))
}

/// Kind-4 DM decryption, the inverse of [`encrypt_nip04`].
pub fn decrypt_nip04(content: &str, local: &Keys, peer: &PublicKey) -> Result<String> {
    let ck = nip44::v2::ConversationKey::derive(local.secret_key(), peer)
        .map_err(|_| ServiceError::DecryptFailed)?;
    let ciphertext = general_purpose::STANDARD
        .decode(content.as_bytes())
        .map_err(|_| ServiceError::DecryptFailed)?;
    let plaintext =
        nip44::v2::decrypt_to_bytes(&ck, &ciphertext).map_err(|_| ServiceError::DecryptFailed)?;
    String::from_utf8(plaintext).map_err(|_| ServiceError::DecryptFailed)
}

/// Finalize an event: canonical id plus BIP-340 schnorr signature.
pub fn sign_event(builder: EventBuilder, keys: &Keys) -> Result<Event> {
    builder
        .sign_with_keys(keys)
        .map_err(|e| ServiceError::Crypto(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nip04_round_trip() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let ciphertext = encrypt_nip04("fiat sent", &alice, &bob.public_key()).unwrap();
        let plaintext = decrypt_nip04(&ciphertext, &bob, &alice.public_key()).unwrap();
        assert_eq!(plaintext, "fiat sent");
    }

    #[test]
    fn nip44_round_trip() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let ciphertext = encrypt_nip44("take-sell", &alice, &bob.public_key()).unwrap();
        let plaintext = decrypt_nip44(&ciphertext, &bob, &alice.public_key()).unwrap();
        assert_eq!(plaintext, "take-sell");
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let mallory = Keys::generate();
        let ciphertext = encrypt_nip04("release", &alice, &bob.public_key()).unwrap();
        assert!(matches!(
            decrypt_nip04(&ciphertext, &mallory, &alice.public_key()),
            Err(ServiceError::DecryptFailed)
        ));
    }
}
