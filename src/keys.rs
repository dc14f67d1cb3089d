// Key material handling: user identity key plus ephemeral wrap keys
use nostr_sdk::prelude::*;
use zeroize::Zeroize;

use crate::error::{Result, ServiceError};

/// Output encoding for a projected public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    Hex,
    Npub,
}

/// The user's secp256k1 keypair, decoded from hex or bech32 `nsec`.
///
/// Once loaded the key is immutable; replacing it goes through
/// `MostroClient::update_private_key`, which invalidates every pending
/// request before the swap.
#[derive(Debug, Clone)]
pub struct UserKeys {
    keys: Keys,
}

impl UserKeys {
    /// Parse a private key from 64 hex chars (case-insensitive) or a
    /// bech32 `nsec1…` string. The working copy of the input is wiped
    /// after decoding.
    pub fn parse(input: &str) -> Result<Self> {
        let mut raw = input.trim().to_string();

        let secret_key = if raw.starts_with("nsec1") {
            SecretKey::parse(&raw).map_err(|_| ServiceError::InvalidBech32)
        } else if raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            SecretKey::parse(&raw).map_err(|_| ServiceError::InvalidKeyFormat)
        } else {
            Err(ServiceError::InvalidKeyFormat)
        };
        raw.zeroize();

        Ok(Self {
            keys: Keys::new(secret_key?),
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    /// Project the public key as 64-char hex or bech32 `npub`.
    pub fn encoded_public_key(&self, encoding: KeyEncoding) -> Result<String> {
        match encoding {
            KeyEncoding::Hex => Ok(self.keys.public_key().to_hex()),
            KeyEncoding::Npub => self
                .keys
                .public_key()
                .to_bech32()
                .map_err(|e| ServiceError::Crypto(e.to_string())),
        }
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }
}

/// Fresh secp256k1 keypair uniform over `[1, n-1]`, from the OS CSPRNG.
/// Each outbound gift wrap consumes one; they are never reused.
pub fn random_ephemeral_keys() -> Keys {
    Keys::generate()
}

/// Parse a public key from 64-char hex or bech32 `npub`.
pub fn parse_public_key(input: &str) -> Result<PublicKey> {
    PublicKey::parse(input.trim()).map_err(|_| ServiceError::InvalidKeyFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_keys_are_unique() {
        let a = random_ephemeral_keys();
        let b = random_ephemeral_keys();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn rejects_short_hex() {
        assert!(matches!(
            UserKeys::parse("abcd1234"),
            Err(ServiceError::InvalidKeyFormat)
        ));
    }
}
