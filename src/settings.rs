use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ServiceError};

/// Client construction options.
///
/// `mostro_pubkey` enables the targeted order subscription and trade
/// actions; `private_key` enables outgoing actions and DM receipt.
/// Read-only order search works with neither.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mostro_pubkey: Option<String>,
    pub relays: Vec<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

impl Settings {
    pub fn new(relays: Vec<String>) -> Self {
        Self {
            mostro_pubkey: None,
            relays,
            private_key: None,
            debug: false,
        }
    }

    pub fn with_mostro_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.mostro_pubkey = Some(pubkey.into());
        self
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        cfg.try_deserialize::<Settings>()
            .map_err(|e| ServiceError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_style_construction() {
        let settings = Settings::new(vec!["wss://relay.mostro.network".to_string()])
            .with_mostro_pubkey("npub1abc")
            .with_private_key("nsec1xyz");
        assert!(settings.mostro_pubkey.is_some());
        assert!(settings.private_key.is_some());
        assert!(!settings.debug);
    }
}
