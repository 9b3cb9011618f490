use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::primitives::Address;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "gavel.toml";

/// Marketplace settings loaded from `gavel.toml`. Every field is optional;
/// flags and environment variables take precedence.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    pub registry: Option<Address>,
    pub ipfs_gateway: Option<String>,
    /// Token deployed by the local dev stack, used when the RPC host is a
    /// loopback address.
    pub local_token: Option<Address>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse toml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("registry address required: pass --registry, set GAVEL_REGISTRY, or add it to gavel.toml")]
    MissingRegistry,
}

/// Load the config file. A missing file is not an error: flags and env
/// vars can supply everything.
pub fn load_config(path: impl AsRef<Path>) -> Result<MarketConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(MarketConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: MarketConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(config)
}

/// Fold the flag/env value with the file value; the registry address is the
/// one setting with no built-in default.
pub fn require_registry(
    flag: Option<Address>,
    config: &MarketConfig,
) -> Result<Address, ConfigError> {
    flag.or(config.registry).ok_or(ConfigError::MissingRegistry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_example_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("gavel.example.toml");
        let config = load_config(path).expect("should parse example config");

        assert_eq!(
            config.registry,
            Some(
                "0x1f9090aaE28b8a3dCeaDf281B0F12828e676c326"
                    .parse()
                    .expect("valid address")
            )
        );
        assert_eq!(config.ipfs_gateway.as_deref(), Some("https://ipfs.io"));
        assert!(config.local_token.is_some());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("does-not-exist.toml").expect("missing file is fine");
        assert_eq!(config, MarketConfig::default());
    }

    #[test]
    fn flag_wins_over_file_registry() {
        let file = MarketConfig {
            registry: Some(Address::repeat_byte(0x01)),
            ..Default::default()
        };
        let flag = Some(Address::repeat_byte(0x02));

        assert_eq!(
            require_registry(flag, &file).expect("resolves"),
            Address::repeat_byte(0x02)
        );
        assert_eq!(
            require_registry(None, &file).expect("resolves"),
            Address::repeat_byte(0x01)
        );
        assert!(require_registry(None, &MarketConfig::default()).is_err());
    }
}
