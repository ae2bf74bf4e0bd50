//! Vault configuration and initialization payload.
//!
//! `VaultConfig` carries deployment-level settings that are not part of the
//! init payload (chain id, signing-domain version, starting fee, log filter).
//! `InitParams` is the payload a deployer hands to `Vault::initialize`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_DOMAIN_VERSION, DEFAULT_MANAGER_FEE_BPS, MAX_MANAGER_FEE_BPS,
    SHARE_DECIMALS,
};
use crate::utils::crypto::{Address, PublicKey};
use crate::utils::validation::{validate_collaborator, validate_label, validate_public_key};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "LIEN_VAULT_";

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Deployment-level vault settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Chain id bound into the signing domain
    pub chain_id: u64,
    /// Signing-domain version string
    pub domain_version: String,
    /// Manager fee applied at initialization (basis points)
    pub initial_manager_fee_bps: u16,
    /// Share decimal places
    pub share_decimals: u8,
    /// Default tracing filter directive
    pub log_filter: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            domain_version: DEFAULT_DOMAIN_VERSION.into(),
            initial_manager_fee_bps: DEFAULT_MANAGER_FEE_BPS,
            share_decimals: SHARE_DECIMALS,
            log_filter: "info".into(),
        }
    }
}

impl VaultConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        let config: Self =
            serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Config(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Defaults overridden by `LIEN_VAULT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `LIEN_VAULT_*` key
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(chain_id) = var("CHAIN_ID") {
            config.chain_id = parse_var("CHAIN_ID", &chain_id)?;
        }

        if let Some(version) = var("DOMAIN_VERSION") {
            config.domain_version = version;
        }

        if let Some(fee) = var("MANAGER_FEE_BPS") {
            config.initial_manager_fee_bps = parse_var("MANAGER_FEE_BPS", &fee)?;
        }

        if let Some(decimals) = var("SHARE_DECIMALS") {
            config.share_decimals = parse_var("SHARE_DECIMALS", &decimals)?;
        }

        if let Some(filter) = var("LOG") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(Error::Config("chain id must be greater than 0".into()));
        }

        if self.domain_version.trim().is_empty() {
            return Err(Error::Config("domain version cannot be empty".into()));
        }

        if self.initial_manager_fee_bps > MAX_MANAGER_FEE_BPS {
            return Err(Error::Config(format!(
                "manager fee {}bps exceeds {}bps",
                self.initial_manager_fee_bps, MAX_MANAGER_FEE_BPS
            )));
        }

        if self.share_decimals > 36 {
            return Err(Error::Config(format!(
                "share decimals {} out of range",
                self.share_decimals
            )));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}{}={:?}: {}", ENV_PREFIX, name, raw, e)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// INITIALIZATION PAYLOAD
// ═══════════════════════════════════════════════════════════════════════════════

/// Initialization payload handed to the vault by its deployer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    /// Manager signing key
    pub manager: PublicKey,
    /// Pooled liquidity asset
    pub liquidity_pool: Address,
    /// External lending protocol
    pub lending_protocol: Address,
    /// Share token name
    pub name: String,
    /// Share token symbol
    pub symbol: String,
}

impl InitParams {
    /// Encode as an initialization payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode and validate an initialization payload
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let params: Self =
            bincode::deserialize(payload).map_err(|e| Error::Deserialization(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate the payload
    pub fn validate(&self) -> Result<()> {
        validate_public_key(&self.manager)?;
        validate_collaborator(&self.liquidity_pool, "liquidity_pool")?;
        validate_collaborator(&self.lending_protocol, "lending_protocol")?;
        validate_label(&self.name, "name")?;
        validate_label(&self.symbol, "symbol")?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::KeyPair;
    use std::collections::HashMap;

    fn params() -> InitParams {
        InitParams {
            manager: *KeyPair::generate().public_key(),
            liquidity_pool: Address::derive("pool"),
            lending_protocol: Address::derive("protocol"),
            name: "Lien Vault Share".into(),
            symbol: "LVS".into(),
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = VaultConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.share_decimals, SHARE_DECIMALS);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = VaultConfig {
            initial_manager_fee_bps: MAX_MANAGER_FEE_BPS + 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = VaultConfig {
            chain_id: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = VaultConfig::from_lookup(lookup(&[
            ("CHAIN_ID", "31337"),
            ("MANAGER_FEE_BPS", "250"),
            ("LOG", "lien_vault=debug"),
        ]))
        .unwrap();

        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.initial_manager_fee_bps, 250);
        assert_eq!(config.log_filter, "lien_vault=debug");
        assert_eq!(config.domain_version, DEFAULT_DOMAIN_VERSION);
    }

    #[test]
    fn test_env_rejects_garbage() {
        assert!(matches!(
            VaultConfig::from_lookup(lookup(&[("CHAIN_ID", "mainnet")])),
            Err(Error::Config(_))
        ));
        assert!(VaultConfig::from_lookup(lookup(&[("MANAGER_FEE_BPS", "5000")])).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vault.json");

        let config = VaultConfig {
            chain_id: 5,
            domain_version: "2".into(),
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(VaultConfig::load(&path).unwrap(), config);
        assert!(VaultConfig::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.json");
        std::fs::write(&path, r#"{"chain_id": 10}"#).unwrap();

        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.chain_id, 10);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_init_params_round_trip() {
        let params = params();
        let payload = params.encode().unwrap();
        assert_eq!(InitParams::decode(&payload).unwrap(), params);
        assert!(InitParams::decode(&payload[..payload.len() - 1]).is_err());
    }

    #[test]
    fn test_init_params_validation() {
        let mut bad = params();
        bad.liquidity_pool = Address::ZERO;
        assert!(matches!(
            InitParams::decode(&bad.encode().unwrap()),
            Err(Error::InvalidParameter { .. })
        ));

        let mut bad = params();
        bad.symbol = "  ".into();
        assert!(bad.validate().is_err());

        let mut bad = params();
        bad.manager = PublicKey::new([0x05; 33]);
        assert!(bad.validate().is_err());
    }
}
