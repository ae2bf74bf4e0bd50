//! Manager-signed liquidation orders.
//!
//! An order is signed over a domain-separated structured digest:
//!
//! ```text
//! digest = sha256(0x19 0x01 || domain_separator || struct_hash)
//! ```
//!
//! The nonce is part of the signed payload and is the caller's current nonce
//! at execution time, so a signature stops verifying the moment that nonce is
//! consumed. There is no separate "used" flag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::utils::constants::{DOMAIN_TYPE, LIQUIDATE_ORDER_TYPE, STRUCTURED_DATA_PREFIX};
use crate::utils::crypto::{Address, Hash, KeyPair, PublicKey, Signature, TokenId, WordEncoder};

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNING DOMAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// Versioned, chain- and vault-scoped signing domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDomain {
    /// Domain name (the share token name)
    pub name: String,
    /// Domain version
    pub version: String,
    /// Chain id
    pub chain_id: u64,
    /// Contract the signatures are bound to
    pub verifying_contract: Address,
}

impl SigningDomain {
    /// Create a domain
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Domain separator
    pub fn separator(&self) -> Hash {
        WordEncoder::new()
            .hash(&Hash::sha256(DOMAIN_TYPE.as_bytes()))
            .hash(&Hash::sha256(self.name.as_bytes()))
            .hash(&Hash::sha256(self.version.as_bytes()))
            .uint(u128::from(self.chain_id))
            .address(&self.verifying_contract)
            .finish()
    }

    /// Digest to sign for a struct hash under this domain
    pub fn digest(&self, struct_hash: &Hash) -> Hash {
        let mut data = Vec::with_capacity(2 + 64);
        data.extend_from_slice(&STRUCTURED_DATA_PREFIX);
        data.extend_from_slice(self.separator().as_bytes());
        data.extend_from_slice(struct_hash.as_bytes());
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION ORDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Intent to sell one seized asset at a fixed price to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOrder {
    /// Collateral collection
    pub collection: Address,
    /// Collateral token id
    pub token_id: TokenId,
    /// Price
    pub amount: u128,
    /// Receiver of the asset
    pub recipient: Address,
    /// Buyer's nonce the order is valid for
    pub nonce: u64,
    /// Last valid timestamp
    pub deadline: u64,
}

impl LiquidationOrder {
    /// Hash of the typed order fields
    pub fn struct_hash(&self) -> Hash {
        WordEncoder::new()
            .hash(&Hash::sha256(LIQUIDATE_ORDER_TYPE.as_bytes()))
            .address(&self.collection)
            .token_id(&self.token_id)
            .uint(self.amount)
            .address(&self.recipient)
            .uint(u128::from(self.nonce))
            .uint(u128::from(self.deadline))
            .finish()
    }

    /// Digest the manager signs
    pub fn signing_hash(&self, domain: &SigningDomain) -> Hash {
        domain.digest(&self.struct_hash())
    }

    /// Sign under `domain`
    pub fn sign(&self, domain: &SigningDomain, keypair: &KeyPair) -> Signature {
        keypair.sign(&self.signing_hash(domain))
    }

    /// Check `signature` was produced by `signer` for exactly this order
    pub fn verify(
        &self,
        domain: &SigningDomain,
        signer: &PublicKey,
        signature: &Signature,
    ) -> Result<()> {
        if !signer.verify(&self.signing_hash(domain), signature) {
            return Err(Error::InvalidSignature);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NONCES
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-account monotonically increasing nonces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRegistry {
    nonces: HashMap<Address, u64>,
}

impl NonceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nonce of `account`
    pub fn current(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    /// Consume the current nonce, returning it
    pub fn consume(&mut self, account: Address) -> Result<u64> {
        let nonce = self.nonces.entry(account).or_insert(0);
        let used = *nonce;
        *nonce = used.checked_add(1).ok_or(Error::Overflow {
            operation: "nonce".into(),
        })?;
        Ok(used)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
