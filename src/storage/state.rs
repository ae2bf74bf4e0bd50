//! Vault persistence.
//!
//! A vault is stored as one versioned snapshot together with the receipts of
//! the calls that produced it, so it can be restored exactly and audited
//! call by call.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::external::BlockContext;
use crate::protocol::state_machine::{Receipt, Vault};
use crate::storage::backend::{make_key, prefixes, StorageBackend, TypedStore};
use crate::utils::constants::SNAPSHOT_VERSION;

const SNAPSHOT_KEY: &[u8] = b"snapshot";
const RECEIPT_COUNT_KEY: &[u8] = b"receipt_count";

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOT
// ═══════════════════════════════════════════════════════════════════════════════

/// A persisted vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Snapshot format version
    pub version: u32,
    /// Block the snapshot was taken at
    pub block: BlockContext,
    /// The vault
    pub vault: Vault,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Persists vault snapshots and call receipts
#[derive(Debug)]
pub struct VaultStore<B: StorageBackend> {
    store: TypedStore<B>,
}

impl<B: StorageBackend> VaultStore<B> {
    /// Create a vault store over `backend`
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    /// Save `vault` as of `block`, replacing any earlier snapshot
    pub fn save_vault(&self, vault: &Vault, block: BlockContext) -> Result<()> {
        let snapshot = VaultSnapshot {
            version: SNAPSHOT_VERSION,
            block,
            vault: vault.clone(),
        };
        self.store.set(&make_key(prefixes::VAULT, SNAPSHOT_KEY), &snapshot)?;
        debug!("Saved vault {} at block {}", vault.address(), block.number);
        Ok(())
    }

    /// Load the latest snapshot, if any
    pub fn load_vault(&self) -> Result<Option<VaultSnapshot>> {
        let snapshot: Option<VaultSnapshot> =
            self.store.get(&make_key(prefixes::VAULT, SNAPSHOT_KEY))?;
        match snapshot {
            Some(s) if s.version != SNAPSHOT_VERSION => Err(Error::Storage(format!(
                "Unsupported snapshot version {} (expected {})",
                s.version, SNAPSHOT_VERSION
            ))),
            other => Ok(other),
        }
    }

    /// Append a receipt, returning its sequence number
    pub fn append_receipt(&self, receipt: &Receipt) -> Result<u64> {
        let seq = self.receipt_count()?;
        self.store.set(&receipt_key(seq), receipt)?;
        self.store
            .set(&make_key(prefixes::META, RECEIPT_COUNT_KEY), &(seq + 1))?;
        Ok(seq)
    }

    /// Receipt number `seq`
    pub fn receipt(&self, seq: u64) -> Result<Option<Receipt>> {
        self.store.get(&receipt_key(seq))
    }

    /// Number of receipts appended
    pub fn receipt_count(&self) -> Result<u64> {
        Ok(self
            .store
            .get(&make_key(prefixes::META, RECEIPT_COUNT_KEY))?
            .unwrap_or(0))
    }

    /// All receipts in sequence order
    pub fn receipts(&self) -> Result<Vec<Receipt>> {
        (0..self.receipt_count()?)
            .map(|seq| {
                self.receipt(seq)?
                    .ok_or_else(|| Error::Storage(format!("Missing receipt {}", seq)))
            })
            .collect()
    }

    /// Flush pending writes
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Underlying typed store
    pub fn typed(&self) -> &TypedStore<B> {
        &self.store
    }
}

fn receipt_key(seq: u64) -> Vec<u8> {
    make_key(prefixes::RECEIPT, &seq.to_be_bytes())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{InitParams, VaultConfig};
    use crate::external::MemoryEnvironment;
    use crate::protocol::operations::{ApproveOp, Call, MintOp, SetManagerFeeOp, VaultOperation};
    use crate::storage::backend::{FileStore, InMemoryStore};
    use crate::utils::crypto::{Address, KeyPair};

    fn setup() -> (Vault, MemoryEnvironment, KeyPair) {
        let manager = KeyPair::generate();
        let params = InitParams {
            manager: *manager.public_key(),
            liquidity_pool: Address::derive("pool"),
            lending_protocol: Address::derive("protocol"),
            name: "Lien Vault Share".into(),
            symbol: "LVS".into(),
        };
        let vault = Vault::initialize(
            Address::derive("vault"),
            &params.encode().unwrap(),
            &VaultConfig::default(),
        )
        .unwrap();
        let env = MemoryEnvironment::in_memory(
            Address::derive("protocol"),
            Address::derive("pool"),
            BlockContext::new(100, 1_700_000_000),
        );
        (vault, env, manager)
    }

    fn busy_vault() -> (Vault, MemoryEnvironment, Vec<Receipt>) {
        let (mut vault, mut env, manager) = setup();
        let alice = Address::derive("alice");
        let calls = vec![
            Call::new(alice, VaultOperation::Mint(MintOp { amount: 1_000 })).with_value(1_000),
            Call::new(
                alice,
                VaultOperation::Approve(ApproveOp {
                    spender: Address::derive("bob"),
                    amount: 10,
                }),
            ),
            Call::new(
                manager.address(),
                VaultOperation::SetManagerFee(SetManagerFeeOp { fee_bps: 250 }),
            ),
        ];
        let receipts = calls
            .into_iter()
            .map(|call| vault.execute(&mut env, call).unwrap())
            .collect();
        (vault, env, receipts)
    }

    #[test]
    fn test_empty_store() {
        let store = VaultStore::new(InMemoryStore::new());
        assert!(store.load_vault().unwrap().is_none());
        assert_eq!(store.receipt_count().unwrap(), 0);
        assert!(store.receipts().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (vault, env, _) = busy_vault();
        let store = VaultStore::new(InMemoryStore::new());
        store.save_vault(&vault, env.block).unwrap();

        let snapshot = store.load_vault().unwrap().unwrap();
        let restored = snapshot.vault;
        assert_eq!(snapshot.block, env.block);
        assert_eq!(restored.address(), vault.address());
        assert_eq!(restored.total_supply(), 1_000);
        assert_eq!(restored.balance_of(&Address::derive("alice")), 1_000);
        assert_eq!(
            restored.allowance(&Address::derive("alice"), &Address::derive("bob")),
            10
        );
        assert_eq!(restored.manager_fee(), 250);
        assert_eq!(restored.signing_domain(), vault.signing_domain());
        assert_eq!(restored.underlying_balance(&env).unwrap(), 1_000);
    }

    #[test]
    fn test_unsupported_snapshot_version() {
        let (vault, env, _) = busy_vault();
        let store = VaultStore::new(InMemoryStore::new());
        let snapshot = VaultSnapshot {
            version: SNAPSHOT_VERSION + 1,
            block: env.block,
            vault,
        };
        store
            .typed()
            .set(&make_key(prefixes::VAULT, SNAPSHOT_KEY), &snapshot)
            .unwrap();
        assert!(matches!(store.load_vault(), Err(Error::Storage(_))));
    }

    #[test]
    fn test_receipts_in_order() {
        let (_, _, receipts) = busy_vault();
        let store = VaultStore::new(InMemoryStore::new());
        for (i, receipt) in receipts.iter().enumerate() {
            assert_eq!(store.append_receipt(receipt).unwrap(), i as u64);
        }

        assert_eq!(store.receipt_count().unwrap(), 3);
        assert_eq!(store.receipt(1).unwrap().as_ref(), Some(&receipts[1]));
        assert_eq!(store.receipt(3).unwrap(), None);
        assert_eq!(store.receipts().unwrap(), receipts);
    }

    #[test]
    fn test_file_backed_restore() {
        let dir = tempfile::tempdir().unwrap();
        let (vault, env, receipts) = busy_vault();
        {
            let store = VaultStore::new(FileStore::open(dir.path()).unwrap());
            store.save_vault(&vault, env.block).unwrap();
            store.append_receipt(&receipts[0]).unwrap();
            store.flush().unwrap();
        }

        let store = VaultStore::new(FileStore::open(dir.path()).unwrap());
        let restored = store.load_vault().unwrap().unwrap().vault;
        assert_eq!(restored.total_supply(), vault.total_supply());
        assert_eq!(store.receipts().unwrap(), vec![receipts[0].clone()]);
    }
}
