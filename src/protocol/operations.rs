//! Vault operations - atomic state changes.
//!
//! Operations represent discrete actions that can be executed atomically
//! on the vault. Each one is submitted inside a [`Call`] that names the
//! caller and the native value attached.

use serde::{Deserialize, Serialize};

use crate::core::lien::{Lien, LienId, LienPointer};
use crate::error::{Error, Result};
use crate::utils::crypto::{Address, Hash, Signature, TokenId};

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATION TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for vault operations
pub trait Operation: Sized + Send + Sync {
    /// Get the operation type name
    fn operation_type(&self) -> &'static str;

    /// Whether only the manager may submit this operation
    fn manager_only(&self) -> bool {
        false
    }

    /// Whether native value may be attached
    fn payable(&self) -> bool {
        false
    }
}

macro_rules! operation {
    ($ty:ident, $name:literal) => {
        impl Operation for $ty {
            fn operation_type(&self) -> &'static str {
                $name
            }
        }
    };
    ($ty:ident, $name:literal, manager) => {
        impl Operation for $ty {
            fn operation_type(&self) -> &'static str {
                $name
            }

            fn manager_only(&self) -> bool {
                true
            }
        }
    };
    ($ty:ident, $name:literal, payable) => {
        impl Operation for $ty {
            fn operation_type(&self) -> &'static str {
                $name
            }

            fn payable(&self) -> bool {
                true
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARE OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Deposit liquidity for shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOp {
    /// Amount deposited; must equal the attached value
    pub amount: u128,
}
operation!(MintOp, "Mint", payable);

/// Redeem shares for liquidity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnOp {
    /// Shares to burn
    pub shares: u128,
}
operation!(BurnOp, "Burn");

/// Transfer shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOp {
    /// Recipient
    pub to: Address,
    /// Shares to move
    pub amount: u128,
}
operation!(TransferOp, "Transfer");

/// Set a share allowance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveOp {
    /// Spender
    pub spender: Address,
    /// New allowance
    pub amount: u128,
}
operation!(ApproveOp, "Approve");

/// Transfer shares on behalf of an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFromOp {
    /// Owner of the shares
    pub owner: Address,
    /// Recipient
    pub to: Address,
    /// Shares to move
    pub amount: u128,
}
operation!(TransferFromOp, "TransferFrom");

// ═══════════════════════════════════════════════════════════════════════════════
// LIEN OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Call a vault-held lien into auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAuctionOp {
    /// Lien as the caller believes it to be
    pub lien: Lien,
    /// Lien id
    pub lien_id: LienId,
}
operation!(StartAuctionOp, "StartAuction", manager);

/// Take over a lien in auction at a new rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinanceAuctionOp {
    /// Lien as the caller believes it to be
    pub lien: Lien,
    /// Lien id
    pub lien_id: LienId,
    /// New annual rate in basis points
    pub rate: u64,
}
operation!(RefinanceAuctionOp, "RefinanceAuction", manager);

/// Seize the collateral of defaulted liens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizeOp {
    /// Liens to seize
    pub liens: Vec<LienPointer>,
}
operation!(SeizeOp, "Seize", manager);

/// Compact settled liens out of the lien store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanUpLiensOp;
operation!(CleanUpLiensOp, "CleanUpLiens");

// ═══════════════════════════════════════════════════════════════════════════════
// SETTLEMENT OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Buy a seized asset under a manager-signed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateNftOp {
    /// Lien the asset was seized from
    pub lien_id: LienId,
    /// Collateral collection
    pub collection: Address,
    /// Collateral token id
    pub token_id: TokenId,
    /// Price; must equal the attached value
    pub amount: u128,
    /// Receiver of the asset
    pub recipient: Address,
    /// Last valid timestamp
    pub deadline: u64,
    /// Manager signature over the order
    pub signature: Signature,
}
operation!(LiquidateNftOp, "LiquidateNft", payable);

// ═══════════════════════════════════════════════════════════════════════════════
// ADMIN OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Change the manager fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetManagerFeeOp {
    /// New fee in basis points
    pub fee_bps: u16,
}
operation!(SetManagerFeeOp, "SetManagerFee", manager);

/// Withdraw the accrued manager fee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectManagerFeeOp;
operation!(CollectManagerFeeOp, "CollectManagerFee", manager);

/// Replace the implementation and optionally run a follow-up operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeToAndCallOp {
    /// Hash of the new implementation
    pub implementation: Hash,
    /// Encoded [`VaultOperation`] to run as the manager, or empty
    pub call: Vec<u8>,
}
operation!(UpgradeToAndCallOp, "UpgradeToAndCall", manager);

impl UpgradeToAndCallOp {
    /// Decode the follow-up operation, if any
    pub fn decode_call(&self) -> Result<Option<VaultOperation>> {
        if self.call.is_empty() {
            return Ok(None);
        }
        bincode::deserialize(&self.call)
            .map(Some)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT OPERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// All vault operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultOperation {
    /// Mint shares
    Mint(MintOp),
    /// Burn shares
    Burn(BurnOp),
    /// Transfer shares
    Transfer(TransferOp),
    /// Approve a spender
    Approve(ApproveOp),
    /// Transfer on behalf of an owner
    TransferFrom(TransferFromOp),
    /// Start an auction
    StartAuction(StartAuctionOp),
    /// Refinance an auction
    RefinanceAuction(RefinanceAuctionOp),
    /// Seize defaulted collateral
    Seize(SeizeOp),
    /// Compact the lien store
    CleanUpLiens(CleanUpLiensOp),
    /// Buy a seized asset
    LiquidateNft(LiquidateNftOp),
    /// Set the manager fee
    SetManagerFee(SetManagerFeeOp),
    /// Collect the manager fee
    CollectManagerFee(CollectManagerFeeOp),
    /// Upgrade
    UpgradeToAndCall(UpgradeToAndCallOp),
}

impl VaultOperation {
    /// Get the operation type name
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Mint(op) => op.operation_type(),
            Self::Burn(op) => op.operation_type(),
            Self::Transfer(op) => op.operation_type(),
            Self::Approve(op) => op.operation_type(),
            Self::TransferFrom(op) => op.operation_type(),
            Self::StartAuction(op) => op.operation_type(),
            Self::RefinanceAuction(op) => op.operation_type(),
            Self::Seize(op) => op.operation_type(),
            Self::CleanUpLiens(op) => op.operation_type(),
            Self::LiquidateNft(op) => op.operation_type(),
            Self::SetManagerFee(op) => op.operation_type(),
            Self::CollectManagerFee(op) => op.operation_type(),
            Self::UpgradeToAndCall(op) => op.operation_type(),
        }
    }

    /// Whether only the manager may submit this operation
    pub fn manager_only(&self) -> bool {
        match self {
            Self::StartAuction(op) => op.manager_only(),
            Self::RefinanceAuction(op) => op.manager_only(),
            Self::Seize(op) => op.manager_only(),
            Self::SetManagerFee(op) => op.manager_only(),
            Self::CollectManagerFee(op) => op.manager_only(),
            Self::UpgradeToAndCall(op) => op.manager_only(),
            _ => false,
        }
    }

    /// Whether native value may be attached
    pub fn payable(&self) -> bool {
        match self {
            Self::Mint(op) => op.payable(),
            Self::LiquidateNft(op) => op.payable(),
            _ => false,
        }
    }

    /// Encode for use as an upgrade follow-up call
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALL
// ═══════════════════════════════════════════════════════════════════════════════

/// An operation submitted by `caller` with `value` attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Submitting identity
    pub caller: Address,
    /// Native value attached
    pub value: u128,
    /// Operation to run
    pub operation: VaultOperation,
}

impl Call {
    /// Call with no value attached
    pub fn new(caller: Address, operation: VaultOperation) -> Self {
        Self {
            caller,
            value: 0,
            operation,
        }
    }

    /// Attach native value
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_types() {
        let op = MintOp { amount: 100 };
        assert_eq!(op.operation_type(), "Mint");
        assert!(op.payable());
        assert!(!op.manager_only());

        let op = SeizeOp { liens: vec![] };
        assert!(op.manager_only());
        assert!(!op.payable());
    }

    #[test]
    fn test_vault_operation_enum() {
        let op = VaultOperation::CollectManagerFee(CollectManagerFeeOp);
        assert_eq!(op.operation_type(), "CollectManagerFee");
        assert!(op.manager_only());

        let op = VaultOperation::Burn(BurnOp { shares: 1 });
        assert!(!op.manager_only());
        assert!(!op.payable());

        let op = VaultOperation::CleanUpLiens(CleanUpLiensOp);
        assert!(!op.manager_only());
    }

    #[test]
    fn test_upgrade_follow_up_decoding() {
        let follow_up = VaultOperation::SetManagerFee(SetManagerFeeOp { fee_bps: 100 });
        let upgrade = UpgradeToAndCallOp {
            implementation: Hash::sha256(b"v2"),
            call: follow_up.encode().unwrap(),
        };
        assert_eq!(upgrade.decode_call().unwrap(), Some(follow_up));

        let empty = UpgradeToAndCallOp {
            implementation: Hash::sha256(b"v2"),
            call: vec![],
        };
        assert_eq!(empty.decode_call().unwrap(), None);

        let garbage = UpgradeToAndCallOp {
            implementation: Hash::sha256(b"v2"),
            call: vec![0xff; 3],
        };
        assert!(matches!(garbage.decode_call(), Err(Error::Deserialization(_))));
    }

    #[test]
    fn test_call_builder() {
        let caller = Address::derive("caller");
        let call = Call::new(caller, VaultOperation::Mint(MintOp { amount: 5 })).with_value(5);
        assert_eq!(call.caller, caller);
        assert_eq!(call.value, 5);
    }
}
