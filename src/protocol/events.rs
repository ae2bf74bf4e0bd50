//! Vault events for state change notifications.
//!
//! Every successful call emits events describing what changed, enabling
//! clients to track activity and react accordingly. A failed call emits
//! nothing.

use serde::{Deserialize, Serialize};

use crate::core::lien::LienId;
use crate::utils::crypto::{Address, Hash, TokenId};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All vault event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    // Share Events
    /// Shares minted against a deposit
    Mint {
        /// Depositor
        depositor: Address,
        /// Liquidity deposited
        amount: u128,
        /// Shares minted
        shares: u128,
    },
    /// Shares burned for liquidity
    Burn {
        /// Holder
        holder: Address,
        /// Shares burned
        shares: u128,
        /// Manager fee retained
        fee: u128,
        /// Liquidity paid out
        net: u128,
    },
    /// Shares moved between holders
    Transfer {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Shares moved
        amount: u128,
    },
    /// Allowance set
    Approval {
        /// Owner
        owner: Address,
        /// Spender
        spender: Address,
        /// New allowance
        amount: u128,
    },

    // Lien Events
    /// Auction started on a vault-held lien
    AuctionStarted {
        /// Lien id
        lien_id: LienId,
        /// Block the auction started at
        start_block: u64,
    },
    /// Lien taken over from an auction
    LienRefinanced {
        /// Lien id
        lien_id: LienId,
        /// Debt paid to the prior lender
        debt: u128,
        /// New rate
        rate: u64,
    },
    /// Collateral seized into custody
    LienSeized {
        /// Lien id
        lien_id: LienId,
        /// Collateral collection
        collection: Address,
        /// Collateral token id
        token_id: TokenId,
        /// Virtual balance booked
        virtual_balance: u128,
    },
    /// Settled liens compacted away
    LiensCleanedUp {
        /// Removed lien ids
        removed: Vec<LienId>,
    },

    // Settlement Events
    /// Seized asset sold under a signed order
    NftLiquidated {
        /// Lien id
        lien_id: LienId,
        /// Collateral collection
        collection: Address,
        /// Collateral token id
        token_id: TokenId,
        /// Price paid
        amount: u128,
        /// Receiver of the asset
        recipient: Address,
    },

    // Admin Events
    /// Manager fee changed
    ManagerFeeSet {
        /// Previous fee
        old_fee_bps: u16,
        /// New fee
        new_fee_bps: u16,
    },
    /// Manager fee pot withdrawn
    ManagerFeeCollected {
        /// Receiver
        manager: Address,
        /// Amount withdrawn
        amount: u128,
    },
    /// Implementation replaced
    Upgraded {
        /// New implementation hash
        implementation: Hash,
        /// New implementation version
        version: u64,
    },
}

impl VaultEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "Mint",
            Self::Burn { .. } => "Burn",
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::AuctionStarted { .. } => "AuctionStarted",
            Self::LienRefinanced { .. } => "LienRefinanced",
            Self::LienSeized { .. } => "LienSeized",
            Self::LiensCleanedUp { .. } => "LiensCleanedUp",
            Self::NftLiquidated { .. } => "NftLiquidated",
            Self::ManagerFeeSet { .. } => "ManagerFeeSet",
            Self::ManagerFeeCollected { .. } => "ManagerFeeCollected",
            Self::Upgraded { .. } => "Upgraded",
        }
    }
}

/// An event stamped with the block it was emitted in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Block number
    pub block_height: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// The event
    pub event: VaultEvent,
}

impl LoggedEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }

    /// Compute event hash
    pub fn hash(&self) -> Hash {
        let data = bincode::serialize(self).unwrap_or_default();
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Events emitted by one call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<LoggedEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn push(&mut self, event: LoggedEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&LoggedEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Merge another event log into this one
    pub fn merge(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn logged(event: VaultEvent) -> LoggedEvent {
        LoggedEvent {
            block_height: 100,
            timestamp: 1_700_000_000,
            event,
        }
    }

    #[test]
    fn test_event_types() {
        let event = logged(VaultEvent::Mint {
            depositor: Address::derive("alice"),
            amount: 100,
            shares: 100,
        });
        assert_eq!(event.event_type(), "Mint");

        let event = VaultEvent::LiensCleanedUp { removed: vec![1, 2] };
        assert_eq!(event.event_type(), "LiensCleanedUp");
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(logged(VaultEvent::AuctionStarted { lien_id: 1, start_block: 100 }));
        log.push(logged(VaultEvent::ManagerFeeCollected {
            manager: Address::derive("manager"),
            amount: 0,
        }));

        let mut other = EventLog::new();
        other.push(logged(VaultEvent::AuctionStarted { lien_id: 2, start_block: 100 }));
        log.merge(other);

        assert_eq!(log.len(), 3);
        assert_eq!(log.filter_by_type("AuctionStarted").len(), 2);
        assert_eq!(log.filter_by_type("Burn").len(), 0);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_hash() {
        let a = logged(VaultEvent::AuctionStarted { lien_id: 1, start_block: 100 });
        let b = logged(VaultEvent::AuctionStarted { lien_id: 2, start_block: 100 });
        assert_eq!(a.hash(), a.clone().hash());
        assert_ne!(a.hash(), b.hash());
    }
}
