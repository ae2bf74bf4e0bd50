//! Lien - a debt position collateralized by a single NFT.
//!
//! A lien's identity (`LienId`) is assigned by the lending protocol. The
//! protocol keeps only a content hash per id, so any lien data a caller
//! hands the vault is checked against [`Lien::hash`] before use.

use serde::{Deserialize, Serialize};

use crate::core::auction::AuctionPhase;
use crate::core::debt;
use crate::error::Result;
use crate::utils::crypto::{Address, Hash, TokenId, WordEncoder};

/// Identifier assigned by the lending protocol
pub type LienId = u64;

// ═══════════════════════════════════════════════════════════════════════════════
// LIEN
// ═══════════════════════════════════════════════════════════════════════════════

/// A debt position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lien {
    /// Current lender
    pub lender: Address,
    /// Borrower who escrowed the collateral
    pub borrower: Address,
    /// Collateral collection
    pub collection: Address,
    /// Collateral token id
    pub token_id: TokenId,
    /// Principal in the smallest currency unit
    pub amount: u128,
    /// Origination time (unix seconds)
    pub start_time: u64,
    /// Annual rate in basis points
    pub rate: u64,
    /// Block the auction started at (0 = no auction)
    pub auction_start_block: u64,
    /// Auction length in blocks
    pub auction_duration: u64,
}

impl Lien {
    /// Canonical content hash, as recorded by the lending protocol
    pub fn hash(&self) -> Hash {
        WordEncoder::new()
            .address(&self.lender)
            .address(&self.borrower)
            .address(&self.collection)
            .token_id(&self.token_id)
            .uint(self.amount)
            .uint(u128::from(self.start_time))
            .uint(u128::from(self.rate))
            .uint(u128::from(self.auction_start_block))
            .uint(u128::from(self.auction_duration))
            .finish()
    }

    /// Amount owed at `now`
    pub fn current_debt(&self, now: u64) -> Result<u128> {
        debt::current_debt(self.amount, self.rate, self.start_time, now)
    }

    /// Auction phase at `block`
    pub fn phase(&self, block: u64) -> AuctionPhase {
        AuctionPhase::of(self, block)
    }

    /// Whether an auction has been started
    pub fn in_auction(&self) -> bool {
        self.auction_start_block != 0
    }

    /// Copy of this lien with an auction started at `block`
    pub fn with_auction_started(&self, block: u64) -> Self {
        Self {
            auction_start_block: block,
            ..self.clone()
        }
    }

    /// The position re-originated to `lender` for `debt` at `rate`
    pub fn refinanced(&self, lender: Address, debt: u128, now: u64, rate: u64) -> Self {
        Self {
            lender,
            amount: debt,
            start_time: now,
            rate,
            auction_start_block: 0,
            ..self.clone()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIEN POINTER
// ═══════════════════════════════════════════════════════════════════════════════

/// A caller-supplied lien together with the id it claims to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LienPointer {
    /// Lien data as supplied
    pub lien: Lien,
    /// Claimed id
    pub lien_id: LienId,
}

impl LienPointer {
    /// Create a pointer
    pub fn new(lien: Lien, lien_id: LienId) -> Self {
        Self { lien, lien_id }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_lien() -> Lien {
        Lien {
            lender: Address::derive("lender"),
            borrower: Address::derive("borrower"),
            collection: Address::derive("collection"),
            token_id: TokenId::from(5489u64),
            amount: 5_025_306_122_850_299_158,
            start_time: 1_699_835_387,
            rate: 6480,
            auction_start_block: 0,
            auction_duration: 9000,
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let lien = sample_lien();
        assert_eq!(lien.hash(), sample_lien().hash());
        assert!(!lien.hash().is_zero());
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = sample_lien();
        let variants = vec![
            Lien { lender: Address::derive("other"), ..base.clone() },
            Lien { borrower: Address::derive("other"), ..base.clone() },
            Lien { collection: Address::derive("other"), ..base.clone() },
            Lien { token_id: TokenId::from(1u64), ..base.clone() },
            Lien { amount: base.amount + 1, ..base.clone() },
            Lien { start_time: base.start_time + 1, ..base.clone() },
            Lien { rate: base.rate + 1, ..base.clone() },
            Lien { auction_start_block: 1, ..base.clone() },
            Lien { auction_duration: 1, ..base.clone() },
        ];
        for variant in variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }

    #[test]
    fn test_refinanced_resets_auction() {
        let lien = sample_lien().with_auction_started(100);
        assert!(lien.in_auction());

        let vault = Address::derive("vault");
        let next = lien.refinanced(vault, 6_000, 1_700_000_000, 500);
        assert_eq!(next.lender, vault);
        assert_eq!(next.amount, 6_000);
        assert_eq!(next.start_time, 1_700_000_000);
        assert_eq!(next.rate, 500);
        assert!(!next.in_auction());
        assert_eq!(next.borrower, lien.borrower);
        assert_eq!(next.auction_duration, lien.auction_duration);
    }
}
