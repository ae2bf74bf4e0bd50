//! Auction/seizure phases of a lien.
//!
//! ```text
//! Performing --start_auction--> Auctioning --window elapses--> Seizable --seize--> Seized
//!      ^                             |
//!      +------refinance_auction------+
//! ```
//!
//! The window is inclusive: a lien whose auction started at block `s` with
//! duration `d` can be refinanced through block `s + d` and seized from block
//! `s + d + 1` on.

use serde::{Deserialize, Serialize};

use crate::core::lien::{Lien, LienId};
use crate::error::{Error, Result};

/// Where a lien sits in the auction state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// No auction running
    Performing,
    /// Auction window open; refinance allowed
    Auctioning,
    /// Auction window elapsed; collateral may be seized
    Seizable,
}

impl AuctionPhase {
    /// Classify `lien` at `block`
    pub fn of(lien: &Lien, block: u64) -> Self {
        if lien.auction_start_block == 0 {
            return AuctionPhase::Performing;
        }
        match lien.auction_start_block.checked_add(lien.auction_duration) {
            Some(end) if block > end => AuctionPhase::Seizable,
            _ => AuctionPhase::Auctioning,
        }
    }

    /// Phase name for logs
    pub fn name(&self) -> &'static str {
        match self {
            AuctionPhase::Performing => "performing",
            AuctionPhase::Auctioning => "auctioning",
            AuctionPhase::Seizable => "seizable",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSITION GUARDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Performing -> Auctioning
pub fn ensure_can_start_auction(lien: &Lien, lien_id: LienId) -> Result<()> {
    if lien.in_auction() {
        return Err(Error::AuctionAlreadyStarted(lien_id));
    }
    Ok(())
}

/// Auctioning -> Performing (refinance)
pub fn ensure_auction_active(lien: &Lien, lien_id: LienId, block: u64) -> Result<()> {
    match AuctionPhase::of(lien, block) {
        AuctionPhase::Auctioning => Ok(()),
        _ => Err(Error::AuctionNotActive(lien_id)),
    }
}

/// Seizable -> Seized
pub fn ensure_seizable(lien: &Lien, lien_id: LienId, block: u64) -> Result<()> {
    match AuctionPhase::of(lien, block) {
        AuctionPhase::Seizable => Ok(()),
        _ => Err(Error::LienNotDefaulted(lien_id)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lien::tests::sample_lien;

    #[test]
    fn test_phase_boundaries() {
        let lien = sample_lien();
        assert_eq!(lien.phase(1_000_000), AuctionPhase::Performing);

        let lien = lien.with_auction_started(100);
        let end = 100 + lien.auction_duration;
        assert_eq!(lien.phase(100), AuctionPhase::Auctioning);
        assert_eq!(lien.phase(end), AuctionPhase::Auctioning);
        assert_eq!(lien.phase(end + 1), AuctionPhase::Seizable);
    }

    #[test]
    fn test_guards() {
        let performing = sample_lien();
        assert!(ensure_can_start_auction(&performing, 1).is_ok());
        assert_eq!(ensure_auction_active(&performing, 1, 10), Err(Error::AuctionNotActive(1)));
        assert_eq!(ensure_seizable(&performing, 1, 10), Err(Error::LienNotDefaulted(1)));

        let auctioning = performing.with_auction_started(10);
        assert_eq!(
            ensure_can_start_auction(&auctioning, 1),
            Err(Error::AuctionAlreadyStarted(1))
        );
        assert!(ensure_auction_active(&auctioning, 1, 10).is_ok());
        assert_eq!(ensure_seizable(&auctioning, 1, 10), Err(Error::LienNotDefaulted(1)));

        let past_window = 10 + auctioning.auction_duration + 1;
        assert_eq!(
            ensure_auction_active(&auctioning, 1, past_window),
            Err(Error::AuctionNotActive(1))
        );
        assert!(ensure_seizable(&auctioning, 1, past_window).is_ok());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(AuctionPhase::Seizable.name(), "seizable");
    }
}
