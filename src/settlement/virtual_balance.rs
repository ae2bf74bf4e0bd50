//! Virtual balances of seized collateral.
//!
//! At seizure a lien's live debt stops counting toward the vault's valuation.
//! The same amount is booked here so the valuation does not move; the sale of
//! the asset later retires it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::lien::LienId;
use crate::error::{Error, Result};
use crate::utils::crypto::{Address, TokenId};
use crate::utils::math::safe_add;

/// A seized asset held in vault custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizedAsset {
    /// Collateral collection
    pub collection: Address,
    /// Collateral token id
    pub token_id: TokenId,
    /// Debt booked at seizure
    pub virtual_balance: u128,
    /// Block of seizure
    pub seized_at_block: u64,
}

/// Outcome of retiring a virtual balance against sale proceeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retirement {
    /// Virtual balance removed
    pub retired: u128,
    /// Proceeds beyond the virtual balance (pure profit)
    pub surplus: u128,
    /// Virtual balance the proceeds did not cover (loss realised by depositors)
    pub shortfall: u128,
}

/// Global and per-lien virtual balances plus the seized assets they back
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualBalanceBook {
    total: u128,
    by_lien: HashMap<LienId, u128>,
    seized: HashMap<LienId, SeizedAsset>,
}

impl VirtualBalanceBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all per-lien virtual balances
    pub fn total(&self) -> u128 {
        self.total
    }

    /// Virtual balance attributed to `lien_id`
    pub fn of(&self, lien_id: LienId) -> u128 {
        self.by_lien.get(&lien_id).copied().unwrap_or(0)
    }

    /// Seized asset recorded for `lien_id`
    pub fn seized_asset(&self, lien_id: LienId) -> Option<&SeizedAsset> {
        self.seized.get(&lien_id)
    }

    /// Number of assets in custody
    pub fn seized_count(&self) -> usize {
        self.seized.len()
    }

    /// Book `asset.virtual_balance` for `lien_id` and take the asset into custody
    pub fn record_seizure(&mut self, lien_id: LienId, asset: SeizedAsset) -> Result<()> {
        if self.seized.contains_key(&lien_id) {
            return Err(Error::DuplicateLien(lien_id));
        }
        let per_lien = safe_add(self.of(lien_id), asset.virtual_balance)?;
        self.total = safe_add(self.total, asset.virtual_balance)?;
        self.by_lien.insert(lien_id, per_lien);
        self.seized.insert(lien_id, asset);
        Ok(())
    }

    /// Drop `lien_id`'s whole virtual balance against sale proceeds of `amount`.
    ///
    /// Nothing stays attributed to the lien: a sale below the balance realises
    /// the difference as a loss.
    pub fn retire(&mut self, lien_id: LienId, amount: u128) -> Result<Retirement> {
        let current = self.by_lien.remove(&lien_id).unwrap_or(0);
        self.total = self.total.checked_sub(current).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "virtual balance total {} below lien {} balance {}",
                self.total, lien_id, current
            ))
        })?;

        Ok(Retirement {
            retired: current,
            surplus: amount.saturating_sub(current),
            shortfall: current.saturating_sub(amount),
        })
    }

    /// Release the asset from custody
    pub fn remove_asset(&mut self, lien_id: LienId) -> Option<SeizedAsset> {
        self.seized.remove(&lien_id)
    }

    /// Whether the total equals the sum of the per-lien balances
    pub fn is_consistent(&self) -> bool {
        self.by_lien
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            == Some(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(virtual_balance: u128) -> SeizedAsset {
        SeizedAsset {
            collection: Address::derive("collection"),
            token_id: TokenId::from(7u64),
            virtual_balance,
            seized_at_block: 100,
        }
    }

    #[test]
    fn test_seizure_books_balance() {
        let mut book = VirtualBalanceBook::new();
        book.record_seizure(1, asset(500)).unwrap();
        book.record_seizure(2, asset(300)).unwrap();

        assert_eq!(book.total(), 800);
        assert_eq!(book.of(1), 500);
        assert_eq!(book.seized_asset(2).unwrap().virtual_balance, 300);
        assert_eq!(book.seized_count(), 2);
        assert_eq!(book.record_seizure(1, asset(1)), Err(Error::DuplicateLien(1)));
        assert!(book.is_consistent());
    }

    #[test]
    fn test_retire_above_balance_is_surplus() {
        let mut book = VirtualBalanceBook::new();
        book.record_seizure(1, asset(500)).unwrap();

        let outcome = book.retire(1, 650).unwrap();
        assert_eq!(outcome, Retirement { retired: 500, surplus: 150, shortfall: 0 });
        assert_eq!(book.of(1), 0);
        assert_eq!(book.total(), 0);
        assert!(book.is_consistent());
    }

    #[test]
    fn test_retire_below_balance_drops_whole_entry() {
        let mut book = VirtualBalanceBook::new();
        book.record_seizure(1, asset(500)).unwrap();
        book.record_seizure(2, asset(100)).unwrap();

        let outcome = book.retire(1, 200).unwrap();
        assert_eq!(outcome, Retirement { retired: 500, surplus: 0, shortfall: 300 });
        assert_eq!(book.of(1), 0);
        assert_eq!(book.total(), 100);

        assert_eq!(book.remove_asset(1).unwrap().virtual_balance, 500);
        assert!(book.seized_asset(1).is_none());
        assert_eq!(book.of(2), 100);
        assert!(book.is_consistent());
    }

    #[test]
    fn test_retire_unknown_lien_is_all_surplus() {
        let mut book = VirtualBalanceBook::new();
        let outcome = book.retire(9, 10).unwrap();
        assert_eq!(outcome.surplus, 10);
        assert_eq!(outcome.shortfall, 0);
        assert_eq!(book.total(), 0);
    }
}
