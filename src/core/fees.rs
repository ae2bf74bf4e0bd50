//! Manager fee.
//!
//! A fixed basis-point fee is taken from every burn. The fee is not paid out
//! on the spot: it accrues to a pot that stays inside the pool until the
//! manager collects it, and it is excluded from pooled liquidity meanwhile.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::constants::DEFAULT_MANAGER_FEE_BPS;
use crate::utils::math::{calculate_fee_bps, safe_add};
use crate::utils::validation::validate_manager_fee;

// ═══════════════════════════════════════════════════════════════════════════════
// FEE SPLIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of applying the manager fee to a gross withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Value before fee
    pub gross: u128,
    /// Fee retained for the manager
    pub fee: u128,
    /// Value paid out
    pub net: u128,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MANAGER FEE
// ═══════════════════════════════════════════════════════════════════════════════

/// Fee rate plus the uncollected fee pot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerFee {
    fee_bps: u16,
    balance: u128,
}

impl Default for ManagerFee {
    fn default() -> Self {
        Self {
            fee_bps: DEFAULT_MANAGER_FEE_BPS,
            balance: 0,
        }
    }
}

impl ManagerFee {
    /// Create with a validated rate
    pub fn new(fee_bps: u16) -> Result<Self> {
        validate_manager_fee(fee_bps)?;
        Ok(Self { fee_bps, balance: 0 })
    }

    /// Current rate in basis points
    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    /// Uncollected fees
    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Change the rate; returns the previous one
    pub fn set(&mut self, fee_bps: u16) -> Result<u16> {
        validate_manager_fee(fee_bps)?;
        Ok(std::mem::replace(&mut self.fee_bps, fee_bps))
    }

    /// Split `gross` into fee and net at the current rate
    pub fn split(&self, gross: u128) -> Result<FeeSplit> {
        let fee = calculate_fee_bps(gross, self.fee_bps)?;
        Ok(FeeSplit {
            gross,
            fee,
            net: gross - fee,
        })
    }

    /// Add `fee` to the pot
    pub fn accrue(&mut self, fee: u128) -> Result<()> {
        self.balance = safe_add(self.balance, fee)?;
        Ok(())
    }

    /// Empty the pot, returning what it held
    pub fn take(&mut self) -> u128 {
        std::mem::take(&mut self.balance)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
