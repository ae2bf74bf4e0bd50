//! Vault share token.
//!
//! This module implements the fungible shares depositors hold:
//! - Minting and burning against the vault's live valuation
//! - Balance and allowance tracking
//! - Transfer operations
//! - Supply management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::utils::constants::SHARE_DECIMALS;
use crate::utils::crypto::{Address, Hash};
use crate::utils::math::{mul_div, safe_add};
use crate::utils::validation::{validate_non_zero, validate_recipient};

// ═══════════════════════════════════════════════════════════════════════════════
// SHARE/VALUE CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Shares minted for `deposit` given the supply and the valuation taken
/// before the deposit is added.
///
/// The first deposit mints 1:1. Later deposits mint
/// `deposit * supply / underlying_before`, rounded down.
pub fn shares_for_deposit(deposit: u128, supply: u128, underlying_before: u128) -> Result<u128> {
    if supply == 0 {
        return Ok(deposit);
    }
    if underlying_before == 0 {
        return Err(Error::InsufficientLiquidity {
            required: deposit,
            available: 0,
        });
    }
    mul_div(deposit, supply, underlying_before)
}

/// Underlying value redeemable for `shares`, rounded down
pub fn value_for_shares(shares: u128, supply: u128, underlying: u128) -> Result<u128> {
    if supply == 0 {
        return Ok(0);
    }
    mul_div(shares, underlying, supply)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARE LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Share balances, allowances and total supply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLedger {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// Total supply
    total_supply: u128,
    /// Balances by holder
    balances: HashMap<Address, u128>,
    /// Allowances by owner, then spender
    allowances: HashMap<Address, HashMap<Address, u128>>,
}

impl Default for ShareLedger {
    fn default() -> Self {
        Self::new("Lien Vault Share", "LVS", SHARE_DECIMALS)
    }
}

impl ShareLedger {
    /// Create an empty ledger
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUPPLY MANAGEMENT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get total supply
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Get balance of a holder
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Mint new shares to `to`
    pub fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        validate_non_zero(amount)?;
        validate_recipient(&to)?;

        let new_supply = self.total_supply.checked_add(amount).ok_or(Error::Overflow {
            operation: "mint total supply".into(),
        })?;
        let new_balance = safe_add(self.balance_of(&to), amount)?;

        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Burn shares held by `from`
    pub fn burn(&mut self, from: Address, amount: u128) -> Result<()> {
        validate_non_zero(amount)?;

        let current_balance = self.balance_of(&from);
        if current_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: current_balance,
            });
        }

        self.set_balance(from, current_balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Transfer shares between holders
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        validate_recipient(&to)?;

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        if from == to || amount == 0 {
            return Ok(());
        }

        let new_to_balance = safe_add(self.balance_of(&to), amount)?;
        self.set_balance(from, from_balance - amount);
        self.balances.insert(to, new_to_balance);
        Ok(())
    }

    /// Allow `spender` to move up to `amount` of `owner`'s shares
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) -> Result<()> {
        validate_recipient(&spender)?;
        let owner_allowances = self.allowances.entry(owner).or_default();
        if amount == 0 {
            owner_allowances.remove(&spender);
        } else {
            owner_allowances.insert(spender, amount);
        }
        if owner_allowances.is_empty() {
            self.allowances.remove(&owner);
        }
        Ok(())
    }

    /// Remaining allowance of `spender` over `owner`'s shares
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Transfer on behalf of `owner`, spending `spender`'s allowance.
    ///
    /// An allowance of `u128::MAX` is never decremented.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        let allowed = self.allowance(&owner, &spender);
        if allowed < amount {
            return Err(Error::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }

        self.transfer(owner, to, amount)?;

        if allowed != u128::MAX {
            self.approve(owner, spender, allowed - amount)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get number of share holders
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Verify supply invariant (total_supply == sum of all balances)
    pub fn verify_supply_invariant(&self) -> bool {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, balance| acc.checked_add(*balance));
        sum == Some(self.total_supply)
    }

    /// Hash of supply and balances, independent of map order
    pub fn state_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(&self.total_supply.to_be_bytes());

        let mut sorted_balances: Vec<_> = self.balances.iter().collect();
        sorted_balances.sort_by_key(|(holder, _)| **holder);

        for (holder, balance) in sorted_balances {
            data.extend_from_slice(holder.as_bytes());
            data.extend_from_slice(&balance.to_be_bytes());
        }

        Hash::sha256(&data)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    fn set_balance(&mut self, holder: Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    #[test]
    fn test_conversion_first_deposit_is_one_to_one() {
        assert_eq!(shares_for_deposit(100, 0, 0).unwrap(), 100);
        assert_eq!(shares_for_deposit(100, 0, 5_000).unwrap(), 100);
    }

    #[test]
    fn test_conversion_uses_prior_valuation() {
        // 100 shares backed by 200 units: a 50 unit deposit buys 25 shares
        assert_eq!(shares_for_deposit(50, 100, 200).unwrap(), 25);
        assert_eq!(value_for_shares(25, 125, 250).unwrap(), 50);
        // rounds down
        assert_eq!(shares_for_deposit(1, 3, 7).unwrap(), 0);
    }

    #[test]
    fn test_conversion_with_empty_valuation() {
        assert!(matches!(
            shares_for_deposit(10, 100, 0),
            Err(Error::InsufficientLiquidity { .. })
        ));
        assert_eq!(value_for_shares(10, 0, 100).unwrap(), 0);
    }

    #[test]
    fn test_mint_and_burn() {
        let mut shares = ShareLedger::default();
        shares.mint(alice(), 1_000).unwrap();
        shares.burn(alice(), 400).unwrap();

        assert_eq!(shares.balance_of(&alice()), 600);
        assert_eq!(shares.total_supply(), 600);
        assert_eq!(shares.mint(alice(), 0), Err(Error::ZeroAmount));
        assert_eq!(shares.mint(Address::ZERO, 1), Err(Error::InvalidRecipient));
    }

    #[test]
    fn test_burn_insufficient_balance() {
        let mut shares = ShareLedger::default();
        shares.mint(alice(), 100).unwrap();
        assert_eq!(
            shares.burn(alice(), 200),
            Err(Error::InsufficientBalance {
                required: 200,
                available: 100
            })
        );
        assert_eq!(shares.burn(alice(), 0), Err(Error::ZeroAmount));
    }

    #[test]
    fn test_transfer() {
        let mut shares = ShareLedger::default();
        shares.mint(alice(), 1_000).unwrap();
        shares.transfer(alice(), bob(), 300).unwrap();

        assert_eq!(shares.balance_of(&alice()), 700);
        assert_eq!(shares.balance_of(&bob()), 300);
        assert_eq!(shares.total_supply(), 1_000);
        assert_eq!(
            shares.transfer(alice(), Address::ZERO, 1),
            Err(Error::InvalidRecipient)
        );
        assert!(shares.transfer(bob(), alice(), 301).is_err());
    }

    #[test]
    fn test_allowance_flow() {
        let mut shares = ShareLedger::default();
        shares.mint(alice(), 1_000).unwrap();
        shares.approve(alice(), bob(), 500).unwrap();
        assert_eq!(shares.allowance(&alice(), &bob()), 500);

        let carol = Address::derive("carol");
        shares.transfer_from(bob(), alice(), carol, 200).unwrap();
        assert_eq!(shares.allowance(&alice(), &bob()), 300);
        assert_eq!(shares.balance_of(&carol), 200);

        assert!(matches!(
            shares.transfer_from(bob(), alice(), carol, 301),
            Err(Error::InsufficientAllowance { .. })
        ));

        shares.approve(alice(), bob(), u128::MAX).unwrap();
        shares.transfer_from(bob(), alice(), carol, 100).unwrap();
        assert_eq!(shares.allowance(&alice(), &bob()), u128::MAX);
    }

    #[test]
    fn test_holder_count() {
        let mut shares = ShareLedger::default();
        shares.mint(alice(), 100).unwrap();
        shares.mint(bob(), 100).unwrap();
        assert_eq!(shares.holder_count(), 2);

        // Burning entire balance removes holder
        shares.burn(alice(), 100).unwrap();
        assert_eq!(shares.holder_count(), 1);
    }

    #[test]
    fn test_state_hash_deterministic() {
        let mut a = ShareLedger::default();
        let mut b = ShareLedger::default();
        a.mint(alice(), 1).unwrap();
        a.mint(bob(), 2).unwrap();
        b.mint(bob(), 2).unwrap();
        b.mint(alice(), 1).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Mint(usize, u128),
        Burn(usize, u128),
        Transfer(usize, usize, u128),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0usize..4, 1u128..1_000_000).prop_map(|(h, a)| Step::Mint(h, a)),
            (0usize..4, 1u128..1_000_000).prop_map(|(h, a)| Step::Burn(h, a)),
            (0usize..4, 0usize..4, 0u128..1_000_000).prop_map(|(f, t, a)| Step::Transfer(f, t, a)),
        ]
    }

    proptest! {
        #[test]
        fn prop_supply_conserved(steps in prop::collection::vec(step(), 1..64)) {
            let holders: Vec<Address> = (0..4).map(|i| Address::derive(&format!("holder-{}", i))).collect();
            let mut shares = ShareLedger::default();

            for step in steps {
                // failed steps must leave the ledger untouched, so results are ignored
                let _ = match step {
                    Step::Mint(h, a) => shares.mint(holders[h], a),
                    Step::Burn(h, a) => shares.burn(holders[h], a),
                    Step::Transfer(f, t, a) => shares.transfer(holders[f], holders[t], a),
                };
                prop_assert!(shares.verify_supply_invariant());
            }
        }
    }
}
