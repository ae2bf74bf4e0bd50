//! Input validation utilities for the lien vault.
//!
//! This module provides validation functions to ensure call inputs meet
//! vault requirements before any state is touched.

use crate::error::{Error, Result};
use crate::utils::constants::MAX_MANAGER_FEE_BPS;
use crate::utils::crypto::{Address, PublicKey};

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that attached value matches a non-zero amount exactly
pub fn validate_payment(amount: u128, value: u128) -> Result<()> {
    if amount == 0 || value != amount {
        return Err(Error::InvalidAmount { amount, value });
    }
    Ok(())
}

/// Validate that a non-payable call carries no value
pub fn validate_no_value(value: u128) -> Result<()> {
    if value != 0 {
        return Err(Error::InvalidAmount { amount: 0, value });
    }
    Ok(())
}

/// Validate that an amount is non-zero
pub fn validate_non_zero(amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(Error::ZeroAmount);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that a recipient is not the null identity
pub fn validate_recipient(recipient: &Address) -> Result<()> {
    if recipient.is_zero() {
        return Err(Error::InvalidRecipient);
    }
    Ok(())
}

/// Validate a public key is a real curve point
pub fn validate_public_key(pubkey: &PublicKey) -> Result<()> {
    if !pubkey.is_valid() {
        return Err(Error::InvalidParameter {
            name: "public_key".into(),
            reason: "Invalid secp256k1 public key".into(),
        });
    }
    Ok(())
}

/// Validate a collaborator address is set
pub fn validate_collaborator(address: &Address, name: &str) -> Result<()> {
    if address.is_zero() {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: "null address".into(),
        });
    }
    Ok(())
}

/// Validate a display string is non-empty
pub fn validate_label(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPORAL VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate an order deadline is set and not passed
pub fn validate_deadline(deadline: u64, now: u64) -> Result<()> {
    if deadline == 0 || now > deadline {
        return Err(Error::OutdatedOrder { deadline, now });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEE VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a manager fee against the cap
pub fn validate_manager_fee(fee_bps: u16) -> Result<()> {
    if fee_bps > MAX_MANAGER_FEE_BPS {
        return Err(Error::InvalidManagerFee {
            fee_bps,
            max_bps: MAX_MANAGER_FEE_BPS,
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
