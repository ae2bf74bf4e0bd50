//! Checked arithmetic for vault accounting.
//!
//! Amounts are `u128` in the smallest currency unit. Products that can exceed
//! 128 bits (share conversions, fee splits) are widened to 256 bits before
//! dividing, and every narrowing is checked.

use alloy_primitives::U256;

use crate::error::{Error, Result};
use crate::utils::constants::BPS_DIVISOR;

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(Error::Underflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Computes `(a * b) / c` with a 256-bit intermediate, rounding down
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    let result = U256::from(a) * U256::from(b) / U256::from(c);
    u256_to_u128(result).ok_or(Error::Overflow {
        operation: format!("({} * {}) / {}", a, b, c),
    })
}

/// Narrow a 256-bit value to `u128`, or `None` if it does not fit
pub fn u256_to_u128(value: U256) -> Option<u128> {
    let limbs = value.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return None;
    }
    Some((u128::from(limbs[1]) << 64) | u128::from(limbs[0]))
}

// ═══════════════════════════════════════════════════════════════════════════════
// BASIS POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fee in basis points, rounded down
pub fn calculate_fee_bps(amount: u128, fee_bps: u16) -> Result<u128> {
    mul_div(amount, u128::from(fee_bps), BPS_DIVISOR)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
