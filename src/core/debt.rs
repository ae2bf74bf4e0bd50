//! Debt Accrual Engine.
//!
//! Debt compounds continuously: `amount * e^(rate * years)`, evaluated in
//! signed 18-decimal fixed point exactly the way the lending protocol
//! evaluates it. The result feeds lien hashes the protocol re-derives, so
//! every rounding step here is part of the contract:
//!
//! - division truncates toward zero (`sdiv`)
//! - right shifts are arithmetic (round toward negative infinity)
//! - intermediate products inside `wad_exp` wrap at 256 bits
//!
//! Reference values:
//!
//! | amount | rate (bps) | elapsed | debt |
//! |---|---|---|---|
//! | 100e18 | 1000 | 365 days | 110517091807564762400 |
//! | 100e18 | 1000 | 1 day | 100027401013666092900 |
//! | 1000 | 1000 | 365 days | 1105 |

use alloy_primitives::{I256, U256};

use crate::error::{Error, Result};
use crate::utils::constants::{
    SECONDS_PER_YEAR, WAD, WAD_EXP_MAX_INPUT, WAD_EXP_MIN_INPUT,
};
use crate::utils::math::u256_to_u128;

/// ln(2) scaled by 2^96
const LN2_Q96: i128 = 54_916_777_467_707_473_351_141_471_128;

/// Final scaling factor applied to the rational approximation
const EXP_SCALE: U256 = U256::from_limbs([
    0xee70_ef65_f997_8af3,
    0x63c3_2e5c_2f6d_c192,
    0x0000_0002_9d9d_c385,
    0,
]);

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED POINT
// ═══════════════════════════════════════════════════════════════════════════════

fn int(value: i128) -> I256 {
    let magnitude = I256::from_raw(U256::from(value.unsigned_abs()));
    if value < 0 {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

fn overflow(operation: &str) -> Error {
    Error::Overflow {
        operation: operation.into(),
    }
}

/// `a * b / 1e18`, truncating toward zero
pub fn wad_mul(a: I256, b: I256) -> Result<I256> {
    a.checked_mul(b)
        .ok_or_else(|| overflow("wad_mul"))?
        .checked_div(int(WAD))
        .ok_or_else(|| overflow("wad_mul"))
}

/// `a * 1e18 / b`, truncating toward zero
pub fn wad_div(a: I256, b: I256) -> Result<I256> {
    if b == I256::ZERO {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    a.checked_mul(int(WAD))
        .ok_or_else(|| overflow("wad_div"))?
        .checked_div(b)
        .ok_or_else(|| overflow("wad_div"))
}

/// `e^x` for an 18-decimal fixed-point `x`.
///
/// Range-reduces by `k = round(x / ln 2)` and evaluates a (6, 7)-term rational
/// approximation in 2^96 fixed point.
pub fn wad_exp(x: I256) -> Result<I256> {
    if x <= int(WAD_EXP_MIN_INPUT) {
        return Ok(I256::ZERO);
    }
    if x >= int(WAD_EXP_MAX_INPUT) {
        return Err(Error::ExpOverflow);
    }

    let q96 = int(1 << 96);
    let mul_shr = |a: I256, b: I256| a.wrapping_mul(b).asr(96);

    // Move from base 10^18 to base 2^96
    let x = x
        .wrapping_mul(int(1 << 78))
        .checked_div(int(3_814_697_265_625))
        .ok_or_else(|| overflow("wad_exp"))?;

    let k = x
        .wrapping_mul(q96)
        .checked_div(int(LN2_Q96))
        .ok_or_else(|| overflow("wad_exp"))?
        .wrapping_add(int(1 << 95))
        .asr(96);
    let x = x.wrapping_sub(k.wrapping_mul(int(LN2_Q96)));

    let y = x.wrapping_add(int(1_346_386_616_545_796_478_920_950_773_328));
    let y = mul_shr(y, x).wrapping_add(int(57_155_421_227_552_351_082_224_309_758_442));
    let p = y
        .wrapping_add(x)
        .wrapping_sub(int(94_201_549_194_550_492_254_356_042_504_812));
    let p = mul_shr(p, y).wrapping_add(int(28_719_021_644_029_726_153_956_944_680_412_240));
    let p = p
        .wrapping_mul(x)
        .wrapping_add(int(4_385_272_521_454_847_904_659_076_985_693_276).wrapping_mul(q96));

    let q = x.wrapping_sub(int(2_855_989_394_907_223_263_936_484_059_900));
    let q = mul_shr(q, x).wrapping_add(int(50_020_603_652_535_783_019_961_831_881_945));
    let q = mul_shr(q, x).wrapping_sub(int(533_845_033_583_426_703_283_633_433_725_380));
    let q = mul_shr(q, x).wrapping_add(int(3_604_857_256_930_695_427_073_651_918_091_429));
    let q = mul_shr(q, x).wrapping_sub(int(14_423_608_567_350_463_180_887_372_962_807_573));
    let q = mul_shr(q, x).wrapping_add(int(26_449_188_498_355_588_339_934_803_723_976_023));

    // q has no roots in the reduced range
    let r = p.checked_div(q).ok_or_else(|| overflow("wad_exp"))?;

    let shift = int(195).wrapping_sub(k).into_raw();
    let shift = shift.as_limbs()[0] as usize;
    let scaled = r.into_raw().wrapping_mul(EXP_SCALE) >> shift;
    Ok(I256::from_raw(scaled))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBT
// ═══════════════════════════════════════════════════════════════════════════════

/// Rate in basis points as an 18-decimal fraction
pub fn bips_to_wad(rate_bps: u64) -> I256 {
    int(i128::from(rate_bps) * WAD / 10_000)
}

/// Amount owed at `now` on `amount` lent at `rate_bps` since `start_time`.
///
/// Fails with `Underflow` if `now` precedes `start_time`.
pub fn current_debt(amount: u128, rate_bps: u64, start_time: u64, now: u64) -> Result<u128> {
    let elapsed = now.checked_sub(start_time).ok_or_else(|| Error::Underflow {
        operation: format!("{} - {}", now, start_time),
    })?;

    let elapsed_wad = int(i128::from(elapsed))
        .checked_mul(int(WAD))
        .ok_or_else(|| overflow("elapsed"))?;
    let year_wad = int(i128::from(SECONDS_PER_YEAR) * WAD);
    let years = wad_div(elapsed_wad, year_wad)?;

    let growth = wad_exp(wad_mul(years, bips_to_wad(rate_bps))?)?;
    let debt = wad_mul(I256::from_raw(U256::from(amount)), growth)?;

    if debt.is_negative() {
        return Err(Error::Underflow {
            operation: "current_debt".into(),
        });
    }
    u256_to_u128(debt.into_raw()).ok_or_else(|| overflow("current_debt"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
