//! Signed liquidation settlement.
//!
//! - Signing domain and manager-signed liquidation orders
//! - Per-account nonces
//! - Virtual balances of seized collateral

pub mod order;
pub mod virtual_balance;

pub use order::*;
pub use virtual_balance::*;
