//! Utility modules for the lien vault.
//!
//! This module contains shared utilities used across the vault:
//! - Cryptographic primitives and identities
//! - Checked arithmetic
//! - Validation helpers
//! - Constants

pub mod constants;
pub mod crypto;
pub mod math;
pub mod validation;

pub use constants::*;
pub use crypto::*;
pub use math::*;
pub use validation::*;
