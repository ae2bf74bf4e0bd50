//! Core modules for the lien vault.
//!
//! This module contains the fundamental building blocks:
//! - Liens, the lien store and debt accrual
//! - Auction/seizure phases
//! - Vault shares and the manager fee
//! - Configuration and the initialization payload

pub mod auction;
pub mod config;
pub mod debt;
pub mod fees;
pub mod lien;
pub mod lien_store;
pub mod shares;

pub use auction::*;
pub use config::*;
pub use fees::*;
pub use lien::*;
pub use lien_store::*;
pub use shares::*;
