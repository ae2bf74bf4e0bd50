//! # Lien Vault
//!
//! A pooled lending vault over an NFT-collateralized lending protocol.
//! Depositors pool a liquidity asset and receive fungible shares; the vault
//! takes over defaulting loans from auctions, calls its own loans, seizes
//! collateral when auctions lapse and sells seized NFTs under manager-signed
//! liquidation orders.
//!
//! ## Architecture
//!
//! - **Core**: liens, the lien store, debt accrual, auction phases, shares and fees
//! - **Settlement**: signed liquidation orders, nonces and virtual balances
//! - **External**: collaborator traits and in-memory implementations
//! - **Protocol**: the vault state machine, its operations and events
//! - **Storage**: snapshot and receipt persistence
//!
//! Share value is recomputed on every call as pooled liquidity plus the live
//! debt of open liens plus the virtual balance of seized collateral.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lien_vault::prelude::*;
//!
//! let mut vault = Vault::initialize(address, &params.encode()?, &VaultConfig::default())?;
//! let call = Call::new(depositor, VaultOperation::Mint(MintOp { amount })).with_value(amount);
//! let receipt = vault.execute(&mut env, call)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod error;
pub mod external;
pub mod protocol;
pub mod settlement;
pub mod storage;
pub mod telemetry;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        config::{InitParams, VaultConfig},
        lien::{Lien, LienId, LienPointer},
    };
    pub use crate::error::{Error, Result};
    pub use crate::external::{
        BlockContext, CollateralRegistry, Environment, LendingProtocol, LiquidityPool,
        MemoryEnvironment,
    };
    pub use crate::protocol::{
        events::{EventLog, VaultEvent},
        operations::*,
        state_machine::{OperationResult, Receipt, Vault},
    };
    pub use crate::settlement::order::{LiquidationOrder, SigningDomain};
    pub use crate::utils::crypto::{Address, Hash, KeyPair, PublicKey, Signature, TokenId};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name
pub const PROTOCOL_NAME: &str = "LienVault";
