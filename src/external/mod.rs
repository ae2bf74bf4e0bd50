//! External collaborators of the vault.
//!
//! The vault never owns the lending protocol, the liquidity asset or the
//! collateral registry. It reaches them through these traits, bundled with
//! the current block in an [`Environment`].

pub mod memory;

pub use memory::*;

use serde::{Deserialize, Serialize};

use crate::core::lien::{Lien, LienId, LienPointer};
use crate::error::Result;
use crate::utils::constants::BLOCK_TIME_SECS;
use crate::utils::crypto::{Address, Hash, TokenId};

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Block height and timestamp a call executes at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

impl BlockContext {
    /// Create a block context
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATOR TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fungible liquidity asset the vault pools
pub trait LiquidityPool {
    /// Address of the asset contract
    fn address(&self) -> Address;

    /// Balance held by `account`
    fn balance_of(&self, account: &Address) -> u128;

    /// Wrap `amount` of attached native value into `account`'s balance
    fn deposit(&mut self, account: Address, amount: u128) -> Result<()>;

    /// Unwrap `amount` from `account` and pay it out to `recipient`
    fn withdraw(&mut self, account: Address, recipient: Address, amount: u128) -> Result<()>;

    /// Move `amount` between balances
    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()>;
}

/// Ownership registry of NFT collateral
pub trait CollateralRegistry {
    /// Current owner of a token
    fn owner_of(&self, collection: &Address, token_id: &TokenId) -> Option<Address>;

    /// Move a token from `from` to `to`
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        collection: Address,
        token_id: TokenId,
    ) -> Result<()>;
}

/// External lending protocol holding the authoritative lien records
pub trait LendingProtocol {
    /// Address of the protocol
    fn address(&self) -> Address;

    /// Content hash recorded for `lien_id`, if the lien is live
    fn lien_hash(&self, lien_id: LienId) -> Option<Hash>;

    /// Call the loan: start the refinancing auction on a lien
    fn start_auction(
        &mut self,
        caller: Address,
        lien: &Lien,
        lien_id: LienId,
        block: &BlockContext,
    ) -> Result<()>;

    /// Take over a lien in auction at `rate`, paying the prior lender its
    /// current debt from `caller`'s pool balance. Returns the debt paid.
    fn refinance_auction(
        &mut self,
        pool: &mut dyn LiquidityPool,
        caller: Address,
        lien: &Lien,
        lien_id: LienId,
        rate: u64,
        block: &BlockContext,
    ) -> Result<u128>;

    /// Claim the collateral of liens whose auction elapsed unrefinanced
    fn seize(
        &mut self,
        collateral: &mut dyn CollateralRegistry,
        caller: Address,
        liens: &[LienPointer],
        block: &BlockContext,
    ) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Collaborators and block context a vault call runs against
#[derive(Debug, Clone)]
pub struct Environment<P, L, C> {
    /// Lending protocol
    pub protocol: P,
    /// Liquidity asset
    pub pool: L,
    /// Collateral registry
    pub collateral: C,
    /// Current block
    pub block: BlockContext,
}

impl<P, L, C> Environment<P, L, C> {
    /// Bundle collaborators at `block`
    pub fn new(protocol: P, pool: L, collateral: C, block: BlockContext) -> Self {
        Self {
            protocol,
            pool,
            collateral,
            block,
        }
    }

    /// Advance `blocks` blocks, moving time forward by the block time each
    pub fn mine(&mut self, blocks: u64) {
        self.block.number = self.block.number.saturating_add(blocks);
        self.block.timestamp = self
            .block
            .timestamp
            .saturating_add(blocks.saturating_mul(BLOCK_TIME_SECS));
    }

    /// Move time forward without producing blocks
    pub fn advance_time(&mut self, seconds: u64) {
        self.block.timestamp = self.block.timestamp.saturating_add(seconds);
    }
}
