//! In-memory collaborators.
//!
//! These follow the lending protocol's rules closely enough to drive the
//! vault end to end: loans escrow the NFT with the protocol, the lender can
//! call a loan into auction, anyone with liquidity can refinance it while the
//! auction runs, and the lender can seize the NFT once it has elapsed.

use std::collections::{BTreeMap, HashMap};

use crate::core::auction::{ensure_auction_active, ensure_can_start_auction, ensure_seizable};
use crate::core::lien::{Lien, LienId, LienPointer};
use crate::error::{Error, Result};
use crate::external::{BlockContext, CollateralRegistry, Environment, LendingProtocol, LiquidityPool};
use crate::utils::crypto::{Address, Hash, TokenId};
use crate::utils::math::safe_add;

/// Environment wired with the in-memory collaborators
pub type MemoryEnvironment =
    Environment<MemoryLendingProtocol, MemoryLiquidityPool, MemoryCollateralRegistry>;

impl MemoryEnvironment {
    /// Fresh collaborators at the given addresses
    pub fn in_memory(protocol: Address, pool: Address, block: BlockContext) -> Self {
        Environment::new(
            MemoryLendingProtocol::new(protocol),
            MemoryLiquidityPool::new(pool),
            MemoryCollateralRegistry::new(),
            block,
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDITY POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Wrapped-native liquidity asset
#[derive(Debug, Clone, Default)]
pub struct MemoryLiquidityPool {
    address: Address,
    balances: HashMap<Address, u128>,
    paid_out: HashMap<Address, u128>,
}

impl MemoryLiquidityPool {
    /// Create an empty pool
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// Fund `account` directly
    pub fn credit(&mut self, account: Address, amount: u128) -> Result<()> {
        let balance = safe_add(self.balance_of(&account), amount)?;
        self.balances.insert(account, balance);
        Ok(())
    }

    /// Native value paid out to `recipient` by withdrawals
    pub fn paid_out(&self, recipient: &Address) -> u128 {
        self.paid_out.get(recipient).copied().unwrap_or(0)
    }

    fn debit(&mut self, account: Address, amount: u128) -> Result<()> {
        let balance = self.balance_of(&account);
        if balance < amount {
            return Err(Error::external(
                "liquidity_pool",
                format!("balance {} below {}", balance, amount),
            ));
        }
        self.balances.insert(account, balance - amount);
        Ok(())
    }
}

impl LiquidityPool for MemoryLiquidityPool {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn deposit(&mut self, account: Address, amount: u128) -> Result<()> {
        self.credit(account, amount)
    }

    fn withdraw(&mut self, account: Address, recipient: Address, amount: u128) -> Result<()> {
        self.debit(account, amount)?;
        let paid = safe_add(self.paid_out(&recipient), amount)?;
        self.paid_out.insert(recipient, paid);
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// NFT ownership table across collections
#[derive(Debug, Clone, Default)]
pub struct MemoryCollateralRegistry {
    owners: HashMap<(Address, TokenId), Address>,
}

impl MemoryCollateralRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token to `owner`
    pub fn mint(&mut self, collection: Address, token_id: TokenId, owner: Address) -> Result<()> {
        if self.owners.contains_key(&(collection, token_id)) {
            return Err(Error::external(
                "collateral_registry",
                format!("token {} already minted", token_id),
            ));
        }
        self.owners.insert((collection, token_id), owner);
        Ok(())
    }
}

impl CollateralRegistry for MemoryCollateralRegistry {
    fn owner_of(&self, collection: &Address, token_id: &TokenId) -> Option<Address> {
        self.owners.get(&(*collection, *token_id)).copied()
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        collection: Address,
        token_id: TokenId,
    ) -> Result<()> {
        if to.is_zero() {
            return Err(Error::InvalidRecipient);
        }
        match self.owners.get_mut(&(collection, token_id)) {
            Some(owner) if *owner == from => {
                *owner = to;
                Ok(())
            }
            _ => Err(Error::external(
                "collateral_registry",
                format!("{} does not own token {}", from, token_id),
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LENDING PROTOCOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Terms of a new loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    /// Lender funding the loan
    pub lender: Address,
    /// Borrower escrowing the NFT
    pub borrower: Address,
    /// Collateral collection
    pub collection: Address,
    /// Collateral token id
    pub token_id: TokenId,
    /// Principal
    pub amount: u128,
    /// Annual rate in basis points
    pub rate: u64,
    /// Auction length in blocks
    pub auction_duration: u64,
}

/// Lending protocol keeping full lien records
#[derive(Debug, Clone, Default)]
pub struct MemoryLendingProtocol {
    address: Address,
    liens: BTreeMap<LienId, Lien>,
    next_id: LienId,
}

impl MemoryLendingProtocol {
    /// Create a protocol with no liens
    pub fn new(address: Address) -> Self {
        Self {
            address,
            liens: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Current record for `lien_id`
    pub fn lien(&self, lien_id: LienId) -> Option<&Lien> {
        self.liens.get(&lien_id)
    }

    /// Number of live liens
    pub fn lien_count(&self) -> usize {
        self.liens.len()
    }

    /// Open a loan: escrow the NFT and pay the principal to the borrower
    pub fn originate(
        &mut self,
        pool: &mut dyn LiquidityPool,
        collateral: &mut dyn CollateralRegistry,
        terms: LoanTerms,
        block: &BlockContext,
    ) -> Result<(LienId, Lien)> {
        if terms.amount == 0 {
            return Err(Error::ZeroAmount);
        }
        collateral.transfer(terms.borrower, self.address, terms.collection, terms.token_id)?;
        pool.transfer(terms.lender, terms.borrower, terms.amount)?;

        let lien = Lien {
            lender: terms.lender,
            borrower: terms.borrower,
            collection: terms.collection,
            token_id: terms.token_id,
            amount: terms.amount,
            start_time: block.timestamp,
            rate: terms.rate,
            auction_start_block: 0,
            auction_duration: terms.auction_duration,
        };
        let lien_id = self.next_id;
        self.next_id += 1;
        self.liens.insert(lien_id, lien.clone());
        Ok((lien_id, lien))
    }

    /// Borrower repays the current debt and takes the NFT back
    pub fn repay(
        &mut self,
        pool: &mut dyn LiquidityPool,
        collateral: &mut dyn CollateralRegistry,
        caller: Address,
        lien: &Lien,
        lien_id: LienId,
        block: &BlockContext,
    ) -> Result<u128> {
        self.verify(lien, lien_id)?;
        if caller != lien.borrower {
            return Err(Error::external("lending_protocol", "caller is not the borrower"));
        }
        let debt = lien.current_debt(block.timestamp)?;
        pool.transfer(caller, lien.lender, debt)?;
        collateral.transfer(self.address, lien.borrower, lien.collection, lien.token_id)?;
        self.liens.remove(&lien_id);
        Ok(debt)
    }

    fn verify(&self, lien: &Lien, lien_id: LienId) -> Result<()> {
        match self.liens.get(&lien_id) {
            Some(stored) if stored.hash() == lien.hash() => Ok(()),
            _ => Err(Error::LienHashMismatch(lien_id)),
        }
    }
}

impl LendingProtocol for MemoryLendingProtocol {
    fn address(&self) -> Address {
        self.address
    }

    fn lien_hash(&self, lien_id: LienId) -> Option<Hash> {
        self.liens.get(&lien_id).map(Lien::hash)
    }

    fn start_auction(
        &mut self,
        caller: Address,
        lien: &Lien,
        lien_id: LienId,
        block: &BlockContext,
    ) -> Result<()> {
        self.verify(lien, lien_id)?;
        if caller != lien.lender {
            return Err(Error::external("lending_protocol", "caller is not the lender"));
        }
        ensure_can_start_auction(lien, lien_id)?;
        self.liens
            .insert(lien_id, lien.with_auction_started(block.number));
        Ok(())
    }

    fn refinance_auction(
        &mut self,
        pool: &mut dyn LiquidityPool,
        caller: Address,
        lien: &Lien,
        lien_id: LienId,
        rate: u64,
        block: &BlockContext,
    ) -> Result<u128> {
        self.verify(lien, lien_id)?;
        ensure_auction_active(lien, lien_id, block.number)?;

        let debt = lien.current_debt(block.timestamp)?;
        pool.transfer(caller, lien.lender, debt)?;

        self.liens
            .insert(lien_id, lien.refinanced(caller, debt, block.timestamp, rate));
        Ok(debt)
    }

    fn seize(
        &mut self,
        collateral: &mut dyn CollateralRegistry,
        caller: Address,
        liens: &[LienPointer],
        block: &BlockContext,
    ) -> Result<()> {
        for pointer in liens {
            self.verify(&pointer.lien, pointer.lien_id)?;
            if caller != pointer.lien.lender {
                return Err(Error::external("lending_protocol", "caller is not the lender"));
            }
            ensure_seizable(&pointer.lien, pointer.lien_id, block.number)?;
        }
        for pointer in liens {
            let lien = &pointer.lien;
            collateral.transfer(self.address, lien.lender, lien.collection, lien.token_id)?;
            self.liens.remove(&pointer.lien_id);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
