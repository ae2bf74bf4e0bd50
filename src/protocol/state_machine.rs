//! Vault State Machine - core orchestration engine.
//!
//! The vault is the central coordinator for all operations. It owns the
//! share ledger, the lien store, virtual balances, nonces and the fee pot,
//! and reaches the lending protocol, liquidity asset and collateral registry
//! only through the [`Environment`] passed into each call.
//!
//! Every call is atomic: on any error the vault and the collaborators are
//! restored to their state before the call and no events are emitted. Each
//! call checkpoints only the components its operation can write.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::core::auction::{ensure_auction_active, ensure_can_start_auction, ensure_seizable};
use crate::core::config::{InitParams, VaultConfig};
use crate::core::fees::ManagerFee;
use crate::core::lien::{Lien, LienId};
use crate::core::lien_store::{LienEntry, LienSlice, LienStore};
use crate::core::shares::{shares_for_deposit, value_for_shares, ShareLedger};
use crate::error::{Error, Result};
use crate::external::{BlockContext, CollateralRegistry, Environment, LendingProtocol, LiquidityPool};
use crate::protocol::events::*;
use crate::protocol::operations::*;
use crate::settlement::order::{LiquidationOrder, NonceRegistry, SigningDomain};
use crate::settlement::virtual_balance::{SeizedAsset, VirtualBalanceBook};
use crate::utils::crypto::{Address, Hash, PublicKey};
use crate::utils::math::safe_add;
use crate::utils::validation::{
    validate_collaborator, validate_deadline, validate_no_value, validate_non_zero,
    validate_payment, validate_recipient,
};

// ═══════════════════════════════════════════════════════════════════════════════
// IMPLEMENTATION RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// Implementation currently behind the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Hash of the implementation
    pub hash: Hash,
    /// Incremented on every upgrade
    pub version: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT
// ═══════════════════════════════════════════════════════════════════════════════

/// The lien vault aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    /// Address of the vault itself
    address: Address,
    /// Manager signing key
    manager: PublicKey,
    /// Address derived from the manager key
    manager_address: Address,
    /// Liquidity asset named at initialization
    liquidity_pool: Address,
    /// Lending protocol named at initialization
    lending_protocol: Address,
    /// Domain liquidation orders are signed under
    domain: SigningDomain,
    /// Shares
    shares: ShareLedger,
    /// Tracked liens
    liens: LienStore,
    /// Virtual balances and seized assets
    virtual_balances: VirtualBalanceBook,
    /// Per-caller liquidation nonces
    nonces: NonceRegistry,
    /// Manager fee and pot
    fee: ManagerFee,
    /// Current implementation
    implementation: Implementation,
}

impl Vault {
    /// Deploy a vault at `address` from an encoded [`InitParams`] payload
    pub fn initialize(address: Address, payload: &[u8], config: &VaultConfig) -> Result<Self> {
        validate_collaborator(&address, "vault")?;
        config.validate()?;
        let params = InitParams::decode(payload)?;

        let manager_address = Address::from_public_key(&params.manager);
        let domain = SigningDomain::new(
            params.name.clone(),
            config.domain_version.clone(),
            config.chain_id,
            address,
        );

        info!(
            "Vault {} initialized: manager {}, pool {}, protocol {}",
            address, manager_address, params.liquidity_pool, params.lending_protocol
        );

        Ok(Self {
            address,
            manager: params.manager,
            manager_address,
            liquidity_pool: params.liquidity_pool,
            lending_protocol: params.lending_protocol,
            domain,
            shares: ShareLedger::new(params.name, params.symbol, config.share_decimals),
            liens: LienStore::new(),
            virtual_balances: VirtualBalanceBook::new(),
            nonces: NonceRegistry::new(),
            fee: ManagerFee::new(config.initial_manager_fee_bps)?,
            implementation: Implementation {
                hash: Hash::zero(),
                version: 1,
            },
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CALL EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Execute a call atomically
    pub fn execute<P, L, C>(&mut self, env: &mut Environment<P, L, C>, call: Call) -> Result<Receipt>
    where
        P: LendingProtocol + Clone,
        L: LiquidityPool + Clone,
        C: CollateralRegistry + Clone,
    {
        let checkpoint = Checkpoint::capture(self, env, Footprint::of(&call.operation));

        let mut events = EventLog::new();
        let outcome = self.check_collaborators(env).and_then(|_| {
            self.dispatch(env, call.caller, call.value, &call.operation, &mut events, false)
        });

        match outcome {
            Ok(result) => Ok(Receipt { result, events }),
            Err(e) => {
                checkpoint.restore(self, env);
                warn!(
                    "{} from {} rejected [{}]: {}",
                    call.operation.operation_type(),
                    call.caller,
                    e.code(),
                    e
                );
                Err(e)
            }
        }
    }

    fn check_collaborators<P, L, C>(&self, env: &Environment<P, L, C>) -> Result<()>
    where
        P: LendingProtocol,
        L: LiquidityPool,
    {
        let pairs = [
            ("liquidity_pool", self.liquidity_pool, env.pool.address()),
            ("lending_protocol", self.lending_protocol, env.protocol.address()),
        ];
        for (role, expected, got) in pairs {
            if expected != got {
                return Err(Error::UnexpectedCollaborator {
                    role: role.into(),
                    expected: expected.to_hex(),
                    got: got.to_hex(),
                });
            }
        }
        Ok(())
    }

    fn dispatch<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        caller: Address,
        value: u128,
        operation: &VaultOperation,
        events: &mut EventLog,
        nested: bool,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
        L: LiquidityPool,
        C: CollateralRegistry,
    {
        if !operation.payable() {
            validate_no_value(value)?;
        }
        if operation.manager_only() {
            self.ensure_manager(&caller)?;
        }

        match operation {
            VaultOperation::Mint(op) => self.execute_mint(env, caller, value, op, events),
            VaultOperation::Burn(op) => self.execute_burn(env, caller, op, events),
            VaultOperation::Transfer(op) => self.execute_transfer(env, caller, op, events),
            VaultOperation::Approve(op) => self.execute_approve(env, caller, op, events),
            VaultOperation::TransferFrom(op) => self.execute_transfer_from(env, caller, op, events),
            VaultOperation::StartAuction(op) => self.execute_start_auction(env, op, events),
            VaultOperation::RefinanceAuction(op) => self.execute_refinance(env, op, events),
            VaultOperation::Seize(op) => self.execute_seize(env, op, events),
            VaultOperation::CleanUpLiens(_) => self.execute_clean_up(env, events),
            VaultOperation::LiquidateNft(op) => {
                self.execute_liquidate_nft(env, caller, value, op, events)
            }
            VaultOperation::SetManagerFee(op) => self.execute_set_fee(env, op, events),
            VaultOperation::CollectManagerFee(_) => self.execute_collect_fee(env, events),
            VaultOperation::UpgradeToAndCall(op) => {
                if nested {
                    return Err(Error::InvalidParameter {
                        name: "call".into(),
                        reason: "nested upgrade".into(),
                    });
                }
                self.execute_upgrade(env, op, events)
            }
        }
    }

    fn ensure_manager(&self, caller: &Address) -> Result<()> {
        if *caller != self.manager_address {
            return Err(Error::Unauthorized(format!("{} is not the manager", caller)));
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SHARE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn execute_mint<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        caller: Address,
        value: u128,
        op: &MintOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
        L: LiquidityPool,
    {
        validate_payment(op.amount, value)?;

        // Valuation is taken before the deposit lands
        let supply = self.shares.total_supply();
        let underlying_before = if supply == 0 {
            0
        } else {
            self.underlying_balance(env)?
        };
        let shares = shares_for_deposit(op.amount, supply, underlying_before)?;
        if shares == 0 {
            return Err(Error::InvalidAmount {
                amount: op.amount,
                value,
            });
        }

        env.pool.deposit(self.address, op.amount)?;
        self.shares.mint(caller, shares)?;

        info!("Minted {} shares to {} for {}", shares, caller, op.amount);
        emit(events, &env.block, VaultEvent::Mint {
            depositor: caller,
            amount: op.amount,
            shares,
        });

        Ok(OperationResult::Minted { shares })
    }

    fn execute_burn<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        caller: Address,
        op: &BurnOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
        L: LiquidityPool,
    {
        validate_non_zero(op.shares)?;
        let balance = self.shares.balance_of(&caller);
        if balance < op.shares {
            return Err(Error::InsufficientBalance {
                required: op.shares,
                available: balance,
            });
        }

        let underlying = self.underlying_balance(env)?;
        let gross = value_for_shares(op.shares, self.shares.total_supply(), underlying)?;
        let split = self.fee.split(gross)?;

        let liquidity = self.pooled_liquidity(env)?;
        if split.gross > liquidity {
            return Err(Error::InsufficientLiquidity {
                required: split.gross,
                available: liquidity,
            });
        }

        self.shares.burn(caller, op.shares)?;
        self.fee.accrue(split.fee)?;
        if split.net > 0 {
            env.pool.withdraw(self.address, caller, split.net)?;
        }

        info!(
            "Burned {} shares from {}: paid {}, fee {}",
            op.shares, caller, split.net, split.fee
        );
        emit(events, &env.block, VaultEvent::Burn {
            holder: caller,
            shares: op.shares,
            fee: split.fee,
            net: split.net,
        });

        Ok(OperationResult::Burned {
            net: split.net,
            fee: split.fee,
        })
    }

    fn execute_transfer<P, L, C>(
        &mut self,
        env: &Environment<P, L, C>,
        caller: Address,
        op: &TransferOp,
        events: &mut EventLog,
    ) -> Result<OperationResult> {
        self.shares.transfer(caller, op.to, op.amount)?;
        emit(events, &env.block, VaultEvent::Transfer {
            from: caller,
            to: op.to,
            amount: op.amount,
        });
        Ok(OperationResult::Transferred)
    }

    fn execute_approve<P, L, C>(
        &mut self,
        env: &Environment<P, L, C>,
        caller: Address,
        op: &ApproveOp,
        events: &mut EventLog,
    ) -> Result<OperationResult> {
        self.shares.approve(caller, op.spender, op.amount)?;
        emit(events, &env.block, VaultEvent::Approval {
            owner: caller,
            spender: op.spender,
            amount: op.amount,
        });
        Ok(OperationResult::Approved)
    }

    fn execute_transfer_from<P, L, C>(
        &mut self,
        env: &Environment<P, L, C>,
        caller: Address,
        op: &TransferFromOp,
        events: &mut EventLog,
    ) -> Result<OperationResult> {
        self.shares.transfer_from(caller, op.owner, op.to, op.amount)?;
        emit(events, &env.block, VaultEvent::Transfer {
            from: op.owner,
            to: op.to,
            amount: op.amount,
        });
        Ok(OperationResult::Transferred)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LIEN OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn execute_start_auction<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        op: &StartAuctionOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
    {
        verify_lien(&env.protocol, &op.lien, op.lien_id)?;
        if !self.liens.contains(op.lien_id) {
            return Err(Error::UnknownLien(op.lien_id));
        }
        if op.lien.lender != self.address {
            return Err(Error::NotLender(op.lien_id));
        }
        ensure_can_start_auction(&op.lien, op.lien_id)?;

        env.protocol
            .start_auction(self.address, &op.lien, op.lien_id, &env.block)?;

        let updated = op.lien.with_auction_started(env.block.number);
        verify_lien(&env.protocol, &updated, op.lien_id)?;
        self.liens.replace(op.lien_id, updated)?;

        info!("Auction started on lien {} at block {}", op.lien_id, env.block.number);
        emit(events, &env.block, VaultEvent::AuctionStarted {
            lien_id: op.lien_id,
            start_block: env.block.number,
        });

        Ok(OperationResult::AuctionStarted {
            start_block: env.block.number,
        })
    }

    fn execute_refinance<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        op: &RefinanceAuctionOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
        L: LiquidityPool,
    {
        verify_lien(&env.protocol, &op.lien, op.lien_id)?;
        ensure_auction_active(&op.lien, op.lien_id, env.block.number)?;

        let now = env.block.timestamp;
        let debt = op.lien.current_debt(now)?;
        let liquidity = self.pooled_liquidity(env)?;
        if debt > liquidity {
            return Err(Error::InsufficientLiquidity {
                required: debt,
                available: liquidity,
            });
        }

        let paid = env.protocol.refinance_auction(
            &mut env.pool,
            self.address,
            &op.lien,
            op.lien_id,
            op.rate,
            &env.block,
        )?;
        if paid != debt {
            return Err(Error::external(
                "lending_protocol",
                format!("charged {} for a debt of {}", paid, debt),
            ));
        }

        let refinanced = op.lien.refinanced(self.address, debt, now, op.rate);
        verify_lien(&env.protocol, &refinanced, op.lien_id)?;
        if self.liens.contains(op.lien_id) {
            self.liens.replace(op.lien_id, refinanced)?;
        } else {
            self.liens.record(refinanced, op.lien_id)?;
        }

        info!(
            "Refinanced lien {} for {} at {}bps",
            op.lien_id, debt, op.rate
        );
        emit(events, &env.block, VaultEvent::LienRefinanced {
            lien_id: op.lien_id,
            debt,
            rate: op.rate,
        });

        Ok(OperationResult::Refinanced { debt })
    }

    fn execute_seize<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        op: &SeizeOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
        C: CollateralRegistry,
    {
        let now = env.block.timestamp;
        let mut seen = HashSet::with_capacity(op.liens.len());
        let mut debts = Vec::with_capacity(op.liens.len());

        for pointer in &op.liens {
            if !seen.insert(pointer.lien_id) {
                return Err(Error::DuplicateLien(pointer.lien_id));
            }
            verify_lien(&env.protocol, &pointer.lien, pointer.lien_id)?;
            if pointer.lien.lender != self.address {
                return Err(Error::NotLender(pointer.lien_id));
            }
            ensure_seizable(&pointer.lien, pointer.lien_id, env.block.number)?;
            debts.push(pointer.lien.current_debt(now)?);
        }

        env.protocol
            .seize(&mut env.collateral, self.address, &op.liens, &env.block)?;

        let mut total = 0u128;
        for (pointer, debt) in op.liens.iter().zip(debts) {
            let lien = &pointer.lien;
            self.virtual_balances.record_seizure(
                pointer.lien_id,
                SeizedAsset {
                    collection: lien.collection,
                    token_id: lien.token_id,
                    virtual_balance: debt,
                    seized_at_block: env.block.number,
                },
            )?;
            total = safe_add(total, debt)?;

            info!(
                "Seized lien {} ({} #{}), virtual balance {}",
                pointer.lien_id, lien.collection, lien.token_id, debt
            );
            emit(events, &env.block, VaultEvent::LienSeized {
                lien_id: pointer.lien_id,
                collection: lien.collection,
                token_id: lien.token_id,
                virtual_balance: debt,
            });
        }

        Ok(OperationResult::Seized {
            virtual_balance: total,
        })
    }

    fn execute_clean_up<P, L, C>(
        &mut self,
        env: &Environment<P, L, C>,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
    {
        let protocol = &env.protocol;
        let removed = self.liens.retain(|entry| is_open(protocol, entry));

        if !removed.is_empty() {
            info!("Cleaned up {} liens: {:?}", removed.len(), removed);
        }
        let count = removed.len();
        emit(events, &env.block, VaultEvent::LiensCleanedUp { removed });

        Ok(OperationResult::CleanedUp { removed: count })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SETTLEMENT
    // ═══════════════════════════════════════════════════════════════════════════

    fn execute_liquidate_nft<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        caller: Address,
        value: u128,
        op: &LiquidateNftOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        L: LiquidityPool,
        C: CollateralRegistry,
    {
        validate_payment(op.amount, value)?;
        validate_recipient(&op.recipient)?;
        validate_deadline(op.deadline, env.block.timestamp)?;

        let order = LiquidationOrder {
            collection: op.collection,
            token_id: op.token_id,
            amount: op.amount,
            recipient: op.recipient,
            nonce: self.nonces.current(&caller),
            deadline: op.deadline,
        };
        order.verify(&self.domain, &self.manager, &op.signature)?;

        match self.virtual_balances.seized_asset(op.lien_id) {
            Some(asset) if asset.collection == op.collection && asset.token_id == op.token_id => {}
            _ => return Err(Error::UnknownSeizedAsset(op.lien_id)),
        }

        env.collateral
            .transfer(self.address, op.recipient, op.collection, op.token_id)?;
        env.pool.deposit(self.address, op.amount)?;

        let retirement = self.virtual_balances.retire(op.lien_id, op.amount)?;
        self.virtual_balances.remove_asset(op.lien_id);
        let nonce = self.nonces.consume(caller)?;

        info!(
            "Liquidated {} #{} from lien {} to {} for {} (surplus {}, shortfall {})",
            op.collection,
            op.token_id,
            op.lien_id,
            op.recipient,
            op.amount,
            retirement.surplus,
            retirement.shortfall
        );
        emit(events, &env.block, VaultEvent::NftLiquidated {
            lien_id: op.lien_id,
            collection: op.collection,
            token_id: op.token_id,
            amount: op.amount,
            recipient: op.recipient,
        });

        Ok(OperationResult::Liquidated {
            nonce,
            surplus: retirement.surplus,
            shortfall: retirement.shortfall,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ADMIN OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn execute_set_fee<P, L, C>(
        &mut self,
        env: &Environment<P, L, C>,
        op: &SetManagerFeeOp,
        events: &mut EventLog,
    ) -> Result<OperationResult> {
        let old_fee_bps = self.fee.set(op.fee_bps)?;

        info!("Manager fee {}bps -> {}bps", old_fee_bps, op.fee_bps);
        emit(events, &env.block, VaultEvent::ManagerFeeSet {
            old_fee_bps,
            new_fee_bps: op.fee_bps,
        });

        Ok(OperationResult::ManagerFeeSet { old_fee_bps })
    }

    fn execute_collect_fee<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        L: LiquidityPool,
    {
        let amount = self.fee.take();
        if amount > 0 {
            env.pool
                .withdraw(self.address, self.manager_address, amount)?;
        }

        info!("Collected {} in manager fees", amount);
        emit(events, &env.block, VaultEvent::ManagerFeeCollected {
            manager: self.manager_address,
            amount,
        });

        Ok(OperationResult::ManagerFeeCollected { amount })
    }

    fn execute_upgrade<P, L, C>(
        &mut self,
        env: &mut Environment<P, L, C>,
        op: &UpgradeToAndCallOp,
        events: &mut EventLog,
    ) -> Result<OperationResult>
    where
        P: LendingProtocol,
        L: LiquidityPool,
        C: CollateralRegistry,
    {
        if op.implementation.is_zero() {
            return Err(Error::InvalidParameter {
                name: "implementation".into(),
                reason: "zero hash".into(),
            });
        }
        let follow_up = op.decode_call()?;

        self.implementation = Implementation {
            hash: op.implementation,
            version: self.implementation.version + 1,
        };

        info!(
            "Upgraded to {} (version {})",
            op.implementation, self.implementation.version
        );
        emit(events, &env.block, VaultEvent::Upgraded {
            implementation: op.implementation,
            version: self.implementation.version,
        });

        let follow_up = match follow_up {
            Some(operation) => {
                let manager = self.manager_address;
                Some(Box::new(self.dispatch(env, manager, 0, &operation, events, true)?))
            }
            None => None,
        };

        Ok(OperationResult::Upgraded {
            version: self.implementation.version,
            follow_up,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALUATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Liquidity held in the pool on behalf of depositors (excludes the fee pot)
    pub fn pooled_liquidity<P, L, C>(&self, env: &Environment<P, L, C>) -> Result<u128>
    where
        L: LiquidityPool,
    {
        let held = env.pool.balance_of(&self.address);
        held.checked_sub(self.fee.balance()).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "pool balance {} below fee pot {}",
                held,
                self.fee.balance()
            ))
        })
    }

    /// Live debt of every open lien the vault tracks
    pub fn currently_owned_debt<P, L, C>(&self, env: &Environment<P, L, C>) -> Result<u128>
    where
        P: LendingProtocol,
    {
        let now = env.block.timestamp;
        self.liens
            .iter()
            .filter(|entry| is_open(&env.protocol, entry))
            .try_fold(0u128, |acc, entry| safe_add(acc, entry.lien.current_debt(now)?))
    }

    /// Pooled liquidity plus open debt plus virtual balances, recomputed on
    /// every call
    pub fn underlying_balance<P, L, C>(&self, env: &Environment<P, L, C>) -> Result<u128>
    where
        P: LendingProtocol,
        L: LiquidityPool,
    {
        let liquidity = self.pooled_liquidity(env)?;
        let debt = self.currently_owned_debt(env)?;
        let virtual_balance = self.virtual_balances.total();
        debug!(
            "Valuation at {}: liquidity {}, debt {}, virtual {}",
            env.block.timestamp, liquidity, debt, virtual_balance
        );
        safe_add(safe_add(liquidity, debt)?, virtual_balance)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Share token name
    pub fn name(&self) -> &str {
        &self.shares.name
    }

    /// Share token symbol
    pub fn symbol(&self) -> &str {
        &self.shares.symbol
    }

    /// Share decimals
    pub fn decimals(&self) -> u8 {
        self.shares.decimals
    }

    /// Vault address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Manager signing key
    pub fn manager(&self) -> &PublicKey {
        &self.manager
    }

    /// Manager address
    pub fn manager_address(&self) -> Address {
        self.manager_address
    }

    /// Domain liquidation orders are signed under
    pub fn signing_domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// Current implementation
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Number of tracked liens
    pub fn liens_count(&self) -> usize {
        self.liens.len()
    }

    /// Tracked liens `start..start + count`
    pub fn get_liens_by_index(&self, start: usize, count: usize) -> Result<LienSlice<'_>> {
        self.liens.get_by_index(start, count)
    }

    /// Tracked entry for `lien_id`
    pub fn lien(&self, lien_id: LienId) -> Option<&LienEntry> {
        self.liens.get(lien_id)
    }

    /// Current liquidation nonce of `account`
    pub fn nonces(&self, account: &Address) -> u64 {
        self.nonces.current(account)
    }

    /// Total virtual balance
    pub fn virtual_balance(&self) -> u128 {
        self.virtual_balances.total()
    }

    /// Virtual balance attributed to `lien_id`
    pub fn lien_id_to_virtual_balance(&self, lien_id: LienId) -> u128 {
        self.virtual_balances.of(lien_id)
    }

    /// Seized asset in custody for `lien_id`
    pub fn seized_asset(&self, lien_id: LienId) -> Option<&SeizedAsset> {
        self.virtual_balances.seized_asset(lien_id)
    }

    /// Manager fee in basis points
    pub fn manager_fee(&self) -> u16 {
        self.fee.fee_bps()
    }

    /// Uncollected manager fees
    pub fn manager_balance(&self) -> u128 {
        self.fee.balance()
    }

    /// Share balance of `owner`
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.shares.balance_of(owner)
    }

    /// Share allowance of `spender` over `owner`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.shares.allowance(owner, spender)
    }

    /// Total share supply
    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    /// Check the internal bookkeeping invariants
    pub fn verify_invariants(&self) -> Result<()> {
        if !self.shares.verify_supply_invariant() {
            return Err(Error::InvariantViolation("share supply".into()));
        }
        if !self.liens.is_consistent() {
            return Err(Error::InvariantViolation("lien index".into()));
        }
        if !self.virtual_balances.is_consistent() {
            return Err(Error::InvariantViolation("virtual balance total".into()));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHECKPOINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Vault components and collaborators an operation may write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Footprint {
    shares: bool,
    liens: bool,
    virtual_balances: bool,
    nonces: bool,
    fee: bool,
    implementation: bool,
    protocol: bool,
    pool: bool,
    collateral: bool,
}

impl Footprint {
    fn of(operation: &VaultOperation) -> Self {
        let none = Self::default();
        match operation {
            VaultOperation::Mint(_) => Self { shares: true, pool: true, ..none },
            VaultOperation::Burn(_) => Self { shares: true, fee: true, pool: true, ..none },
            VaultOperation::Transfer(_)
            | VaultOperation::Approve(_)
            | VaultOperation::TransferFrom(_) => Self { shares: true, ..none },
            VaultOperation::StartAuction(_) => Self { liens: true, protocol: true, ..none },
            VaultOperation::RefinanceAuction(_) => Self {
                liens: true,
                protocol: true,
                pool: true,
                ..none
            },
            VaultOperation::Seize(_) => Self {
                virtual_balances: true,
                protocol: true,
                collateral: true,
                ..none
            },
            VaultOperation::CleanUpLiens(_) => Self { liens: true, ..none },
            VaultOperation::LiquidateNft(_) => Self {
                virtual_balances: true,
                nonces: true,
                pool: true,
                collateral: true,
                ..none
            },
            VaultOperation::SetManagerFee(_) => Self { fee: true, ..none },
            VaultOperation::CollectManagerFee(_) => Self { fee: true, pool: true, ..none },
            VaultOperation::UpgradeToAndCall(op) => {
                let upgrade = Self { implementation: true, ..none };
                match op.decode_call() {
                    Ok(Some(follow_up)) => upgrade.union(Self::of(&follow_up)),
                    _ => upgrade,
                }
            }
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            shares: self.shares || other.shares,
            liens: self.liens || other.liens,
            virtual_balances: self.virtual_balances || other.virtual_balances,
            nonces: self.nonces || other.nonces,
            fee: self.fee || other.fee,
            implementation: self.implementation || other.implementation,
            protocol: self.protocol || other.protocol,
            pool: self.pool || other.pool,
            collateral: self.collateral || other.collateral,
        }
    }
}

/// Copies of the state a call may write, taken before it runs.
///
/// Only the components in the operation's [`Footprint`] are cloned, so a
/// share transfer never copies the lien store and a lien call never copies
/// the share ledger.
struct Checkpoint<P, L, C> {
    shares: Option<ShareLedger>,
    liens: Option<LienStore>,
    virtual_balances: Option<VirtualBalanceBook>,
    nonces: Option<NonceRegistry>,
    fee: Option<ManagerFee>,
    implementation: Option<Implementation>,
    protocol: Option<P>,
    pool: Option<L>,
    collateral: Option<C>,
}

impl<P: Clone, L: Clone, C: Clone> Checkpoint<P, L, C> {
    fn capture(vault: &Vault, env: &Environment<P, L, C>, footprint: Footprint) -> Self {
        Self {
            shares: footprint.shares.then(|| vault.shares.clone()),
            liens: footprint.liens.then(|| vault.liens.clone()),
            virtual_balances: footprint
                .virtual_balances
                .then(|| vault.virtual_balances.clone()),
            nonces: footprint.nonces.then(|| vault.nonces.clone()),
            fee: footprint.fee.then(|| vault.fee.clone()),
            implementation: footprint.implementation.then(|| vault.implementation.clone()),
            protocol: footprint.protocol.then(|| env.protocol.clone()),
            pool: footprint.pool.then(|| env.pool.clone()),
            collateral: footprint.collateral.then(|| env.collateral.clone()),
        }
    }

    fn restore(self, vault: &mut Vault, env: &mut Environment<P, L, C>) {
        if let Some(shares) = self.shares {
            vault.shares = shares;
        }
        if let Some(liens) = self.liens {
            vault.liens = liens;
        }
        if let Some(virtual_balances) = self.virtual_balances {
            vault.virtual_balances = virtual_balances;
        }
        if let Some(nonces) = self.nonces {
            vault.nonces = nonces;
        }
        if let Some(fee) = self.fee {
            vault.fee = fee;
        }
        if let Some(implementation) = self.implementation {
            vault.implementation = implementation;
        }
        if let Some(protocol) = self.protocol {
            env.protocol = protocol;
        }
        if let Some(pool) = self.pool {
            env.pool = pool;
        }
        if let Some(collateral) = self.collateral {
            env.collateral = collateral;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn emit(events: &mut EventLog, block: &BlockContext, event: VaultEvent) {
    events.push(LoggedEvent {
        block_height: block.number,
        timestamp: block.timestamp,
        event,
    });
}

/// Caller-supplied lien data must hash to the protocol's record
fn verify_lien<P: LendingProtocol>(protocol: &P, lien: &Lien, lien_id: LienId) -> Result<()> {
    match protocol.lien_hash(lien_id) {
        Some(hash) if hash == lien.hash() => Ok(()),
        _ => Err(Error::LienHashMismatch(lien_id)),
    }
}

/// A tracked lien is open while the protocol still records exactly it
fn is_open<P: LendingProtocol>(protocol: &P, entry: &LienEntry) -> bool {
    protocol.lien_hash(entry.lien_id) == Some(entry.lien.hash())
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATION RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of any vault operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationResult {
    /// Shares minted
    Minted {
        /// Shares minted
        shares: u128,
    },
    /// Shares burned
    Burned {
        /// Liquidity paid out
        net: u128,
        /// Fee retained
        fee: u128,
    },
    /// Shares transferred
    Transferred,
    /// Allowance set
    Approved,
    /// Auction started
    AuctionStarted {
        /// Start block
        start_block: u64,
    },
    /// Lien refinanced
    Refinanced {
        /// Debt paid to the prior lender
        debt: u128,
    },
    /// Collateral seized
    Seized {
        /// Virtual balance booked across the batch
        virtual_balance: u128,
    },
    /// Lien store compacted
    CleanedUp {
        /// Entries removed
        removed: usize,
    },
    /// Seized asset sold
    Liquidated {
        /// Nonce consumed
        nonce: u64,
        /// Proceeds beyond the virtual balance
        surplus: u128,
        /// Virtual balance written off as a loss
        shortfall: u128,
    },
    /// Manager fee changed
    ManagerFeeSet {
        /// Previous fee
        old_fee_bps: u16,
    },
    /// Manager fee collected
    ManagerFeeCollected {
        /// Amount withdrawn
        amount: u128,
    },
    /// Implementation upgraded
    Upgraded {
        /// New version
        version: u64,
        /// Result of the follow-up call
        follow_up: Option<Box<OperationResult>>,
    },
}

/// Outcome of a successful call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Operation result
    pub result: OperationResult,
    /// Events emitted
    pub events: EventLog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{LoanTerms, MemoryEnvironment};
    use crate::utils::crypto::{KeyPair, TokenId};

    const E18: u128 = 1_000_000_000_000_000_000;

    struct Harness {
        vault: Vault,
        env: MemoryEnvironment,
        manager: KeyPair,
    }

    fn harness() -> Harness {
        let manager = KeyPair::generate();
        let params = InitParams {
            manager: *manager.public_key(),
            liquidity_pool: Address::derive("pool"),
            lending_protocol: Address::derive("protocol"),
            name: "Lien Vault Share".into(),
            symbol: "LVS".into(),
        };
        let vault = Vault::initialize(
            Address::derive("vault"),
            &params.encode().unwrap(),
            &VaultConfig::default(),
        )
        .unwrap();
        let env = MemoryEnvironment::in_memory(
            Address::derive("protocol"),
            Address::derive("pool"),
            BlockContext::new(18_000_000, 1_700_000_000),
        );
        Harness { vault, env, manager }
    }

    fn mint(h: &mut Harness, who: Address, amount: u128) -> Result<Receipt> {
        let call = Call::new(who, VaultOperation::Mint(MintOp { amount })).with_value(amount);
        h.vault.execute(&mut h.env, call)
    }

    /// External lender originates, calls the loan, and the vault refinances it
    fn vault_lien(h: &mut Harness) -> (LienId, Lien) {
        let lender = Address::derive("lender");
        let borrower = Address::derive("borrower");
        let collection = Address::derive("collection");
        h.env.pool.credit(lender, 10 * E18).unwrap();
        h.env.collateral.mint(collection, TokenId::from(1u64), borrower).unwrap();

        let terms = LoanTerms {
            lender,
            borrower,
            collection,
            token_id: TokenId::from(1u64),
            amount: 5 * E18,
            rate: 1000,
            auction_duration: 100,
        };
        let Environment { protocol, pool, collateral, block } = &mut h.env;
        let (lien_id, lien) = protocol.originate(pool, collateral, terms, block).unwrap();
        let block = h.env.block;
        h.env.protocol.start_auction(lender, &lien, lien_id, &block).unwrap();
        let auctioned = h.env.protocol.lien(lien_id).unwrap().clone();

        h.env.mine(10);
        let call = Call::new(
            h.manager.address(),
            VaultOperation::RefinanceAuction(RefinanceAuctionOp {
                lien: auctioned,
                lien_id,
                rate: 500,
            }),
        );
        h.vault.execute(&mut h.env, call).unwrap();
        (lien_id, h.env.protocol.lien(lien_id).unwrap().clone())
    }

    #[test]
    fn test_initialize() {
        let h = harness();
        assert_eq!(h.vault.name(), "Lien Vault Share");
        assert_eq!(h.vault.symbol(), "LVS");
        assert_eq!(h.vault.decimals(), 18);
        assert_eq!(h.vault.manager_address(), h.manager.address());
        assert_eq!(h.vault.implementation().version, 1);
        assert_eq!(h.vault.signing_domain().verifying_contract, h.vault.address());
        assert_eq!(h.vault.liens_count(), 0);
    }

    #[test]
    fn test_initialize_rejects_bad_payload() {
        assert!(matches!(
            Vault::initialize(Address::derive("vault"), &[1, 2, 3], &VaultConfig::default()),
            Err(Error::Deserialization(_))
        ));
    }

    #[test]
    fn test_value_on_non_payable_call() {
        let mut h = harness();
        mint(&mut h, Address::derive("alice"), 100).unwrap();
        let call = Call::new(Address::derive("alice"), VaultOperation::Burn(BurnOp { shares: 1 }))
            .with_value(1);
        assert!(matches!(
            h.vault.execute(&mut h.env, call),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_manager_only_operations() {
        let mut h = harness();
        let outsider = Address::derive("outsider");
        let ops = vec![
            VaultOperation::SetManagerFee(SetManagerFeeOp { fee_bps: 10 }),
            VaultOperation::CollectManagerFee(CollectManagerFeeOp),
            VaultOperation::Seize(SeizeOp { liens: vec![] }),
            VaultOperation::UpgradeToAndCall(UpgradeToAndCallOp {
                implementation: Hash::sha256(b"v2"),
                call: vec![],
            }),
        ];
        for op in ops {
            assert!(matches!(
                h.vault.execute(&mut h.env, Call::new(outsider, op)),
                Err(Error::Unauthorized(_))
            ));
        }
    }

    #[test]
    fn test_unexpected_collaborator() {
        let mut h = harness();
        h.env.pool = crate::external::MemoryLiquidityPool::new(Address::derive("fake-pool"));
        assert!(matches!(
            mint(&mut h, Address::derive("alice"), 100),
            Err(Error::UnexpectedCollaborator { .. })
        ));
    }

    #[test]
    fn test_failed_call_restores_everything() {
        let mut h = harness();
        let alice = Address::derive("alice");
        mint(&mut h, alice, 100).unwrap();

        // fee is set, then the follow-up fails: both must roll back
        let follow_up = VaultOperation::SetManagerFee(SetManagerFeeOp { fee_bps: 5_000 });
        let call = Call::new(
            h.manager.address(),
            VaultOperation::UpgradeToAndCall(UpgradeToAndCallOp {
                implementation: Hash::sha256(b"v2"),
                call: follow_up.encode().unwrap(),
            }),
        );
        assert!(matches!(
            h.vault.execute(&mut h.env, call),
            Err(Error::InvalidManagerFee { .. })
        ));
        assert_eq!(h.vault.implementation().version, 1);
        assert_eq!(h.vault.total_supply(), 100);
        assert_eq!(h.env.pool.balance_of(&h.vault.address()), 100);
    }

    #[test]
    fn test_upgrade_with_follow_up() {
        let mut h = harness();
        let follow_up = VaultOperation::SetManagerFee(SetManagerFeeOp { fee_bps: 200 });
        let call = Call::new(
            h.manager.address(),
            VaultOperation::UpgradeToAndCall(UpgradeToAndCallOp {
                implementation: Hash::sha256(b"v2"),
                call: follow_up.encode().unwrap(),
            }),
        );
        let receipt = h.vault.execute(&mut h.env, call).unwrap();

        assert_eq!(h.vault.implementation().hash, Hash::sha256(b"v2"));
        assert_eq!(h.vault.implementation().version, 2);
        assert_eq!(h.vault.manager_fee(), 200);
        assert_eq!(receipt.events.len(), 2);
        assert_eq!(
            receipt.result,
            OperationResult::Upgraded {
                version: 2,
                follow_up: Some(Box::new(OperationResult::ManagerFeeSet { old_fee_bps: 0 })),
            }
        );
    }

    #[test]
    fn test_nested_upgrade_rejected() {
        let mut h = harness();
        let inner = VaultOperation::UpgradeToAndCall(UpgradeToAndCallOp {
            implementation: Hash::sha256(b"v3"),
            call: vec![],
        });
        let call = Call::new(
            h.manager.address(),
            VaultOperation::UpgradeToAndCall(UpgradeToAndCallOp {
                implementation: Hash::sha256(b"v2"),
                call: inner.encode().unwrap(),
            }),
        );
        assert!(matches!(
            h.vault.execute(&mut h.env, call),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_mint_with_empty_valuation() {
        let mut h = harness();
        mint(&mut h, Address::derive("alice"), 100).unwrap();
        // drain the pool behind the vault's back
        let vault = h.vault.address();
        h.env.pool.withdraw(vault, Address::derive("thief"), 100).unwrap();

        assert!(matches!(
            mint(&mut h, Address::derive("bob"), 100),
            Err(Error::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn test_refinance_tracks_lien() {
        let mut h = harness();
        mint(&mut h, Address::derive("alice"), 10 * E18).unwrap();
        let (lien_id, lien) = vault_lien(&mut h);

        assert_eq!(lien.lender, h.vault.address());
        assert_eq!(lien.rate, 500);
        assert_eq!(h.vault.liens_count(), 1);
        assert_eq!(h.vault.lien(lien_id).unwrap().lien, lien);

        // value moved from liquidity into debt without changing the total
        let liquidity = h.vault.pooled_liquidity(&h.env).unwrap();
        assert_eq!(liquidity, 10 * E18 - lien.amount);
        assert_eq!(h.vault.currently_owned_debt(&h.env).unwrap(), lien.amount);
        assert_eq!(h.vault.underlying_balance(&h.env).unwrap(), 10 * E18);
    }

    #[test]
    fn test_refinance_needs_liquidity() {
        let mut h = harness();
        mint(&mut h, Address::derive("alice"), E18).unwrap();

        let lender = Address::derive("lender");
        let borrower = Address::derive("borrower");
        let collection = Address::derive("collection");
        h.env.pool.credit(lender, 10 * E18).unwrap();
        h.env.collateral.mint(collection, TokenId::from(1u64), borrower).unwrap();
        let terms = LoanTerms {
            lender,
            borrower,
            collection,
            token_id: TokenId::from(1u64),
            amount: 5 * E18,
            rate: 1000,
            auction_duration: 100,
        };
        let Environment { protocol, pool, collateral, block } = &mut h.env;
        let (lien_id, lien) = protocol.originate(pool, collateral, terms, block).unwrap();
        let block = h.env.block;
        h.env.protocol.start_auction(lender, &lien, lien_id, &block).unwrap();
        let auctioned = h.env.protocol.lien(lien_id).unwrap().clone();

        let call = Call::new(
            h.manager.address(),
            VaultOperation::RefinanceAuction(RefinanceAuctionOp {
                lien: auctioned,
                lien_id,
                rate: 500,
            }),
        );
        assert!(matches!(
            h.vault.execute(&mut h.env, call),
            Err(Error::InsufficientLiquidity { .. })
        ));
        assert_eq!(h.vault.liens_count(), 0);
    }

    #[test]
    fn test_start_auction_checks() {
        let mut h = harness();
        mint(&mut h, Address::derive("alice"), 10 * E18).unwrap();
        let (lien_id, lien) = vault_lien(&mut h);
        let manager = h.manager.address();

        // stale snapshot
        let stale = Lien { rate: 1, ..lien.clone() };
        let call = Call::new(
            manager,
            VaultOperation::StartAuction(StartAuctionOp { lien: stale, lien_id }),
        );
        assert_eq!(
            h.vault.execute(&mut h.env, call).unwrap_err(),
            Error::LienHashMismatch(lien_id)
        );

        let start = |lien: Lien| {
            Call::new(manager, VaultOperation::StartAuction(StartAuctionOp { lien, lien_id }))
        };
        let receipt = h.vault.execute(&mut h.env, start(lien.clone())).unwrap();
        assert_eq!(receipt.events.filter_by_type("AuctionStarted").len(), 1);
        let auctioned = h.vault.lien(lien_id).unwrap().lien.clone();
        assert_eq!(auctioned.auction_start_block, h.env.block.number);

        assert_eq!(
            h.vault.execute(&mut h.env, start(auctioned)).unwrap_err(),
            Error::AuctionAlreadyStarted(lien_id)
        );
    }

    #[test]
    fn test_set_fee_bounds() {
        let mut h = harness();
        let manager = h.manager.address();
        let set = |fee_bps| Call::new(manager, VaultOperation::SetManagerFee(SetManagerFeeOp { fee_bps }));

        h.vault.execute(&mut h.env, set(1_000)).unwrap();
        assert_eq!(h.vault.manager_fee(), 1_000);
        assert!(matches!(
            h.vault.execute(&mut h.env, set(1_001)),
            Err(Error::InvalidManagerFee { .. })
        ));
        assert_eq!(h.vault.manager_fee(), 1_000);
    }

    #[test]
    fn test_collect_empty_fee_pot() {
        let mut h = harness();
        let call = Call::new(
            h.manager.address(),
            VaultOperation::CollectManagerFee(CollectManagerFeeOp),
        );
        let receipt = h.vault.execute(&mut h.env, call).unwrap();
        assert_eq!(receipt.result, OperationResult::ManagerFeeCollected { amount: 0 });
        assert_eq!(receipt.events.filter_by_type("ManagerFeeCollected").len(), 1);
    }

    #[test]
    fn test_share_transfers_through_calls() {
        let mut h = harness();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        mint(&mut h, alice, 100).unwrap();

        let call = Call::new(alice, VaultOperation::Approve(ApproveOp { spender: bob, amount: 40 }));
        h.vault.execute(&mut h.env, call).unwrap();
        let call = Call::new(
            bob,
            VaultOperation::TransferFrom(TransferFromOp { owner: alice, to: bob, amount: 30 }),
        );
        h.vault.execute(&mut h.env, call).unwrap();
        let call = Call::new(bob, VaultOperation::Transfer(TransferOp { to: Address::ZERO, amount: 1 }));
        assert_eq!(
            h.vault.execute(&mut h.env, call).unwrap_err(),
            Error::InvalidRecipient
        );

        assert_eq!(h.vault.balance_of(&alice), 70);
        assert_eq!(h.vault.balance_of(&bob), 30);
        assert_eq!(h.vault.allowance(&alice, &bob), 10);
        assert!(h.vault.verify_invariants().is_ok());
    }

    #[test]
    fn test_checkpoint_scoped_to_operation() {
        let mut h = harness();
        mint(&mut h, Address::derive("alice"), 10 * E18).unwrap();
        vault_lien(&mut h);

        let transfer = VaultOperation::Transfer(TransferOp {
            to: Address::derive("bob"),
            amount: 1,
        });
        let checkpoint = Checkpoint::capture(&h.vault, &h.env, Footprint::of(&transfer));
        assert!(checkpoint.shares.is_some());
        assert!(checkpoint.liens.is_none());
        assert!(checkpoint.virtual_balances.is_none());
        assert!(checkpoint.protocol.is_none());
        assert!(checkpoint.pool.is_none());
        assert!(checkpoint.collateral.is_none());

        let clean_up = Footprint::of(&VaultOperation::CleanUpLiens(CleanUpLiensOp));
        assert_eq!(clean_up, Footprint { liens: true, ..Footprint::default() });

        // an upgrade covers whatever its follow-up writes
        let follow_up = VaultOperation::CollectManagerFee(CollectManagerFeeOp);
        let upgrade = VaultOperation::UpgradeToAndCall(UpgradeToAndCallOp {
            implementation: Hash::sha256(b"v2"),
            call: follow_up.encode().unwrap(),
        });
        assert_eq!(
            Footprint::of(&upgrade),
            Footprint {
                implementation: true,
                fee: true,
                pool: true,
                ..Footprint::default()
            }
        );
    }

    #[test]
    fn test_failed_lien_call_leaves_shares_alone() {
        let mut h = harness();
        let alice = Address::derive("alice");
        mint(&mut h, alice, 10 * E18).unwrap();
        let (lien_id, lien) = vault_lien(&mut h);

        // rejected after the checkpoint is taken
        let call = Call::new(
            h.manager.address(),
            VaultOperation::StartAuction(StartAuctionOp {
                lien: Lien { rate: 1, ..lien.clone() },
                lien_id,
            }),
        );
        assert_eq!(
            h.vault.execute(&mut h.env, call),
            Err(Error::LienHashMismatch(lien_id))
        );
        assert_eq!(h.vault.lien(lien_id).unwrap().lien, lien);
        assert_eq!(h.vault.balance_of(&alice), 10 * E18);
        assert_eq!(h.vault.total_supply(), 10 * E18);
        assert!(h.vault.verify_invariants().is_ok());
    }
}
