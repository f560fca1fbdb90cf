// Ledger engine - all state and every operation in one consistency domain
//
// Each operation checks all of its preconditions before the first write, so
// an Err return leaves the ledger exactly as it was.

use crate::identity::Address;
use crate::ledger::account::{Account, AccountBook};
use crate::ledger::config::{Amount, GenesisParams, LedgerConfig, Timestamp, MAX_FEE_BASIS_POINTS};
use crate::ledger::event::{EventRecord, LedgerEvent};
use crate::ledger::reward::RewardQuote;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Only the owner can call this function")]
    Unauthorized,

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("Contract is frozen and transfers are disabled")]
    TransfersDisabled,

    #[error("Supply cap exceeded: cap {cap}, supply would be {would_have}")]
    CapExceeded { cap: Amount, would_have: Amount },

    #[error("Fee cannot exceed 1%: requested {requested} basis points, max {max}")]
    FeeTooHigh { requested: u16, max: u16 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invariant violated: {0}")]
    InvariantViolated(String),
}

/// Identity and time of one invocation, supplied by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        Self { caller, timestamp }
    }
}

/// Keys modified since the host last drained them
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub config: bool,
    pub accounts: BTreeSet<Address>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !self.config && self.accounts.is_empty()
    }
}

/// The ledger engine
#[derive(Clone, Debug)]
pub struct Ledger {
    config: LedgerConfig,
    accounts: AccountBook,
    events: Vec<EventRecord>,
    config_dirty: bool,
}

impl Ledger {
    /// Initialize a ledger. The caller becomes owner and receives `cap / 2`.
    pub fn genesis(ctx: &CallContext, params: GenesisParams) -> Result<Self, LedgerError> {
        if ctx.caller.is_zero() {
            return Err(LedgerError::InvalidArgument("deployer cannot be the zero address".into()));
        }
        if params.cap == 0 {
            return Err(LedgerError::InvalidArgument("cap must be greater than zero".into()));
        }
        if params.fee_basis_points > MAX_FEE_BASIS_POINTS {
            return Err(LedgerError::FeeTooHigh {
                requested: params.fee_basis_points,
                max: MAX_FEE_BASIS_POINTS,
            });
        }

        let mut ledger = Self {
            config: LedgerConfig::from_genesis(ctx.caller, &params),
            accounts: AccountBook::new(),
            events: Vec::new(),
            config_dirty: true,
        };

        let initial = params.cap / 2;
        ledger.accounts.credit(ctx.caller, initial, ctx.timestamp);
        ledger.config.total_supply = initial;
        ledger.emit(ctx, LedgerEvent::Transfer {
            from: None,
            to: ctx.caller,
            value: initial,
        });

        debug!(owner = %ctx.caller, cap = params.cap, initial, "ledger initialized");
        Ok(ledger)
    }

    /// Rebuild a ledger from persisted config and accounts, verifying invariants
    pub fn from_parts<I>(config: LedgerConfig, accounts: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (Address, Account)>,
    {
        let ledger = Self {
            config,
            accounts: AccountBook::from_records(accounts),
            events: Vec::new(),
            config_dirty: false,
        };
        ledger.check_invariants()?;
        Ok(ledger)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.accounts.balance_of(address)
    }

    /// Current fee in basis points
    pub fn fee_percent(&self) -> u16 {
        self.config.fee_basis_points
    }

    pub fn owner(&self) -> Address {
        self.config.owner
    }

    pub fn total_supply(&self) -> Amount {
        self.config.total_supply
    }

    pub fn cap(&self) -> Amount {
        self.config.cap
    }

    pub fn is_frozen(&self) -> bool {
        self.config.frozen
    }

    pub fn reward_rate_per_second(&self) -> Amount {
        self.config.reward_rate_per_second
    }

    pub fn name(&self) -> &str {
        &self.config.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.metadata.decimals
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Full account record (defaulted when absent)
    pub fn account(&self, address: &Address) -> Account {
        self.accounts.get(address)
    }

    /// Iterate all known accounts in address order
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    /// Latest funding or claim time recorded on any account
    pub fn latest_timestamp(&self) -> Timestamp {
        self.accounts
            .iter()
            .flat_map(|(_, account)| [account.created_at(), account.last_reward_timestamp()])
            .flatten()
            .max()
            .unwrap_or(0)
    }

    /// What `claim_reward` would do for `address` at `now`
    pub fn quote_reward(&self, address: &Address, now: Timestamp) -> RewardQuote {
        let account = self.accounts.get(address);
        RewardQuote::compute(
            account.balance(),
            self.config.reward_rate_per_second,
            account.reward_baseline(),
            now,
            self.config.headroom(),
        )
    }

    /// Reward a claim at `now` would credit
    pub fn pending_reward(&self, address: &Address, now: Timestamp) -> Amount {
        self.quote_reward(address, now).credited
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Create `amount` new units for `to`. Owner only, bounded by the cap.
    pub fn mint(&mut self, ctx: &CallContext, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.require_owner(ctx, "mint")?;
        if amount == 0 {
            return Err(LedgerError::InvalidArgument("mint amount must be greater than zero".into()));
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidArgument("cannot mint to the zero address".into()));
        }
        let new_supply = self
            .config
            .total_supply
            .checked_add(amount)
            .filter(|supply| *supply <= self.config.cap)
            .ok_or(LedgerError::CapExceeded {
                cap: self.config.cap,
                would_have: self.config.total_supply.saturating_add(amount),
            })?;

        self.accounts.credit(to, amount, ctx.timestamp);
        self.config.total_supply = new_supply;
        self.config_dirty = true;
        self.emit(ctx, LedgerEvent::Transfer {
            from: None,
            to,
            value: amount,
        });

        debug!(%to, amount, total_supply = new_supply, "minted");
        Ok(())
    }

    /// Move `amount` from the caller to `to`, withholding the fee for the owner
    pub fn transfer(&mut self, ctx: &CallContext, to: Address, amount: Amount) -> Result<(), LedgerError> {
        if self.config.frozen {
            return Err(LedgerError::TransfersDisabled);
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidArgument("cannot transfer to the zero address".into()));
        }
        let available = self.accounts.balance_of(&ctx.caller);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let fee = self.config.fee_for(amount);
        let net = amount - fee;
        let fee_recipient = self.config.owner;

        // Applied in sequence with no identity special-casing: when caller,
        // recipient and owner coincide the three steps cancel out.
        self.accounts.debit(ctx.caller, amount);
        self.accounts.credit(to, net, ctx.timestamp);
        self.accounts.credit(fee_recipient, fee, ctx.timestamp);

        self.emit(ctx, LedgerEvent::Transfer {
            from: Some(ctx.caller),
            to,
            value: net,
        });
        if fee > 0 {
            self.emit(ctx, LedgerEvent::FeeCollected {
                from: ctx.caller,
                recipient: fee_recipient,
                fee,
            });
        }

        debug!(from = %ctx.caller, %to, amount, fee, "transferred");
        Ok(())
    }

    /// Set the transfer fee in basis points. Owner only, at most 1%.
    pub fn set_fee_percent(&mut self, ctx: &CallContext, new_fee: u16) -> Result<(), LedgerError> {
        self.require_owner(ctx, "set_fee_percent")?;
        if new_fee > MAX_FEE_BASIS_POINTS {
            return Err(LedgerError::FeeTooHigh {
                requested: new_fee,
                max: MAX_FEE_BASIS_POINTS,
            });
        }

        let previous = self.config.fee_basis_points;
        self.config.fee_basis_points = new_fee;
        self.config_dirty = true;
        self.emit(ctx, LedgerEvent::FeeUpdated {
            previous,
            current: new_fee,
        });

        debug!(previous, current = new_fee, "fee updated");
        Ok(())
    }

    /// Disable transfers permanently. Owner only; repeated calls change nothing.
    ///
    /// There is no unfreeze: once set the flag stays set for the lifetime of
    /// the ledger.
    pub fn freeze_contract(&mut self, ctx: &CallContext) -> Result<(), LedgerError> {
        self.require_owner(ctx, "freeze_contract")?;
        if self.config.frozen {
            debug!("freeze requested on an already frozen ledger");
            return Ok(());
        }

        self.config.frozen = true;
        self.config_dirty = true;
        self.emit(ctx, LedgerEvent::Frozen { by: ctx.caller });

        debug!(by = %ctx.caller, "ledger frozen");
        Ok(())
    }

    /// Hand the owner role (and the fee stream) to `new_owner`
    pub fn transfer_ownership(&mut self, ctx: &CallContext, new_owner: Address) -> Result<(), LedgerError> {
        self.require_owner(ctx, "transfer_ownership")?;
        if new_owner.is_zero() {
            return Err(LedgerError::InvalidArgument("new owner cannot be the zero address".into()));
        }

        let previous = self.config.owner;
        self.config.owner = new_owner;
        self.config_dirty = true;
        self.emit(ctx, LedgerEvent::OwnershipTransferred { previous, new_owner });

        debug!(%previous, %new_owner, "ownership transferred");
        Ok(())
    }

    /// Credit the caller's accrued reward, clamped to the remaining cap.
    /// Returns the credited amount. The claim timestamp always advances.
    pub fn claim_reward(&mut self, ctx: &CallContext) -> Result<Amount, LedgerError> {
        let quote = self.quote_reward(&ctx.caller, ctx.timestamp);

        self.accounts.credit(ctx.caller, quote.credited, ctx.timestamp);
        self.accounts.mark_claimed(ctx.caller, ctx.timestamp);

        if quote.credited > 0 {
            self.config.total_supply += quote.credited;
            self.config_dirty = true;
            self.emit(ctx, LedgerEvent::Transfer {
                from: None,
                to: ctx.caller,
                value: quote.credited,
            });
        }
        self.emit(ctx, LedgerEvent::RewardClaimed {
            holder: ctx.caller,
            reward: quote.credited,
            elapsed: quote.elapsed,
        });

        if quote.is_capped() {
            warn!(holder = %ctx.caller, accrued = quote.accrued, credited = quote.credited, "reward clamped by supply cap");
        }
        debug!(holder = %ctx.caller, reward = quote.credited, elapsed = quote.elapsed, "reward claimed");
        Ok(quote.credited)
    }

    // ========================================================================
    // BOOKKEEPING
    // ========================================================================

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    /// Drain the set of keys modified since the last call
    pub fn take_changes(&mut self) -> ChangeSet {
        ChangeSet {
            config: std::mem::replace(&mut self.config_dirty, false),
            accounts: self.accounts.take_touched(),
        }
    }

    /// Verify the accounting invariants
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        let sum = self
            .accounts
            .total_balance()
            .ok_or_else(|| LedgerError::InvariantViolated("balance sum overflows".into()))?;
        if sum != self.config.total_supply {
            return Err(LedgerError::InvariantViolated(format!(
                "total supply {} does not match balance sum {}",
                self.config.total_supply, sum
            )));
        }
        if self.config.total_supply > self.config.cap {
            return Err(LedgerError::InvariantViolated(format!(
                "total supply {} exceeds cap {}",
                self.config.total_supply, self.config.cap
            )));
        }
        if self.config.fee_basis_points > MAX_FEE_BASIS_POINTS {
            return Err(LedgerError::InvariantViolated(format!(
                "fee {} exceeds {} basis points",
                self.config.fee_basis_points, MAX_FEE_BASIS_POINTS
            )));
        }
        if self.config.owner.is_zero() {
            return Err(LedgerError::InvariantViolated("owner is the zero address".into()));
        }
        Ok(())
    }

    /// Deterministic SHA-256 digest of config and all accounts
    pub fn state_root(&self) -> [u8; 32] {
        let config = &self.config;
        let mut hasher = Sha256::new();
        hasher.update(b"config");
        hasher.update(config.owner.as_bytes());
        hasher.update(config.cap.to_le_bytes());
        hasher.update(config.fee_basis_points.to_le_bytes());
        hasher.update([config.frozen as u8]);
        hasher.update(config.reward_rate_per_second.to_le_bytes());
        hasher.update(config.total_supply.to_le_bytes());
        for (address, account) in self.accounts.iter() {
            hasher.update(b"acct");
            hasher.update(address.as_bytes());
            hasher.update(account.balance().to_le_bytes());
            hasher.update(account.last_reward_timestamp().unwrap_or(0).to_le_bytes());
            hasher.update(account.created_at().unwrap_or(0).to_le_bytes());
        }
        hasher.finalize().into()
    }

    fn require_owner(&self, ctx: &CallContext, operation: &'static str) -> Result<(), LedgerError> {
        if ctx.caller != self.config.owner {
            warn!(caller = %ctx.caller, operation, "rejected privileged call from non-owner");
            return Err(LedgerError::Unauthorized);
        }
        Ok(())
    }

    fn emit(&mut self, ctx: &CallContext, event: LedgerEvent) {
        self.events.push(EventRecord {
            timestamp: ctx.timestamp,
            event,
        });
    }
}
