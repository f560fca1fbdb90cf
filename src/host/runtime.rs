// TokenHost - runs one ledger operation per invocation and persists it
//
// The host supplies caller identity and a non-decreasing timestamp, and
// commits each successful operation to the store as a single batch.

use crate::host::clock::Clock;
use crate::identity::Address;
use crate::ledger::{Amount, CallContext, GenesisParams, Ledger, LedgerError, Timestamp};
use crate::storage::{LedgerStore, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by the host
#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Ledger has not been initialized")]
    NotInitialized,

    #[error("Ledger is already initialized")]
    AlreadyInitialized,
}

pub struct TokenHost<C: Clock> {
    ledger: Ledger,
    store: LedgerStore,
    clock: C,
    last_timestamp: Timestamp,
}

impl<C: Clock> TokenHost<C> {
    /// Deploy a new ledger into an empty store
    pub fn initialize(store: LedgerStore, clock: C, deployer: Address, params: GenesisParams) -> Result<Self, HostError> {
        if store.is_initialized()? {
            return Err(HostError::AlreadyInitialized);
        }
        let now = clock.now();
        let mut ledger = Ledger::genesis(&CallContext::new(deployer, now), params)?;
        let changes = ledger.take_changes();
        let events = ledger.take_events();
        store.commit(&ledger, &changes, &events)?;
        store.flush()?;

        info!(owner = %deployer, cap = ledger.cap(), "ledger deployed");
        Ok(Self {
            ledger,
            store,
            clock,
            last_timestamp: now,
        })
    }

    /// Load an existing ledger from the store. Invocation time resumes no
    /// earlier than the latest time the persisted state has seen.
    pub fn open(store: LedgerStore, clock: C) -> Result<Self, HostError> {
        let ledger = store.load_ledger()?.ok_or(HostError::NotInitialized)?;
        let last_event = store.recent_events(1)?.last().map_or(0, |record| record.timestamp);
        let last_timestamp = ledger.latest_timestamp().max(last_event);
        debug!(last_timestamp, "ledger opened");
        Ok(Self {
            ledger,
            store,
            clock,
            last_timestamp,
        })
    }

    /// Read-only view of the ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current invocation time, never earlier than the previous one
    pub fn now(&self) -> Timestamp {
        self.clock.now().max(self.last_timestamp)
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub fn mint(&mut self, caller: Address, to: Address, amount: Amount) -> Result<(), HostError> {
        self.invoke(caller, "mint", |ledger, ctx| ledger.mint(ctx, to, amount))
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<(), HostError> {
        self.invoke(caller, "transfer", |ledger, ctx| ledger.transfer(ctx, to, amount))
    }

    pub fn set_fee_percent(&mut self, caller: Address, new_fee: u16) -> Result<(), HostError> {
        self.invoke(caller, "set_fee_percent", |ledger, ctx| ledger.set_fee_percent(ctx, new_fee))
    }

    pub fn freeze_contract(&mut self, caller: Address) -> Result<(), HostError> {
        self.invoke(caller, "freeze_contract", |ledger, ctx| ledger.freeze_contract(ctx))
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), HostError> {
        self.invoke(caller, "transfer_ownership", |ledger, ctx| {
            ledger.transfer_ownership(ctx, new_owner)
        })
    }

    pub fn claim_reward(&mut self, caller: Address) -> Result<Amount, HostError> {
        self.invoke(caller, "claim_reward", |ledger, ctx| ledger.claim_reward(ctx))
    }

    /// Run one operation and persist its effects. On failure nothing is
    /// written; if the commit itself fails the in-memory ledger is reloaded
    /// from the store so memory and disk agree.
    fn invoke<T, F>(&mut self, caller: Address, operation: &'static str, op: F) -> Result<T, HostError>
    where
        F: FnOnce(&mut Ledger, &CallContext) -> Result<T, LedgerError>,
    {
        let ctx = CallContext::new(caller, self.now());

        let output = match op(&mut self.ledger, &ctx) {
            Ok(output) => output,
            Err(err) => {
                warn!(%caller, operation, error = %err, "operation rejected");
                return Err(err.into());
            }
        };
        self.last_timestamp = ctx.timestamp;

        let changes = self.ledger.take_changes();
        let events = self.ledger.take_events();
        if let Err(err) = self.store.commit(&self.ledger, &changes, &events) {
            warn!(operation, error = %err, "commit failed, reloading ledger from store");
            self.ledger = self.store.load_ledger()?.ok_or(HostError::NotInitialized)?;
            return Err(err.into());
        }

        info!(%caller, operation, timestamp = ctx.timestamp, "operation committed");
        Ok(output)
    }
}
