// Accounts - sparse holder map with defaulted reads

use crate::identity::Address;
use crate::ledger::config::{Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-holder record. A missing entry reads as `Account::default()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    balance: Amount,
    last_reward_timestamp: Option<Timestamp>,
    created_at: Option<Timestamp>,
}

impl Account {
    /// Construct a stored account record
    pub fn new(balance: Amount, last_reward_timestamp: Option<Timestamp>, created_at: Option<Timestamp>) -> Self {
        Self {
            balance,
            last_reward_timestamp,
            created_at,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Time of the last claim, if the holder ever claimed
    pub fn last_reward_timestamp(&self) -> Option<Timestamp> {
        self.last_reward_timestamp
    }

    /// Time the balance first became non-zero
    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    /// Start of the current accrual window
    pub fn reward_baseline(&self) -> Option<Timestamp> {
        self.last_reward_timestamp.or(self.created_at)
    }
}

/// All holder accounts plus the set touched by the operation in flight
#[derive(Clone, Debug, Default)]
pub struct AccountBook {
    accounts: BTreeMap<Address, Account>,
    touched: BTreeSet<Address>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (Address, Account)>,
    {
        Self {
            accounts: records.into_iter().collect(),
            touched: BTreeSet::new(),
        }
    }

    /// Read an account, defaulting when absent
    pub fn get(&self, address: &Address) -> Account {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.get(address).balance
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterate accounts in address order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    /// Sum of all balances, `None` on overflow
    pub fn total_balance(&self) -> Option<Amount> {
        self.accounts
            .values()
            .try_fold(0 as Amount, |acc, a| acc.checked_add(a.balance))
    }

    /// Add to a balance. Zero credits create nothing.
    ///
    /// Callers guarantee `balance + amount <= cap`, so the addition cannot wrap.
    pub(crate) fn credit(&mut self, address: Address, amount: Amount, now: Timestamp) {
        if amount == 0 {
            return;
        }
        let account = self.accounts.entry(address).or_default();
        if account.created_at.is_none() {
            account.created_at = Some(now);
        }
        account.balance += amount;
        self.touched.insert(address);
    }

    /// Subtract from a balance. Callers check sufficiency first.
    pub(crate) fn debit(&mut self, address: Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        if let Some(account) = self.accounts.get_mut(&address) {
            account.balance -= amount;
            self.touched.insert(address);
        }
    }

    /// Advance the holder's claim timestamp, creating the entry if needed.
    /// The timestamp never moves behind the current accrual baseline.
    pub(crate) fn mark_claimed(&mut self, address: Address, now: Timestamp) {
        let account = self.accounts.entry(address).or_default();
        let claimed_at = account.reward_baseline().map_or(now, |baseline| baseline.max(now));
        account.last_reward_timestamp = Some(claimed_at);
        self.touched.insert(address);
    }

    /// Drain the set of accounts modified since the last call
    pub(crate) fn take_touched(&mut self) -> BTreeSet<Address> {
        std::mem::take(&mut self.touched)
    }
}
