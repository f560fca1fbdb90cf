//! Capped fungible-token ledger.
//!
//! The [`ledger::Ledger`] engine holds balances, the owner/cap/fee/freeze
//! configuration and per-holder reward bookkeeping, and applies each
//! operation all-or-nothing. [`host::TokenHost`] drives it against a sled
//! [`storage::LedgerStore`].

pub mod host;
pub mod identity;
pub mod ledger;
pub mod storage;
