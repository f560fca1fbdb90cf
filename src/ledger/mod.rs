// Ledger module - THE TOKEN STATE MACHINE
// Balances, supply cap, fee-on-transfer, freeze and reward accrual

mod account;
mod config;
mod engine;
mod event;
mod reward;
mod units;

pub use account::{Account, AccountBook};
pub use config::{
    Amount, GenesisParams, LedgerConfig, Timestamp, TokenMetadata, BASIS_POINTS_SCALE,
    DEFAULT_DECIMALS, MAX_FEE_BASIS_POINTS,
};
pub use engine::{CallContext, ChangeSet, Ledger, LedgerError};
pub use event::{EventRecord, LedgerEvent};
pub use reward::{accrued_reward, elapsed_since, RewardQuote, REWARD_RATE_SCALE};
pub use units::{format_units, parse_units};
