// Reward accrual - linear in balance, rate and elapsed seconds

use crate::ledger::config::{Amount, Timestamp};

/// Fixed-point scale of the reward rate: a rate of `REWARD_RATE_SCALE`
/// accrues 100% of the balance per second.
pub const REWARD_RATE_SCALE: Amount = 1_000_000;

/// Reward accrued by `balance` over `elapsed` seconds at `rate`.
///
/// `ceil(balance * rate * elapsed / REWARD_RATE_SCALE)`: non-decreasing in
/// every argument and at least 1 whenever all three are non-zero. The
/// product saturates instead of wrapping.
pub fn accrued_reward(balance: Amount, rate: Amount, elapsed: u64) -> Amount {
    if balance == 0 || rate == 0 || elapsed == 0 {
        return 0;
    }
    balance
        .saturating_mul(rate)
        .saturating_mul(elapsed as Amount)
        .div_ceil(REWARD_RATE_SCALE)
}

/// Seconds between the accrual baseline and `now`; zero without a baseline
/// or when the clock reads earlier than the baseline.
pub fn elapsed_since(baseline: Option<Timestamp>, now: Timestamp) -> u64 {
    baseline.map(|start| now.saturating_sub(start)).unwrap_or(0)
}

/// What a claim at a given instant would produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardQuote {
    /// Seconds in the accrual window
    pub elapsed: u64,
    /// Reward before the supply cap is applied
    pub accrued: Amount,
    /// Reward actually credited (`accrued` clamped to the cap headroom)
    pub credited: Amount,
}

impl RewardQuote {
    pub fn compute(balance: Amount, rate: Amount, baseline: Option<Timestamp>, now: Timestamp, headroom: Amount) -> Self {
        let elapsed = elapsed_since(baseline, now);
        let accrued = accrued_reward(balance, rate, elapsed);
        Self {
            elapsed,
            accrued,
            credited: accrued.min(headroom),
        }
    }

    /// True when the cap cut the reward short
    pub fn is_capped(&self) -> bool {
        self.credited < self.accrued
    }
}
