// Ledger events - emitted by successful operations, drained by the host

use crate::identity::Address;
use crate::ledger::config::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Value moved between holders. `from == None` marks newly created supply
    /// (genesis allocation, mint, reward).
    Transfer {
        from: Option<Address>,
        to: Address,
        value: Amount,
    },
    /// Fee withheld from a transfer and credited to the owner
    FeeCollected {
        from: Address,
        recipient: Address,
        fee: Amount,
    },
    FeeUpdated {
        previous: u16,
        current: u16,
    },
    Frozen {
        by: Address,
    },
    OwnershipTransferred {
        previous: Address,
        new_owner: Address,
    },
    RewardClaimed {
        holder: Address,
        reward: Amount,
        elapsed: u64,
    },
}

/// An event stamped with the invocation time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: Timestamp,
    pub event: LedgerEvent,
}
