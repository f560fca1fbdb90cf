// Ledger configuration - the singleton owner/cap/fee/freeze/reward record

use crate::identity::Address;
use serde::{Deserialize, Serialize};

/// Token amount in smallest units
pub type Amount = u128;

/// Seconds since the Unix epoch, as supplied by the host clock
pub type Timestamp = u64;

/// Denominator of the fee scale: 10_000 basis points = 100%
pub const BASIS_POINTS_SCALE: Amount = 10_000;

/// Highest accepted fee: 100 basis points = 1% of a transfer
pub const MAX_FEE_BASIS_POINTS: u16 = 100;

/// Decimals used by the reference deployment
pub const DEFAULT_DECIMALS: u8 = 18;

// ============================================================================
// TOKEN METADATA
// ============================================================================

/// Descriptive token metadata (not consulted by any accounting rule)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "MyToken".to_string(),
            symbol: "MTK".to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

// ============================================================================
// GENESIS PARAMETERS
// ============================================================================

/// Parameters supplied by the deploying caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Maximum total supply, in smallest units
    pub cap: Amount,
    /// Initial transfer fee in basis points (at most 100)
    pub fee_basis_points: u16,
    /// Reward rate in millionths of the holder balance per second
    pub reward_rate_per_second: Amount,
    /// Token metadata
    pub metadata: TokenMetadata,
}

impl GenesisParams {
    /// Create genesis parameters with default metadata
    pub fn new(cap: Amount, fee_basis_points: u16, reward_rate_per_second: Amount) -> Self {
        Self {
            cap,
            fee_basis_points,
            reward_rate_per_second,
            metadata: TokenMetadata::default(),
        }
    }

    /// Replace the token metadata
    pub fn with_metadata(mut self, metadata: TokenMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Default for GenesisParams {
    /// The reference deployment: cap 10M, 0.10% fee, rate 1000
    fn default() -> Self {
        Self::new(10_000_000, 10, 1_000)
    }
}

// ============================================================================
// LEDGER CONFIG
// ============================================================================

/// Process-wide configuration owned by the engine.
///
/// Fields are only writable from inside the `ledger` module so every change
/// goes through an owner-gated operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub(crate) owner: Address,
    pub(crate) cap: Amount,
    pub(crate) fee_basis_points: u16,
    pub(crate) frozen: bool,
    pub(crate) reward_rate_per_second: Amount,
    pub(crate) total_supply: Amount,
    pub(crate) metadata: TokenMetadata,
}

impl LedgerConfig {
    pub(crate) fn from_genesis(owner: Address, params: &GenesisParams) -> Self {
        Self {
            owner,
            cap: params.cap,
            fee_basis_points: params.fee_basis_points,
            frozen: false,
            reward_rate_per_second: params.reward_rate_per_second,
            total_supply: 0,
            metadata: params.metadata.clone(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn cap(&self) -> Amount {
        self.cap
    }

    pub fn fee_basis_points(&self) -> u16 {
        self.fee_basis_points
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn reward_rate_per_second(&self) -> Amount {
        self.reward_rate_per_second
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Supply that can still be created before hitting the cap
    pub fn headroom(&self) -> Amount {
        self.cap.saturating_sub(self.total_supply)
    }

    /// Fee charged on a transfer of `amount`, rounded down
    pub fn fee_for(&self, amount: Amount) -> Amount {
        // floor(amount * bps / scale) without forming the full product
        let bps = self.fee_basis_points as Amount;
        (amount / BASIS_POINTS_SCALE) * bps + (amount % BASIS_POINTS_SCALE) * bps / BASIS_POINTS_SCALE
    }
}
