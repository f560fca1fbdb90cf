// Identity module - account addresses and the Ed25519 keys behind them

mod address;
mod keypair;

pub use address::*;
pub use keypair::*;
