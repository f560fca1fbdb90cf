// Host module - caller identity, clock and all-or-nothing invocation

mod clock;
mod runtime;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runtime::{HostError, TokenHost};
