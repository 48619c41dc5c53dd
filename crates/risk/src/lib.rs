// In crates/risk/src/lib.rs

pub mod error;
pub mod guard;
pub mod sizer;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use guard::{DrawdownGuard, is_trade_allowed};
pub use sizer::{RiskSizer, SIZE_DECIMALS, compute_size};
pub use types::{DrawdownState, PositionSize, PositionSizeRequest, RiskPolicy};
