//! # CoinFluence Core - Shared Launch Logic
//!
//! This crate contains the pure types and arithmetic of an influencer token
//! launch, shared between the launcher service and off-chain clients. It provides:
//!
//! - Currency, status and fee-tier definitions
//! - The fixed-percentage allocation engine
//! - Threshold evaluation and forward-only status transitions
//! - Canonical token ordering and full-range tick / sqrt price math
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization for off-chain use

pub mod allocation;
pub mod constants;
pub mod errors;
pub mod math;
pub mod ordering;
pub mod status;
pub mod threshold;
pub mod types;

// Re-export commonly used items
pub use allocation::{allocate, AllocationPlan};
pub use constants::*;
pub use errors::{CoreError, CoreResult};
pub use ordering::TokenPair;
pub use threshold::{evaluate, Thresholds};
pub use types::*;
