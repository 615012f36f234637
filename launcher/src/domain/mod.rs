//! Domain services - ledger, lifecycle, liquidity bootstrap and launch orchestration

pub mod bootstrap;
pub mod launch;
pub mod ledger;
pub mod locks;
pub mod retry;
pub mod state_machine;

pub use bootstrap::{BootstrapRequest, LiquidityBootstrapCoordinator, LiquiditySettings};
pub use launch::{AdminPolicy, LaunchOutcome, LaunchService, TokenSettings};
pub use ledger::PledgeLedger;
pub use locks::{InFlightGuard, InFlightRegistry, KeyGuard, KeyedLocks};
pub use retry::{Confirmations, RetryPolicy};
pub use state_machine::LaunchStateMachine;
