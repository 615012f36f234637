//! CoinFluence Launch Pipeline
//!
//! Accumulates influencer pledges, evaluates funding thresholds, and once a
//! launch is approved mints the asset and bootstraps a full-range liquidity
//! position on a Uniswap V3 style AMM.
//!
//! Layout follows hexagonal architecture:
//! - `core`: ports (`LaunchStore`, `ChainPort`), domain records and errors
//! - `domain`: pledge ledger, state machine, bootstrap coordinator, launch service
//! - `adapters`: in-memory / PostgreSQL storage, JSON-RPC / simulated chain
//! - `api`: HTTP surface
//! - `infrastructure`: service container wiring

pub mod abi;
pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod metrics;

pub use crate::config::LauncherConfig;
pub use crate::core::{ErrorClass, LaunchError, LaunchResult};
pub use crate::infrastructure::ServiceContainer;
