//! Adapters implementing the core ports
//!
//! Storage: in-memory for development and tests, PostgreSQL for deployments.
//! Chain: JSON-RPC against a node-managed account, or an in-process simulator.

pub mod chain;
pub mod storage;

pub use chain::{ChainAdapter, JsonRpcChain, SimulatedChain};
pub use storage::{MemoryStore, PostgresStore, StorageAdapter};
