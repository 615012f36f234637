//! Bounded retries with exponential backoff for idempotent external calls

use crate::config::RetryConfig;
use crate::core::{ChainError, ChainPort, LaunchResult, TxReceipt};
use alloy_primitives::B256;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Applies the local call timeout and retries transient failures.
///
/// Only wrap operations that are safe to repeat: reads, record writes, and
/// transactions that are no-ops when already applied.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn call_timeout(&self) -> Duration {
        self.config.call_timeout()
    }

    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> LaunchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LaunchResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match self.once(call()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Single attempt bounded by the call timeout; for calls that must not repeat
    pub async fn once<T, Fut>(&self, call: Fut) -> LaunchResult<T>
    where
        Fut: Future<Output = LaunchResult<T>>,
    {
        let timeout = self.config.call_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Timeout(timeout).into()),
        }
    }
}

/// Polling schedule for transaction receipts
#[derive(Debug, Clone, Copy)]
pub struct Confirmations {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Confirmations {
    /// Poll until the receipt appears; `ConfirmationTimeout` once `timeout` elapses
    pub async fn wait<C: ChainPort>(
        &self,
        chain: &C,
        retry: &RetryPolicy,
        tx_hash: B256,
    ) -> LaunchResult<TxReceipt> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(receipt) = retry.run("eth_getTransactionReceipt", || chain.receipt(tx_hash)).await? {
                debug!(%tx_hash, success = receipt.success, block = receipt.block_number, "Receipt available");
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(ChainError::ConfirmationTimeout(tx_hash).into());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
