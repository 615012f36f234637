//! Ethereum JSON-RPC chain adapter
//!
//! Transactions are sent with `eth_sendTransaction` from a node-managed
//! account; the node signs and assigns nonces. Reads go through `eth_call`
//! against the latest block.

use crate::abi::{self, Deployment};
use crate::config::ChainConfig;
use crate::core::{
    ChainError, ChainPort, ContractCall, LaunchError, LaunchResult, MintedPosition, ReceiptLog, TxReceipt,
};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use coinfluence_core::math::TickRange;
use coinfluence_core::{FeeTier, TokenPair};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on positions scanned when recovering a lost mint
const MAX_POSITION_SCAN: u64 = 256;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    transaction_hash: Option<B256>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    status: Option<U64>,
    block_number: Option<U64>,
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    timestamp: U64,
}

pub struct JsonRpcChain {
    client: reqwest::Client,
    url: String,
    chain_id: u64,
    sender: Address,
    deployment: Deployment,
    log_from_block: u64,
    request_id: AtomicU64,
}

impl JsonRpcChain {
    pub fn new(config: &ChainConfig, request_timeout: Duration) -> LaunchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            url: config.rpc_url.clone(),
            chain_id: config.chain_id,
            sender: config.launcher_account,
            deployment: Deployment::from(config),
            log_from_block: config.log_from_block,
            request_id: AtomicU64::new(1),
        })
    }

    /// Raw request; `None` when the node answers `null`
    async fn request_optional<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> LaunchResult<Option<T>> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "JSON-RPC request");

        let response: RpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            let lowered = error.message.to_ascii_lowercase();
            if lowered.contains("revert") {
                return Err(ChainError::Reverted(error.message).into());
            }
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            }
            .into());
        }
        Ok(response.result)
    }

    async fn request<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> LaunchResult<T> {
        self.request_optional(method, params)
            .await?
            .ok_or_else(|| LaunchError::unparsable(method, "missing result"))
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> LaunchResult<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn call_u256(&self, call: &'static str, to: Address, data: Bytes) -> LaunchResult<U256> {
        let raw = self.eth_call(to, data).await?;
        abi::decode_u256(call, &raw)
    }

    /// Amounts deposited by the mint that created `token_id`
    async fn mint_log(&self, token_id: U256) -> LaunchResult<Option<MintedPosition>> {
        let filter = json!({
            "address": self.deployment.position_manager,
            "topics": [abi::increase_liquidity_topic(), B256::from(token_id.to_be_bytes::<32>())],
            "fromBlock": format!("{:#x}", self.log_from_block),
            "toBlock": "latest",
        });
        let logs: Vec<RpcLog> = self.request("eth_getLogs", json!([filter])).await?;

        let Some(log) = logs.into_iter().next() else {
            return Ok(None);
        };
        let (token_id, liquidity, amount0, amount1) = abi::decode_increase_liquidity(&log.topics, &log.data)?;
        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| LaunchError::unparsable("eth_getLogs", "log without transaction hash"))?;
        Ok(Some(MintedPosition {
            token_id,
            liquidity,
            amount0,
            amount1,
            tx_hash,
        }))
    }
}

#[async_trait]
impl ChainPort for JsonRpcChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn get_pool(&self, pair: &TokenPair, fee: FeeTier) -> LaunchResult<Option<Address>> {
        let raw = self
            .eth_call(self.deployment.factory, abi::get_pool_calldata(pair, fee)?)
            .await?;
        let pool = abi::decode_address("getPool", &raw)?;
        Ok((pool != Address::ZERO).then_some(pool))
    }

    async fn pool_sqrt_price(&self, pool: Address) -> LaunchResult<U256> {
        let raw = self.eth_call(pool, abi::slot0_calldata()).await?;
        abi::decode_slot0_sqrt_price(&raw)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> LaunchResult<U256> {
        self.call_u256("balanceOf", token, abi::balance_of_calldata(owner)).await
    }

    async fn native_balance(&self, owner: Address) -> LaunchResult<U256> {
        self.request("eth_getBalance", json!([owner, "latest"])).await
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> LaunchResult<U256> {
        self.call_u256("allowance", token, abi::allowance_calldata(owner, spender))
            .await
    }

    async fn latest_timestamp(&self) -> LaunchResult<u64> {
        let block: RpcBlock = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        Ok(block.timestamp.as_limbs()[0])
    }

    async fn submit(&self, call: ContractCall) -> LaunchResult<B256> {
        let encoded = abi::encode_call(&call, &self.deployment)?;
        let tx = json!({
            "from": self.sender,
            "to": encoded.to,
            "data": encoded.data,
            "value": encoded.value,
        });
        let tx_hash: B256 = self.request("eth_sendTransaction", json!([tx])).await?;
        debug!(call = call.label(), %tx_hash, "Transaction submitted");
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: B256) -> LaunchResult<Option<TxReceipt>> {
        let receipt: Option<RpcReceipt> = self
            .request_optional("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        Ok(receipt.map(|receipt| TxReceipt {
            tx_hash: receipt.transaction_hash,
            success: receipt.status == Some(U64::from(1)),
            block_number: receipt.block_number.map(|n| n.as_limbs()[0]).unwrap_or_default(),
            logs: receipt
                .logs
                .into_iter()
                .map(|log| ReceiptLog {
                    address: log.address,
                    topics: log.topics,
                    data: log.data,
                })
                .collect(),
        }))
    }

    async fn find_position(
        &self,
        owner: Address,
        pair: &TokenPair,
        fee: FeeTier,
        range: TickRange,
    ) -> LaunchResult<Option<MintedPosition>> {
        let npm = self.deployment.position_manager;
        let count = self
            .call_u256("balanceOf", npm, abi::balance_of_calldata(owner))
            .await?;
        if count > U256::from(MAX_POSITION_SCAN) {
            warn!(%owner, %count, limit = MAX_POSITION_SCAN, "Owner holds many positions, scanning the newest only");
        }
        let count = count.min(U256::from(MAX_POSITION_SCAN)).saturating_to::<u64>();

        // Newest first: a recovered mint is the most recent position
        for index in (0..count).rev() {
            let token_id = self
                .call_u256(
                    "tokenOfOwnerByIndex",
                    npm,
                    abi::token_of_owner_calldata(owner, U256::from(index)),
                )
                .await?;
            let raw = self.eth_call(npm, abi::positions_calldata(token_id)).await?;
            if abi::decode_matching_position(&raw, pair, fee, range)?.is_none() {
                continue;
            }
            return match self.mint_log(token_id).await? {
                Some(position) => Ok(Some(position)),
                None => Err(LaunchError::unparsable(
                    "eth_getLogs",
                    format!("no IncreaseLiquidity log for position {}", token_id),
                )),
            };
        }
        Ok(None)
    }

    async fn health_check(&self) -> LaunchResult<()> {
        let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
        let chain_id = chain_id.as_limbs()[0];
        if chain_id != self.chain_id {
            return Err(LaunchError::InvalidParameters(format!(
                "node reports chain id {}, expected {}",
                chain_id, self.chain_id
            )));
        }
        Ok(())
    }
}
