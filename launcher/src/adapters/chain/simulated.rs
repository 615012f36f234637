//! In-process EVM ledger simulation
//!
//! Models the slice of chain behavior the launcher depends on: ERC-20
//! balances and allowances, a token factory, pool creation with price
//! initialization, full-range mints with slippage and deadline checks, and
//! receipts with the events the real contracts emit. Faults can be injected
//! per operation to exercise retry and resume paths.

use crate::abi::{Deployment, INonfungiblePositionManager, ITokenFactory};
use crate::core::{
    ChainError, ChainPort, ContractCall, LaunchResult, MintParams, MintedPosition, ReceiptLog, TxReceipt,
};
use alloy_primitives::{address, keccak256, Address, B256, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use coinfluence_core::math::{quote_amount0, quote_amount1, TickRange};
use coinfluence_core::{allocate, FeeTier, TokenPair, MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Receives the platform share of simulated token deployments
pub const SIMULATED_PLATFORM_WALLET: Address = address!("0x00000000000000000000000000000000000000fe");

const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
const BLOCK_TIME_SECS: u64 = 2;

/// Injected failure for the next matching operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The node cannot be reached; nothing is broadcast
    Unavailable,
    /// The transaction is mined and reverts
    Revert,
    /// The transaction is accepted but never mined
    Drop,
    /// The transaction is mined but the response never reaches the caller
    Lost,
}

struct SimPool {
    address: Address,
    pair: TokenPair,
    fee: FeeTier,
    sqrt_price: U256,
}

struct SimPosition {
    owner: Address,
    pair: TokenPair,
    fee: FeeTier,
    range: TickRange,
    minted: MintedPosition,
}

struct SimState {
    block: u64,
    timestamp: u64,
    nonce: u64,
    native: HashMap<Address, U256>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    pools: Vec<SimPool>,
    positions: Vec<SimPosition>,
    receipts: HashMap<B256, TxReceipt>,
    faults: HashMap<&'static str, VecDeque<Fault>>,
    submissions: HashMap<&'static str, usize>,
}

type Execution = Result<Vec<ReceiptLog>, String>;

impl SimState {
    fn next_hash(&mut self) -> B256 {
        self.nonce += 1;
        keccak256(format!("simulated-tx-{}", self.nonce))
    }

    fn take_fault(&mut self, operation: &'static str) -> Option<Fault> {
        self.faults.get_mut(operation).and_then(VecDeque::pop_front)
    }

    fn mine(&mut self) {
        self.block += 1;
        self.timestamp += BLOCK_TIME_SECS;
    }

    fn balance(&self, token: Address, owner: Address) -> U256 {
        self.balances.get(&(token, owner)).copied().unwrap_or_default()
    }

    fn native_balance(&self, owner: Address) -> U256 {
        self.native.get(&owner).copied().unwrap_or_default()
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn credit(&mut self, token: Address, owner: Address, amount: U256) {
        let balance = self.balances.entry((token, owner)).or_default();
        *balance = balance.saturating_add(amount);
    }

    fn pool_mut(&mut self, pair: &TokenPair, fee: FeeTier) -> Option<&mut SimPool> {
        self.pools.iter_mut().find(|p| &p.pair == pair && p.fee == fee)
    }

    fn execute(&mut self, sender: Address, deployment: &Deployment, call: &ContractCall) -> Execution {
        match call {
            ContractCall::CreateToken {
                name,
                symbol,
                influencer,
                total_supply,
                creation_fee,
                ..
            } => self.create_token(sender, deployment, name, symbol, *influencer, *total_supply, *creation_fee),
            ContractCall::CreateAndInitializePool {
                token0,
                token1,
                fee,
                sqrt_price_x96,
            } => self.create_pool(*token0, *token1, *fee, *sqrt_price_x96),
            ContractCall::Approve { token, spender, amount } => {
                self.allowances.insert((*token, sender, *spender), *amount);
                Ok(Vec::new())
            }
            ContractCall::Mint(params) => self.mint(sender, deployment, params),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_token(
        &mut self,
        sender: Address,
        deployment: &Deployment,
        name: &str,
        symbol: &str,
        influencer: Address,
        total_supply: U256,
        creation_fee: U256,
    ) -> Execution {
        let factory = deployment.token_factory.ok_or("no token factory deployed")?;
        if total_supply > U256::from(u128::MAX) {
            return Err("supply too large".to_string());
        }
        let plan = allocate(total_supply.saturating_to::<u128>()).map_err(|e| e.to_string())?;
        let native = self.native_balance(sender);
        if native < creation_fee {
            return Err("insufficient creation fee".to_string());
        }

        let token = Address::from_word(keccak256(format!("simulated-token-{}-{}", symbol, self.nonce)));
        self.native.insert(sender, native - creation_fee);
        self.credit(token, influencer, U256::from(plan.influencer));
        self.credit(token, sender, U256::from(plan.treasury));
        self.credit(token, SIMULATED_PLATFORM_WALLET, U256::from(plan.platform));

        let event = ITokenFactory::TokenCreated {
            tokenAddress: token,
            influencerWallet: influencer,
            name: name.to_string(),
            symbol: symbol.to_string(),
            totalSupply: total_supply,
        };
        Ok(vec![receipt_log(factory, event.encode_log_data())])
    }

    fn create_pool(&mut self, token0: Address, token1: Address, fee: FeeTier, sqrt_price: U256) -> Execution {
        if token0 >= token1 {
            return Err("tokens out of order".to_string());
        }
        if !fee.is_enumerated() {
            return Err("fee tier not enabled".to_string());
        }
        if sqrt_price < MIN_SQRT_RATIO || sqrt_price >= MAX_SQRT_RATIO {
            return Err("sqrt price out of bounds".to_string());
        }

        let pair = TokenPair { token0, token1 };
        match self.pool_mut(&pair, fee) {
            Some(pool) if pool.sqrt_price.is_zero() => pool.sqrt_price = sqrt_price,
            Some(_) => {}
            None => {
                let address = pool_address(&pair, fee);
                self.pools.push(SimPool {
                    address,
                    pair,
                    fee,
                    sqrt_price,
                });
            }
        }
        Ok(Vec::new())
    }

    fn mint(&mut self, sender: Address, deployment: &Deployment, params: &MintParams) -> Execution {
        if self.timestamp > params.deadline {
            return Err("Transaction too old".to_string());
        }
        let pair = TokenPair {
            token0: params.token0,
            token1: params.token1,
        };
        let sqrt_price = match self.pool_mut(&pair, params.fee) {
            Some(pool) if !pool.sqrt_price.is_zero() => pool.sqrt_price,
            _ => return Err("pool not initialized".to_string()),
        };
        let range = TickRange {
            lower: params.tick_lower,
            upper: params.tick_upper,
        };
        range.validate(params.fee.tick_spacing()).map_err(|e| e.to_string())?;

        // Deposit at the pool ratio, bounded by both desired amounts
        let needed1 = quote_amount1(params.amount0_desired, sqrt_price).map_err(|e| e.to_string())?;
        let (used0, used1) = if needed1 <= params.amount1_desired {
            (params.amount0_desired, needed1)
        } else {
            let needed0 = quote_amount0(params.amount1_desired, sqrt_price).map_err(|e| e.to_string())?;
            (needed0, params.amount1_desired)
        };
        if used0 < params.amount0_min || used1 < params.amount1_min {
            return Err("Price slippage check".to_string());
        }

        let spender = deployment.position_manager;
        let mut native_spent = U256::ZERO;
        for (token, used) in [(params.token0, used0), (params.token1, used1)] {
            if token == deployment.base_asset {
                if params.value < used {
                    return Err("insufficient native value".to_string());
                }
                native_spent = used;
            } else {
                if self.balance(token, sender) < used {
                    return Err("transfer amount exceeds balance".to_string());
                }
                if self.allowance(token, sender, spender) < used {
                    return Err("transfer amount exceeds allowance".to_string());
                }
            }
        }
        let native = self.native_balance(sender);
        if native < native_spent {
            return Err("insufficient native balance".to_string());
        }

        self.native.insert(sender, native - native_spent);
        for (token, used) in [(params.token0, used0), (params.token1, used1)] {
            if token != deployment.base_asset {
                let balance = self.balance(token, sender);
                self.balances.insert((token, sender), balance - used);
                let allowance = self.allowance(token, sender, spender);
                self.allowances.insert((token, sender, spender), allowance - used);
            }
        }

        let token_id = U256::from(self.positions.len() + 1);
        let liquidity = isqrt(used0.saturating_mul(used1)).saturating_to::<u128>();
        let event = INonfungiblePositionManager::IncreaseLiquidity {
            tokenId: token_id,
            liquidity,
            amount0: used0,
            amount1: used1,
        };
        self.positions.push(SimPosition {
            owner: params.recipient,
            pair,
            fee: params.fee,
            range,
            minted: MintedPosition {
                token_id,
                liquidity,
                amount0: used0,
                amount1: used1,
                // Patched once the transaction hash is known
                tx_hash: B256::ZERO,
            },
        });
        Ok(vec![receipt_log(spender, event.encode_log_data())])
    }
}

pub struct SimulatedChain {
    sender: Address,
    deployment: Deployment,
    state: Mutex<SimState>,
}

impl SimulatedChain {
    pub fn new(sender: Address, deployment: Deployment) -> Self {
        Self {
            sender,
            deployment,
            state: Mutex::new(SimState {
                block: 1,
                timestamp: GENESIS_TIMESTAMP,
                nonce: 0,
                native: HashMap::new(),
                balances: HashMap::new(),
                allowances: HashMap::new(),
                pools: Vec::new(),
                positions: Vec::new(),
                receipts: HashMap::new(),
                faults: HashMap::new(),
                submissions: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn fund_native(&self, owner: Address, amount: U256) {
        let mut state = self.state();
        let balance = state.native_balance(owner);
        state.native.insert(owner, balance.saturating_add(amount));
    }

    pub fn mint_tokens(&self, token: Address, owner: Address, amount: U256) {
        self.state().credit(token, owner, amount);
    }

    /// Fail the next `operation`: a call label (`create_token`, `create_pool`,
    /// `approve`, `mint`) or a read (`get_pool`, `slot0`, `balance_of`,
    /// `native_balance`, `allowance`, `receipt`, `find_position`, `latest_timestamp`)
    pub fn inject_fault(&self, operation: &'static str, fault: Fault) {
        self.state().faults.entry(operation).or_default().push_back(fault);
    }

    /// Transactions submitted for a call label, including failed ones
    pub fn submissions(&self, label: &str) -> usize {
        self.state().submissions.get(label).copied().unwrap_or_default()
    }

    pub fn pool_count(&self) -> usize {
        self.state().pools.len()
    }

    pub fn position_count(&self) -> usize {
        self.state().positions.len()
    }

    /// Register a pool created by someone else, optionally uninitialized
    pub fn create_pool_externally(&self, pair: TokenPair, fee: FeeTier, sqrt_price: U256) -> Address {
        let mut state = self.state();
        let address = pool_address(&pair, fee);
        state.pools.push(SimPool {
            address,
            pair,
            fee,
            sqrt_price,
        });
        address
    }

    pub fn advance_time(&self, secs: u64) {
        let mut state = self.state();
        state.timestamp += secs;
        state.block += 1;
    }

    fn read_fault(&self, operation: &'static str) -> LaunchResult<()> {
        match self.state().take_fault(operation) {
            Some(_) => Err(ChainError::ConnectionFailed(format!("simulated outage during {}", operation)).into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainPort for SimulatedChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn get_pool(&self, pair: &TokenPair, fee: FeeTier) -> LaunchResult<Option<Address>> {
        self.read_fault("get_pool")?;
        let state = self.state();
        Ok(state
            .pools
            .iter()
            .find(|p| &p.pair == pair && p.fee == fee)
            .map(|p| p.address))
    }

    async fn pool_sqrt_price(&self, pool: Address) -> LaunchResult<U256> {
        self.read_fault("slot0")?;
        let state = self.state();
        state
            .pools
            .iter()
            .find(|p| p.address == pool)
            .map(|p| p.sqrt_price)
            .ok_or_else(|| ChainError::Reverted(format!("no contract at {}", pool)).into())
    }

    async fn token_balance(&self, token: Address, owner: Address) -> LaunchResult<U256> {
        self.read_fault("balance_of")?;
        Ok(self.state().balance(token, owner))
    }

    async fn native_balance(&self, owner: Address) -> LaunchResult<U256> {
        self.read_fault("native_balance")?;
        Ok(self.state().native_balance(owner))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> LaunchResult<U256> {
        self.read_fault("allowance")?;
        Ok(self.state().allowance(token, owner, spender))
    }

    async fn latest_timestamp(&self) -> LaunchResult<u64> {
        self.read_fault("latest_timestamp")?;
        Ok(self.state().timestamp)
    }

    async fn submit(&self, call: ContractCall) -> LaunchResult<B256> {
        let label = call.label();
        let mut state = self.state();
        *state.submissions.entry(label).or_default() += 1;

        let fault = state.take_fault(label);
        if fault == Some(Fault::Unavailable) {
            return Err(ChainError::ConnectionFailed(format!("simulated outage during {}", label)).into());
        }
        let tx_hash = state.next_hash();
        if fault == Some(Fault::Drop) {
            debug!(%tx_hash, label, "Simulated transaction dropped");
            return Ok(tx_hash);
        }

        state.mine();
        let execution = if fault == Some(Fault::Revert) {
            Err("simulated revert".to_string())
        } else {
            state.execute(self.sender, &self.deployment, &call)
        };

        let (success, logs) = match execution {
            Ok(logs) => (true, logs),
            Err(reason) => {
                debug!(%tx_hash, label, %reason, "Simulated transaction reverted");
                (false, Vec::new())
            }
        };
        if success && label == "mint" {
            if let Some(position) = state.positions.last_mut() {
                position.minted.tx_hash = tx_hash;
            }
        }

        let block_number = state.block;
        state.receipts.insert(
            tx_hash,
            TxReceipt {
                tx_hash,
                success,
                block_number,
                logs,
            },
        );
        if fault == Some(Fault::Lost) {
            debug!(%tx_hash, label, "Simulated submission response lost");
            return Err(ChainError::Timeout(Duration::ZERO).into());
        }
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: B256) -> LaunchResult<Option<TxReceipt>> {
        self.read_fault("receipt")?;
        Ok(self.state().receipts.get(&tx_hash).cloned())
    }

    async fn find_position(
        &self,
        owner: Address,
        pair: &TokenPair,
        fee: FeeTier,
        range: TickRange,
    ) -> LaunchResult<Option<MintedPosition>> {
        self.read_fault("find_position")?;
        let state = self.state();
        Ok(state
            .positions
            .iter()
            .find(|p| p.owner == owner && &p.pair == pair && p.fee == fee && p.range == range)
            .map(|p| p.minted))
    }

    async fn health_check(&self) -> LaunchResult<()> {
        Ok(())
    }
}

fn receipt_log(address: Address, log: alloy_primitives::LogData) -> ReceiptLog {
    ReceiptLog {
        address,
        topics: log.topics().to_vec(),
        data: log.data,
    }
}

fn pool_address(pair: &TokenPair, fee: FeeTier) -> Address {
    let mut seed = Vec::with_capacity(44);
    seed.extend_from_slice(pair.token0.as_slice());
    seed.extend_from_slice(pair.token1.as_slice());
    seed.extend_from_slice(&fee.fee().to_be_bytes());
    Address::from_word(keccak256(seed))
}

fn isqrt(value: U256) -> U256 {
    if value <= U256::from(1) {
        return value;
    }
    let mut x = value;
    let mut y = (x >> 1) + U256::from(1);
    while y < x {
        x = y;
        y = (x + value / x) >> 1;
    }
    x
}
