//! Typed contract bindings
//!
//! Calldata encoders and receipt / return-data decoders for the contracts the
//! launcher talks to. Every decoder fails with `UnparsableResult` rather than
//! guessing when the payload does not match the expected schema.

use crate::config::ChainConfig;
use crate::core::{ContractCall, LaunchError, LaunchResult, MintedPosition, TxReceipt};
use alloy_primitives::aliases::{I24, U160, U24};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};
use coinfluence_core::math::TickRange;
use coinfluence_core::{FeeTier, TokenPair};

sol! {
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }

    interface IUniswapV3Pool {
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
    }

    interface INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            uint24 fee;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        function createAndInitializePoolIfNecessary(
            address token0,
            address token1,
            uint24 fee,
            uint160 sqrtPriceX96
        ) external payable returns (address pool);

        function mint(MintParams calldata params) external payable returns (
            uint256 tokenId,
            uint128 liquidity,
            uint256 amount0,
            uint256 amount1
        );

        function balanceOf(address owner) external view returns (uint256 balance);

        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256 tokenId);

        function positions(uint256 tokenId) external view returns (
            uint96 nonce,
            address operator,
            address token0,
            address token1,
            uint24 fee,
            int24 tickLower,
            int24 tickUpper,
            uint128 liquidity,
            uint256 feeGrowthInside0LastX128,
            uint256 feeGrowthInside1LastX128,
            uint128 tokensOwed0,
            uint128 tokensOwed1
        );

        event IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }

    interface ITokenFactory {
        function createCoin(
            string name,
            string symbol,
            string influencerName,
            address influencerWallet,
            uint256 totalSupply
        ) external payable returns (address token);

        event TokenCreated(
            address indexed tokenAddress,
            address indexed influencerWallet,
            string name,
            string symbol,
            uint256 totalSupply
        );
    }
}

/// Contract addresses of one deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub factory: Address,
    pub position_manager: Address,
    pub token_factory: Option<Address>,
    pub base_asset: Address,
}

impl From<&ChainConfig> for Deployment {
    fn from(config: &ChainConfig) -> Self {
        Self {
            factory: config.factory,
            position_manager: config.position_manager,
            token_factory: config.token_factory,
            base_asset: config.base_asset,
        }
    }
}

/// A transaction ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

// ============================================================================
// Encoders
// ============================================================================

pub fn fee_to_u24(fee: FeeTier) -> LaunchResult<U24> {
    U24::try_from(fee.fee())
        .map_err(|_| LaunchError::InvalidParameters(format!("fee tier {} does not fit uint24", fee)))
}

pub fn tick_to_i24(tick: i32) -> LaunchResult<I24> {
    I24::try_from(tick).map_err(|_| LaunchError::InvalidParameters(format!("tick {} does not fit int24", tick)))
}

fn sqrt_price_to_u160(sqrt_price_x96: U256) -> LaunchResult<U160> {
    U160::try_from_be_slice(&sqrt_price_x96.to_be_bytes::<32>())
        .ok_or_else(|| LaunchError::InvalidParameters(format!("sqrt price {} does not fit uint160", sqrt_price_x96)))
}

/// Encode a state-changing call against the deployment's contracts
pub fn encode_call(call: &ContractCall, deployment: &Deployment) -> LaunchResult<EncodedCall> {
    let encoded = match call {
        ContractCall::CreateToken {
            name,
            symbol,
            influencer_name,
            influencer,
            total_supply,
            creation_fee,
        } => EncodedCall {
            to: deployment.token_factory.ok_or(LaunchError::TokenFactoryMissing)?,
            data: ITokenFactory::createCoinCall {
                name: name.clone(),
                symbol: symbol.clone(),
                influencerName: influencer_name.clone(),
                influencerWallet: *influencer,
                totalSupply: *total_supply,
            }
            .abi_encode()
            .into(),
            value: *creation_fee,
        },
        ContractCall::CreateAndInitializePool {
            token0,
            token1,
            fee,
            sqrt_price_x96,
        } => EncodedCall {
            to: deployment.position_manager,
            data: INonfungiblePositionManager::createAndInitializePoolIfNecessaryCall {
                token0: *token0,
                token1: *token1,
                fee: fee_to_u24(*fee)?,
                sqrtPriceX96: sqrt_price_to_u160(*sqrt_price_x96)?,
            }
            .abi_encode()
            .into(),
            value: U256::ZERO,
        },
        ContractCall::Approve { token, spender, amount } => EncodedCall {
            to: *token,
            data: IERC20::approveCall {
                spender: *spender,
                amount: *amount,
            }
            .abi_encode()
            .into(),
            value: U256::ZERO,
        },
        ContractCall::Mint(params) => EncodedCall {
            to: deployment.position_manager,
            data: INonfungiblePositionManager::mintCall {
                params: INonfungiblePositionManager::MintParams {
                    token0: params.token0,
                    token1: params.token1,
                    fee: fee_to_u24(params.fee)?,
                    tickLower: tick_to_i24(params.tick_lower)?,
                    tickUpper: tick_to_i24(params.tick_upper)?,
                    amount0Desired: params.amount0_desired,
                    amount1Desired: params.amount1_desired,
                    amount0Min: params.amount0_min,
                    amount1Min: params.amount1_min,
                    recipient: params.recipient,
                    deadline: U256::from(params.deadline),
                },
            }
            .abi_encode()
            .into(),
            value: params.value,
        },
    };
    Ok(encoded)
}

pub fn get_pool_calldata(pair: &TokenPair, fee: FeeTier) -> LaunchResult<Bytes> {
    Ok(IUniswapV3Factory::getPoolCall {
        tokenA: pair.token0,
        tokenB: pair.token1,
        fee: fee_to_u24(fee)?,
    }
    .abi_encode()
    .into())
}

pub fn slot0_calldata() -> Bytes {
    IUniswapV3Pool::slot0Call {}.abi_encode().into()
}

pub fn balance_of_calldata(owner: Address) -> Bytes {
    IERC20::balanceOfCall { owner }.abi_encode().into()
}

pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

pub fn token_of_owner_calldata(owner: Address, index: U256) -> Bytes {
    INonfungiblePositionManager::tokenOfOwnerByIndexCall { owner, index }
        .abi_encode()
        .into()
}

pub fn positions_calldata(token_id: U256) -> Bytes {
    INonfungiblePositionManager::positionsCall { tokenId: token_id }
        .abi_encode()
        .into()
}

// ============================================================================
// Decoders
// ============================================================================

pub fn decode_address(call: &'static str, data: &[u8]) -> LaunchResult<Address> {
    <Address as SolValue>::abi_decode(data).map_err(|e| LaunchError::unparsable(call, e))
}

pub fn decode_u256(call: &'static str, data: &[u8]) -> LaunchResult<U256> {
    <U256 as SolValue>::abi_decode(data).map_err(|e| LaunchError::unparsable(call, e))
}

/// `sqrtPriceX96` is the first word of `slot0()`
pub fn decode_slot0_sqrt_price(data: &[u8]) -> LaunchResult<U256> {
    if data.len() < 32 {
        return Err(LaunchError::unparsable("slot0", format!("expected at least 32 bytes, got {}", data.len())));
    }
    let word = U256::from_be_slice(&data[..32]);
    if word >> 160 != U256::ZERO {
        return Err(LaunchError::unparsable("slot0", "sqrtPriceX96 exceeds uint160"));
    }
    Ok(word)
}

/// Whether a `positions(tokenId)` result describes a position on this pair,
/// fee and range; returns its liquidity when it does.
pub fn decode_matching_position(
    data: &[u8],
    pair: &TokenPair,
    fee: FeeTier,
    range: TickRange,
) -> LaunchResult<Option<u128>> {
    let position = INonfungiblePositionManager::positionsCall::abi_decode_returns(data)
        .map_err(|e| LaunchError::unparsable("positions", e))?;
    let matches = position.token0 == pair.token0
        && position.token1 == pair.token1
        && position.fee == fee_to_u24(fee)?
        && position.tickLower == tick_to_i24(range.lower)?
        && position.tickUpper == tick_to_i24(range.upper)?;
    Ok(matches.then_some(position.liquidity))
}

/// Position minted by a confirmed `mint` transaction
pub fn decode_minted_position(receipt: &TxReceipt, position_manager: Address) -> LaunchResult<MintedPosition> {
    let log = receipt
        .logs
        .iter()
        .find(|log| {
            log.address == position_manager
                && log.topics.first() == Some(&INonfungiblePositionManager::IncreaseLiquidity::SIGNATURE_HASH)
        })
        .ok_or_else(|| LaunchError::unparsable("mint", "receipt has no IncreaseLiquidity event"))?;

    let event = INonfungiblePositionManager::IncreaseLiquidity::decode_raw_log(log.topics.iter().copied(), &log.data)
        .map_err(|e| LaunchError::unparsable("mint", e))?;

    Ok(MintedPosition {
        token_id: event.tokenId,
        liquidity: event.liquidity,
        amount0: event.amount0,
        amount1: event.amount1,
        tx_hash: receipt.tx_hash,
    })
}

/// Amounts of the `IncreaseLiquidity` event emitted for `token_id`
pub fn decode_increase_liquidity(
    topics: &[B256],
    data: &[u8],
) -> LaunchResult<(U256, u128, U256, U256)> {
    let event = INonfungiblePositionManager::IncreaseLiquidity::decode_raw_log(topics.iter().copied(), data)
        .map_err(|e| LaunchError::unparsable("IncreaseLiquidity", e))?;
    Ok((event.tokenId, event.liquidity, event.amount0, event.amount1))
}

pub fn increase_liquidity_topic() -> B256 {
    INonfungiblePositionManager::IncreaseLiquidity::SIGNATURE_HASH
}

/// Address of the asset deployed by a confirmed `createCoin` transaction
pub fn decode_created_token(receipt: &TxReceipt, token_factory: Address) -> LaunchResult<Address> {
    let log = receipt
        .logs
        .iter()
        .find(|log| {
            log.address == token_factory && log.topics.first() == Some(&ITokenFactory::TokenCreated::SIGNATURE_HASH)
        })
        .ok_or_else(|| LaunchError::unparsable("createCoin", "receipt has no TokenCreated event"))?;

    let event = ITokenFactory::TokenCreated::decode_raw_log(log.topics.iter().copied(), &log.data)
        .map_err(|e| LaunchError::unparsable("createCoin", e))?;
    Ok(event.tokenAddress)
}
