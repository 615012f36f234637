//! # Sqrt Price Math
//!
//! Q64.96 sqrt price encoding used to initialize a pool at the ratio of the
//! deposited amounts, and the inverse used to quote one side from the other.

use crate::constants::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use crate::errors::{CoreError, CoreResult};
use alloy_primitives::{U256, U512};

/// `sqrt(amount1 / amount0) * 2^96`, floored.
///
/// Computed as `isqrt((amount1 << 192) / amount0)` in 512-bit space so any
/// pair of `u128` amounts is exact up to the final floor.
pub fn encode_sqrt_price_x96(amount1: u128, amount0: u128) -> CoreResult<U256> {
    if amount0 == 0 || amount1 == 0 {
        return Err(CoreError::InvalidPrice);
    }

    let ratio_x192 = (U512::from(amount1) << 192) / U512::from(amount0);
    let sqrt_price = narrow(isqrt(ratio_x192))?;

    if sqrt_price < MIN_SQRT_RATIO || sqrt_price >= MAX_SQRT_RATIO {
        return Err(CoreError::InvalidPrice);
    }
    Ok(sqrt_price)
}

/// Amount of token1 worth `amount0` of token0 at `sqrt_price_x96`, floored.
pub fn quote_amount1(amount0: U256, sqrt_price_x96: U256) -> CoreResult<U256> {
    let price_x192 = U512::from(sqrt_price_x96) * U512::from(sqrt_price_x96);
    narrow((U512::from(amount0) * price_x192) >> 192)
}

/// Amount of token0 worth `amount1` of token1 at `sqrt_price_x96`, floored.
pub fn quote_amount0(amount1: U256, sqrt_price_x96: U256) -> CoreResult<U256> {
    if sqrt_price_x96.is_zero() {
        return Err(CoreError::DivisionByZero);
    }
    let price_x192 = U512::from(sqrt_price_x96) * U512::from(sqrt_price_x96);
    narrow((U512::from(amount1) << 192) / price_x192)
}

/// Integer square root by Newton iteration.
fn isqrt(value: U512) -> U512 {
    let one = U512::from(1u8);
    if value <= one {
        return value;
    }
    let mut x = value;
    let mut y = (x + one) >> 1;
    while y < x {
        x = y;
        y = (x + value / x) >> 1;
    }
    x
}

fn narrow(value: U512) -> CoreResult<U256> {
    let bytes = value.to_be_bytes::<64>();
    if bytes[..32].iter().any(|b| *b != 0) {
        return Err(CoreError::MathOverflow);
    }
    Ok(U256::from_be_slice(&bytes[32..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q96;

    #[test]
    fn test_unit_price_is_q96() {
        assert_eq!(encode_sqrt_price_x96(1, 1).unwrap(), U256::from(Q96));
        assert_eq!(encode_sqrt_price_x96(5, 5).unwrap(), U256::from(Q96));
    }

    #[test]
    fn test_known_ratio() {
        // 0.05 ETH against 150k tokens (18 decimals each)
        let sqrt_price = encode_sqrt_price_x96(5 * 10u128.pow(16), 150_000 * 10u128.pow(18)).unwrap();
        assert_eq!(sqrt_price.to_string(), "45742400955009932534161870");
        // Price of four is a sqrt price of two
        assert_eq!(encode_sqrt_price_x96(4, 1).unwrap(), U256::from(Q96) * U256::from(2));
    }

    #[test]
    fn test_zero_amounts_rejected() {
        assert_eq!(encode_sqrt_price_x96(0, 1), Err(CoreError::InvalidPrice));
        assert_eq!(encode_sqrt_price_x96(1, 0), Err(CoreError::InvalidPrice));
    }

    #[test]
    fn test_extreme_ratios_out_of_bounds() {
        assert_eq!(encode_sqrt_price_x96(u128::MAX, 1), Err(CoreError::InvalidPrice));
        assert_eq!(encode_sqrt_price_x96(1, u128::MAX), Err(CoreError::InvalidPrice));
    }

    #[test]
    fn test_quotes_at_price_four() {
        let sqrt_price = encode_sqrt_price_x96(4, 1).unwrap();
        assert_eq!(quote_amount1(U256::from(10), sqrt_price).unwrap(), U256::from(40));
        assert_eq!(quote_amount0(U256::from(40), sqrt_price).unwrap(), U256::from(10));
    }
}
