//! # Tick Math
//!
//! Tick bounds for full-range positions. The AMM only accepts ticks that are
//! multiples of the pool's spacing, so the global bounds are rounded inward.

use crate::constants::{MAX_TICK, MIN_TICK};
use crate::errors::{CoreError, CoreResult};
use crate::types::FeeTier;

/// Inclusive tick bounds of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    /// Reject ranges the AMM would revert on.
    pub fn validate(&self, spacing: i32) -> CoreResult<()> {
        let invalid = || CoreError::InvalidTickRange {
            lower: self.lower,
            upper: self.upper,
            spacing,
        };
        if spacing <= 0 {
            return Err(CoreError::InvalidTickSpacing(spacing));
        }
        if self.lower >= self.upper || self.lower < MIN_TICK || self.upper > MAX_TICK {
            return Err(invalid());
        }
        if self.lower % spacing != 0 || self.upper % spacing != 0 {
            return Err(invalid());
        }
        Ok(())
    }
}

/// Widest multiples of `spacing` inside `[MIN_TICK, MAX_TICK]`.
pub fn full_range_ticks(spacing: i32) -> CoreResult<TickRange> {
    if spacing <= 0 {
        return Err(CoreError::InvalidTickSpacing(spacing));
    }
    let range = TickRange {
        lower: ceil_div(MIN_TICK, spacing) * spacing,
        upper: floor_div(MAX_TICK, spacing) * spacing,
    };
    range.validate(spacing)?;
    Ok(range)
}

/// Full-range bounds for a fee tier, using its tick spacing.
pub fn full_range_for_fee(fee: FeeTier) -> CoreResult<TickRange> {
    full_range_ticks(fee.tick_spacing())
}

fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) == (b < 0)) {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range_medium_fee() {
        let range = full_range_for_fee(FeeTier::MEDIUM).unwrap();
        assert_eq!(range, TickRange { lower: -887_220, upper: 887_220 });
    }

    #[test]
    fn test_full_range_other_tiers() {
        assert_eq!(
            full_range_for_fee(FeeTier::LOW).unwrap(),
            TickRange { lower: -887_270, upper: 887_270 }
        );
        assert_eq!(
            full_range_for_fee(FeeTier::HIGH).unwrap(),
            TickRange { lower: -887_200, upper: 887_200 }
        );
        // Unknown tier uses the 0.3% spacing
        assert_eq!(
            full_range_for_fee(FeeTier(42)).unwrap(),
            full_range_for_fee(FeeTier::MEDIUM).unwrap()
        );
    }

    #[test]
    fn test_invalid_spacing_and_ranges() {
        assert_eq!(full_range_ticks(0), Err(CoreError::InvalidTickSpacing(0)));
        assert!(TickRange { lower: 60, upper: 60 }.validate(60).is_err());
        assert!(TickRange { lower: -61, upper: 60 }.validate(60).is_err());
        assert!(TickRange { lower: -887_280, upper: 60 }.validate(60).is_err());
    }
}
