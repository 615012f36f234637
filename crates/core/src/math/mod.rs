//! # Launch Math
//!
//! Full-range tick bounds, initial pool price encoding and slippage bounds.

pub mod slippage;
pub mod sqrt_price;
pub mod tick_math;

pub use slippage::*;
pub use sqrt_price::*;
pub use tick_math::*;
