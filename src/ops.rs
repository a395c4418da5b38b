//! Elementary functions on approximations.
//!
//! Each module implements one family of operations at the `Approx` level,
//! taking a working precision `res` and returning an enclosure:
//! - `series`: Taylor summation frameworks and binary splitting
//! - `sqrt`: square root and reciprocal square root
//! - `exp`: the exponential
//! - `log`: logarithms, including the AGM method for high precision
//! - `trig`: sine, cosine and arctangent
//! - `pi`: pi by several algorithms

pub mod exp;
pub mod log;
pub mod pi;
pub mod series;
pub mod sqrt;
pub mod trig;
