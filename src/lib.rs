//! Computable real arithmetic over centred dyadic interval approximations.
//!
//! A computable real is represented as a lazy stream of validated enclosures:
//! ask a [`Real`] for `d` bits with [`Real::require`] and it refines itself
//! through an escalating resource sequence until it can hand back an interval
//! with more than `d` correct bits after the binary point. Field operations
//! and the usual elementary functions (`sqrt`, `exp`, `log`, trigonometric
//! and hyperbolic families, `pi`) are closed over this representation and
//! preserve the enclosure property throughout.
//!
//! The interval workhorse is [`Approx`], a centred dyadic interval
//! `[(m-e)*2^s, (m+e)*2^s]` with a floating-point-style cap on the midpoint
//! size, plus the distinguished `Bottom` meaning "no information yet".
//! Exact dyadic numbers and their extended (infinite) variants live in
//! [`dyadic`] and [`extended`].
//!
//! ```
//! use creal::Real;
//!
//! let gelfond = Real::pi().exp(); // e^pi
//! let enclosure = gelfond.require(100);
//! assert!(enclosure.to_string().starts_with("23.14069263277926"));
//! ```
//!
//! Total equality and ordering of computable reals are uncomputable and
//! deliberately absent: `Real` implements neither `PartialEq` nor
//! `PartialOrd`, and the partial order on `Approx` answers `None` on
//! overlapping intervals.

pub mod approx;
pub mod dyadic;
pub mod error;
pub mod extended;
pub mod ops;
pub mod real;
pub mod test_utils;

pub use approx::{Approx, XBits, BOTTOM_SYMBOL, DEFAULT_PRECISION, ERROR_BITS};
pub use dyadic::{Dyadic, Exponent};
pub use error::ParseRealError;
pub use extended::XDyadic;
pub use real::{
    ok, pi, resource, show_real, show_real_n, Real, DEFAULT_MAX_REQUIRE_STEPS, RESOURCE_INITIAL,
};
