//! Shared test helpers.
//!
//! Short constructors for dyadics and approximations keep the test modules
//! readable; the containment helpers check enclosures against exactly decoded
//! `f64` reference values.

use num_bigint::BigInt;

use crate::approx::Approx;
use crate::dyadic::Dyadic;
use crate::extended::XDyadic;

/// Creates a Dyadic from small mantissa and exponent.
pub fn dy(mantissa: i64, exponent: i64) -> Dyadic {
    Dyadic::new(BigInt::from(mantissa), exponent)
}

/// Creates a finite XDyadic from small mantissa and exponent.
pub fn xdy(mantissa: i64, exponent: i64) -> XDyadic {
    XDyadic::Finite(dy(mantissa, exponent))
}

/// Creates an approximation `[(m-e)*2^s, (m+e)*2^s]` with the automatic
/// midpoint bound.
pub fn ap(m: i64, e: i64, s: i64) -> Approx {
    Approx::new(m, e, s)
}

/// Creates an exact approximation `m * 2^s`.
pub fn exact(m: i64, s: i64) -> Approx {
    Approx::new(m, 0, s)
}

/// Whether the approximation encloses the exactly decoded double.
pub fn contains_f64(a: &Approx, value: f64) -> bool {
    match XDyadic::from_f64(value) {
        Some(XDyadic::Finite(d)) => a.contains_dyadic(&d),
        _ => false,
    }
}

/// Asserts enclosure of a double with a readable failure message. Only
/// meaningful when the double is exact or the enclosure is much wider than
/// one double ulp; tight enclosures should use `assert_close_f64`, since a
/// correct interval narrower than 2^-52 may exclude the rounded double while
/// enclosing the true real.
pub fn assert_contains_f64(a: &Approx, value: f64, context: &str) {
    assert!(
        contains_f64(a, value),
        "{context}: {value} escapes [{}, {}]",
        a.lower(),
        a.upper()
    );
}

/// Asserts that the midpoint of the enclosure agrees with a double reference
/// value to well within double accuracy.
pub fn assert_close_f64(a: &Approx, value: f64, context: &str) {
    let mid = a.to_f64().unwrap_or(f64::NAN);
    let tolerance = 1e-9 * (1.0 + value.abs());
    assert!(
        (mid - value).abs() <= tolerance,
        "{context}: midpoint {mid} is not within {tolerance} of {value}"
    );
}
