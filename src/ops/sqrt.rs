//! Square root and reciprocal square root of approximations.
//!
//! The work happens in the reciprocal square root, whose Newton iteration
//! needs no inner division. The public square root composes it: arguments
//! below one go through `1/sqrt(1/a)` so the reciprocal square root only ever
//! sees well-scaled operands, anything else uses `a * (1/sqrt(a))`.
//!
//! Both endpoint evaluations use the exact-floor contract of
//! `sqrt_rec_dyadic`, so enclosures need only single-ulp guards.

use num_bigint::BigInt;

use crate::approx::{Approx, ERROR_BITS};
use crate::dyadic::{ilog2, sqrt_dyadic, sqrt_rec_dyadic, Dyadic, Exponent};
use crate::extended::XDyadic;

/// Square root of an approximation at working precision `res`.
///
/// A strictly negative interval is a domain error; an interval straddling
/// zero yields `Bottom` (not enough information yet).
///
/// # Panics
/// Panics when the whole interval is negative.
pub fn sqrt_approx(res: i64, a: &Approx) -> Approx {
    let Approx::Finite { m, e, .. } = a else {
        return Approx::Bottom;
    };
    if num_traits::Zero::is_zero(m) && num_traits::Zero::is_zero(e) {
        return Approx::zero();
    }
    assert!(
        a.upper() >= XDyadic::zero(),
        "square root of a strictly negative interval"
    );
    let lower = a.lower();
    if lower < XDyadic::zero() {
        return Approx::Bottom;
    }
    if lower == XDyadic::zero() {
        // The reciprocal square root blows up at zero; bound the upper
        // endpoint directly instead.
        let Some(u) = a.upper().finite().cloned() else {
            return Approx::Bottom;
        };
        let prec = -(res + 2);
        let root_hi = sqrt_dyadic(prec, &u).add(&Dyadic::new(BigInt::from(2), prec));
        let mb = a.mbound().max(res);
        return Approx::from_ends(mb, XDyadic::zero(), XDyadic::Finite(root_hi));
    }

    let working = res + ERROR_BITS;
    let a = a.set_mb(res);
    if a.upper() < XDyadic::Finite(Dyadic::one()) {
        return sqrt_rec_approx(working, &a.recip_approx()).bound_error_term();
    }
    a.mul_approx(&sqrt_rec_approx(working, &a)).bound_error_term()
}

/// Reciprocal square root of an approximation at working precision `res`.
///
/// # Panics
/// Panics when the whole interval is negative.
pub fn sqrt_rec_approx(res: i64, a: &Approx) -> Approx {
    let Approx::Finite { e, .. } = a else {
        return Approx::Bottom;
    };
    assert!(
        a.upper() > XDyadic::zero(),
        "reciprocal square root of a nonpositive interval"
    );
    if a.lower() <= XDyadic::zero() {
        return Approx::Bottom;
    }

    if num_traits::Zero::is_zero(e) {
        let Some(c) = a.centre() else {
            return Approx::Bottom;
        };
        let prec = rec_prec(res, &c);
        let root = sqrt_rec_dyadic(prec, &c);
        let hi = root.add(&Dyadic::new(BigInt::from(1), prec));
        let mb = a.mbound().max(res);
        return Approx::from_ends(mb, XDyadic::Finite(root), XDyadic::Finite(hi));
    }

    // Thick interval: 1/sqrt is decreasing, so evaluate at both endpoints
    // with one-ulp guards.
    let (Some(l), Some(u)) = (
        a.lower().finite().cloned(),
        a.upper().finite().cloned(),
    ) else {
        return Approx::Bottom;
    };
    let prec_l = rec_prec(res, &u);
    let prec_u = rec_prec(res, &l);
    let lo = sqrt_rec_dyadic(prec_l, &u);
    let hi = sqrt_rec_dyadic(prec_u, &l).add(&Dyadic::new(BigInt::from(1), prec_u));
    Approx::from_ends(a.mbound().max(res), XDyadic::Finite(lo), XDyadic::Finite(hi))
}

/// Result exponent giving `res` bits relative to the magnitude of
/// `1/sqrt(d)`; also keeps the integer square root target nonnegative.
fn rec_prec(res: i64, d: &Dyadic) -> Exponent {
    let magnitude = d.exponent() + ilog2(d.mantissa());
    -magnitude.div_euclid(2) - res.max(1)
}
