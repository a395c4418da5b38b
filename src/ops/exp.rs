//! The exponential function.
//!
//! The default route reduces the argument by a power of two so the Taylor
//! series converges with a geometric ratio well under one half, sums
//! `1/k!` coefficients against the power sequence, and squares the result
//! back up with error bounding after every squaring. A binary-splitting
//! variant of the same series is kept for very high precision work.
//!
//! Thick arguments are evaluated at both endpoints (the exponential is
//! monotone) and hulled.

use num_bigint::BigInt;
use num_integer::Roots;
use num_traits::{One, Signed, Zero};

use crate::approx::Approx;
use crate::dyadic::ilog2;
use crate::ops::series::{split_sum, taylor_a, SplitSeries};

/// Exponential of an approximation at working precision `res`.
pub fn exp_approx(res: i64, a: &Approx) -> Approx {
    exp_with(res, a, exp_taylor_core)
}

/// Exponential by binary splitting of `sum a^n / n!`. Same enclosure
/// contract as `exp_approx`; worth it only at very high precision.
pub fn exp_split_approx(res: i64, a: &Approx) -> Approx {
    exp_with(res, a, exp_split_core)
}

/// Shared reduction shell: handles `Bottom`, thick arguments (endpoint
/// hull), zero and negative arguments, then calls the core on an exact
/// positive argument.
fn exp_with(res: i64, a: &Approx, core: fn(i64, i64, &Approx) -> Approx) -> Approx {
    let Approx::Finite { m, e, .. } = a else {
        return Approx::Bottom;
    };
    let mbw = a.mbound().max(res);
    if !e.is_zero() {
        let (Some(l), Some(u)) = (a.lower().finite().cloned(), a.upper().finite().cloned())
        else {
            return Approx::Bottom;
        };
        let lo = exp_with(res, &Approx::from_dyadic_mb(mbw, &l), core);
        let hi = exp_with(res, &Approx::from_dyadic_mb(mbw, &u), core);
        return lo.union_approx(&hi);
    }
    if m.is_zero() {
        return Approx::one().set_mb(mbw);
    }
    if m.is_negative() {
        return exp_with(res, &a.neg_approx(), core)
            .recip_approx()
            .bound_error_term();
    }
    core(res, mbw, a).bound_error_term()
}

/// Argument reduction exponent: scale `a` down by `2^r` so the reduced
/// argument is below `2^(-sqrt(mb))`.
fn reduction_exponent(mbw: i64, magnitude: i64) -> i64 {
    (magnitude + mbw.sqrt()).max(0)
}

/// Working precision for the reduced series, with room for the bits the
/// squarings give back.
fn series_precision(mbw: i64, r: i64, lg: i64) -> i64 {
    6 * (mbw + r + lg + 1) / 5
}

fn exp_taylor_core(_res: i64, mbw: i64, a: &Approx) -> Approx {
    let Approx::Finite { m, s, .. } = a else {
        return Approx::Bottom;
    };
    let lg = ilog2(&m.abs());
    let r = reduction_exponent(mbw, s + lg);
    let working = series_precision(mbw, r, lg);
    let reduced = a.scale(-r).set_mb(working);

    let coefficients = (0u64..).scan(BigInt::one(), move |factorial, k| {
        if k > 0 {
            *factorial *= k;
        }
        Some(Approx::integer(factorial.clone()).set_mb(working).recip_approx())
    });
    let mut value = taylor_a(working, coefficients, &reduced);
    for _ in 0..r {
        value = value.sqr().bound_error_term_mb();
    }
    value
}

/// `exp` series recurrences for an exact reduced argument `m * 2^s`:
/// term ratio is `m / (n * 2^-s)`.
struct ExpSeries {
    mantissa: BigInt,
    shift: usize,
}

impl SplitSeries for ExpSeries {
    fn a(&self, _n: u64) -> BigInt {
        BigInt::one()
    }
    fn b(&self, _n: u64) -> BigInt {
        BigInt::one()
    }
    fn p(&self, n: u64) -> BigInt {
        if n == 0 {
            BigInt::one()
        } else {
            self.mantissa.clone()
        }
    }
    fn q(&self, n: u64) -> BigInt {
        if n == 0 {
            BigInt::one()
        } else {
            BigInt::from(n) << self.shift
        }
    }
}

fn exp_split_core(_res: i64, mbw: i64, a: &Approx) -> Approx {
    let Approx::Finite { m, s, .. } = a else {
        return Approx::Bottom;
    };
    let lg = ilog2(&m.abs());
    let r = reduction_exponent(mbw, s + lg);
    let working = series_precision(mbw, r, lg);
    let reduced = a.scale(-r);
    let Approx::Finite { m, s, .. } = &reduced else {
        return Approx::Bottom;
    };
    debug_assert!(*s < 0, "reduced exponential argument must be fractional");

    // Count terms until the (tracked upper bound of the) term magnitude
    // drops below the working precision.
    let lg_x = lg + s + 1;
    let mut lg_term = 0i64;
    let mut terms = 1u64;
    while lg_term > -(working + 2) {
        terms += 1;
        lg_term += lg_x - ilog2(&BigInt::from(terms));
    }

    let series = ExpSeries {
        mantissa: m.clone(),
        shift: (-*s) as usize,
    };
    let sums = split_sum(&series, 0, terms);
    let value = Approx::integer(sums.t)
        .set_mb(working)
        .div_approx(&Approx::integer(sums.b * sums.q).set_mb(working));
    // The omitted tail is geometric with ratio far below one half.
    let tail = Approx::new(0, 1, lg_term + 1);
    let mut value = value.add_approx(&tail);
    for _ in 0..r {
        value = value.sqr().bound_error_term_mb();
    }
    value
}
