//! Natural logarithms.
//!
//! The default route shifts the argument into `[2/3, 4/3]` (an exact power
//! of two scaling, so exact arguments stay exact), maps through
//! `y = (x-1)/(x+1)` with `|y| <= 1/5`, sums the atanh series and adds back
//! the shift times `ln 2`. Thick arguments are evaluated at both endpoints
//! and hulled since the logarithm is monotone.
//!
//! Above a precision threshold the arithmetic-geometric mean takes over:
//! `ln X ~= pi / (2 * AGM(1, 4/X))` once `X` is pushed large enough that the
//! method error drops below the target, with the shift repaid in `ln 2`.
//! `ln 2` itself is `2 * atanh(1/3)` and is memoised process-wide.

use num_bigint::BigInt;
use num_traits::Zero;
use parking_lot::Mutex;

use crate::approx::{Approx, ERROR_BITS};
use crate::dyadic::{ilog2, Dyadic};
use crate::extended::XDyadic;
use crate::ops::pi::pi_approx;
use crate::ops::series::taylor;
use crate::ops::sqrt::sqrt_approx;

/// Past this working precision the AGM route beats the series.
const AGM_THRESHOLD: i64 = 3000;

static LN2_CACHE: Mutex<Option<(i64, Approx)>> = Mutex::new(None);

/// Natural logarithm of an approximation at working precision `res`.
///
/// A nonpositive interval is a domain error; an interval whose lower end
/// touches or crosses zero yields `Bottom`.
///
/// # Panics
/// Panics when the whole interval is nonpositive.
pub fn log_approx(res: i64, a: &Approx) -> Approx {
    log_with(res, a, |res, c, mbw| {
        if res > AGM_THRESHOLD {
            ln_agm_exact(res, c, mbw)
        } else {
            ln_series_exact(res, c, mbw)
        }
    })
}

/// AGM-based logarithm, the high-precision alternative kept callable on its
/// own. Same domain contract as `log_approx`.
///
/// # Panics
/// Panics when the whole interval is nonpositive.
pub fn log_agm_approx(res: i64, a: &Approx) -> Approx {
    log_with(res, a, ln_agm_exact)
}

fn log_with(res: i64, a: &Approx, core: fn(i64, &Dyadic, i64) -> Approx) -> Approx {
    let Approx::Finite { e, .. } = a else {
        return Approx::Bottom;
    };
    assert!(
        a.upper() > XDyadic::zero(),
        "logarithm of a nonpositive interval"
    );
    if a.lower() <= XDyadic::zero() {
        return Approx::Bottom;
    }
    let mbw = a.mbound().max(res);
    if !e.is_zero() {
        let (Some(l), Some(u)) = (a.lower().finite().cloned(), a.upper().finite().cloned())
        else {
            return Approx::Bottom;
        };
        return core(res, &l, mbw).union_approx(&core(res, &u, mbw));
    }
    let Some(c) = a.centre() else {
        return Approx::Bottom;
    };
    core(res, &c, mbw).bound_error_term()
}

/// `ln` of an exact positive dyadic by the atanh series.
fn ln_series_exact(res: i64, c: &Dyadic, mbw: i64) -> Approx {
    if c == &Dyadic::one() {
        return Approx::zero().set_mb(mbw);
    }
    let working = res + ERROR_BITS;
    // Shift into [2/3, 4/3]: r = s + ilog2(3m) - 1.
    let r = c.exponent() + ilog2(&(c.mantissa() * 3)) - 1;
    let x = Approx::from_dyadic_mb(mbw.max(working), &c.shifted(-r));

    let y = x
        .sub_approx(&Approx::one())
        .div_approx(&x.add_approx(&Approx::one()));
    let y_sq = y.sqr().bound_error_term();
    let series = taylor(
        working,
        y_sq.powers_iter()
            .enumerate()
            .map(|(n, p)| (p, BigInt::from(2 * n as i64 + 1))),
    );
    let atanh = y.mul_approx(&series);
    let mut value = atanh.scale(1);
    if r != 0 {
        value = value.add_approx(&ln2_approx(working).mul_approx(&Approx::integer(r)));
    }
    value
}

/// `ln 2 = 2 * atanh(1/3)`, memoised; the cache never returns a worse
/// enclosure than requested.
pub fn ln2_approx(res: i64) -> Approx {
    {
        let guard = LN2_CACHE.lock();
        if let Some((cached_res, value)) = guard.as_ref() {
            if *cached_res >= res {
                return value.clone();
            }
        }
    }
    let working = res + ERROR_BITS;
    let third = Approx::integer(3).set_mb(working).recip_approx();
    let third_sq = third.sqr().bound_error_term();
    let series = taylor(
        working,
        third_sq
            .powers_iter()
            .enumerate()
            .map(|(n, p)| (p, BigInt::from(2 * n as i64 + 1))),
    );
    let value = third.mul_approx(&series).scale(1).bound_error_term();
    let mut guard = LN2_CACHE.lock();
    *guard = Some((res, value.clone()));
    value
}

/// Arithmetic-geometric mean of two positive approximations, iterated until
/// the pair agrees to `2^-res` (or quadratic convergence has long passed it).
pub fn agm_approx(res: i64, a: &Approx, b: &Approx) -> Approx {
    let mut x = a.set_mb(res);
    let mut y = b.set_mb(res);
    let tolerance = XDyadic::Finite(Dyadic::new(BigInt::from(1), -res));
    for _ in 0..96 {
        let close = match x.sub_approx(&y).abs_approx().upper() {
            XDyadic::Finite(width) => XDyadic::Finite(width) <= tolerance,
            _ => false,
        };
        if close {
            break;
        }
        let mean = x.add_approx(&y).scale(-1).bound_error_term_mb();
        let gmean = sqrt_approx(res + ERROR_BITS, &x.mul_approx(&y)).bound_error_term_mb();
        x = mean;
        y = gmean;
    }
    // The limit lies between the arithmetic and geometric sides.
    x.union_approx(&y)
}

/// `ln` of an exact positive dyadic via the AGM: shift so the argument is at
/// least `2^(p/2 + 8)`, apply `ln X ~= pi / (2 AGM(1, 4/X))`, repay the
/// shift in `ln 2`. The method error at that magnitude is below `2^-p`.
fn ln_agm_exact(res: i64, c: &Dyadic, mbw: i64) -> Approx {
    if c == &Dyadic::one() {
        return Approx::zero().set_mb(mbw);
    }
    let p = res + 2 * ERROR_BITS;
    let magnitude = c.exponent() + ilog2(c.mantissa());
    let shift = (p / 2 + 8 - magnitude).max(0);
    let big = Approx::from_dyadic_mb(mbw.max(p), &c.shifted(shift));

    let inv_scaled = big.recip_approx().scale(2); // 4/X
    let mean = agm_approx(p, &Approx::one().set_mb(p), &inv_scaled);
    let ln_big = pi_approx(p)
        .div_approx(&mean.scale(1))
        .add_approx(&Approx::new(0, 1, -p));
    let mut value = ln_big;
    if shift != 0 {
        value = value.sub_approx(&ln2_approx(p).mul_approx(&Approx::integer(shift)));
    }
    value.bound_error_term()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::approx::XBits;
    use crate::test_utils::{ap, assert_close_f64, assert_contains_f64, dy, exact};

    #[test]
    fn log_of_one_is_zero() {
        let r = log_approx(60, &exact(1, 0));
        assert!(r.contains_dyadic(&dy(0, 0)));
        assert!(!r.contains_dyadic(&dy(1, -4)));
    }

    #[test]
    fn log_of_two_contains_ln2() {
        let r = log_approx(60, &exact(2, 0));
        assert_close_f64(&r, std::f64::consts::LN_2, "log(2)");
    }

    #[test]
    fn log_of_power_of_two_scales() {
        let r = log_approx(60, &exact(4, 0));
        assert_close_f64(&r, 4f64.ln(), "log(4)");
        let r = log_approx(60, &exact(1, 10));
        assert_close_f64(&r, 1024f64.ln(), "log(1024)");
    }

    #[test]
    fn log_below_one_is_negative() {
        let r = log_approx(60, &exact(1, -1));
        assert_close_f64(&r, -std::f64::consts::LN_2, "log(1/2)");
        let r = log_approx(60, &exact(3, -4));
        assert_close_f64(&r, (3.0f64 / 16.0).ln(), "log(3/16)");
    }

    #[test]
    fn log_of_awkward_value() {
        let r = log_approx(80, &exact(7, 0));
        assert_close_f64(&r, 7f64.ln(), "log(7)");
        assert!(r.precision() > XBits::Finite(40), "{:?}", r.precision());
    }

    #[test]
    fn log_of_thick_interval_hulls_endpoints() {
        let a = ap(3, 1, 0); // [2, 4]
        let r = log_approx(60, &a);
        // ln 3 is strictly interior; the endpoints are checked as midpoints
        // of thin runs elsewhere.
        assert_contains_f64(&r, 3f64.ln(), "log(3)");
        assert!(r.lower() <= XDyadic::Finite(dy(45, -6))); // reaches down to ln 2
        assert!(r.upper() >= XDyadic::Finite(dy(88, -6))); // reaches up to ln 4
    }

    #[test]
    fn log_of_straddling_interval_is_bottom() {
        assert!(log_approx(60, &ap(1, 2, 0)).is_bottom());
        assert!(log_approx(60, &Approx::Bottom).is_bottom());
    }

    #[test]
    #[should_panic(expected = "nonpositive")]
    fn log_of_negative_interval_panics() {
        let _ = log_approx(60, &exact(-2, 0));
    }

    #[test]
    fn ln2_is_cached_and_correct() {
        let first = ln2_approx(100);
        assert_close_f64(&first, std::f64::consts::LN_2, "ln 2");
        assert!(first.precision() > XBits::Finite(80), "{:?}", first.precision());
        // A shallower request must come from the cache unchanged.
        let again = ln2_approx(50);
        assert!(again.precision() >= XBits::Finite(50));
        assert_close_f64(&again, std::f64::consts::LN_2, "cached ln 2");
    }

    #[test]
    fn agm_of_equal_values_is_fixed() {
        let one = exact(1, 0);
        let r = agm_approx(60, &one, &one);
        assert!(r.contains_dyadic(&dy(1, 0)));
    }

    #[test]
    fn agm_lies_between_means() {
        let r = agm_approx(60, &exact(1, 0), &exact(1, -1));
        // AGM(1, 1/2) is between sqrt(1/2) ~= 0.707 and 3/4.
        assert!(r.lower() >= XDyadic::Finite(dy(45, -6))); // 0.703
        assert!(r.upper() <= XDyadic::Finite(dy(49, -6))); // 0.766
    }

    #[test]
    fn agm_log_agrees_with_series_log() {
        let series = log_approx(200, &exact(2, 0));
        let agm = log_agm_approx(200, &exact(2, 0));
        assert!(series.consistent_approx(&agm));
        assert_close_f64(&agm, std::f64::consts::LN_2, "AGM log(2)");
    }

    #[test]
    fn agm_log_of_large_and_small() {
        let r = log_agm_approx(150, &exact(1000, 0));
        assert_close_f64(&r, 1000f64.ln(), "AGM log(1000)");
        let r = log_agm_approx(150, &exact(1, -8));
        assert_close_f64(&r, (1.0f64 / 256.0).ln(), "AGM log(2^-8)");
    }
}
