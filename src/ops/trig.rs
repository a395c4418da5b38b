//! Sine, cosine and arctangent.
//!
//! All three run their series on the exact midpoint of the argument and
//! account for the argument's own width afterwards through the Lipschitz
//! bound (both `sin` and `atan` have derivative magnitude at most one), so
//! the summation frameworks only ever see thin operands and their geometric
//! tail bound stays valid.
//!
//! `sin` reduces in two stages: modulo `2 pi` (with pi taken sharp enough to
//! survive the magnitude of the argument), then folded into
//! `[-pi/2, pi/2]` by exact symmetry identities chosen on the midpoint. The
//! remaining argument is scaled down by a power of three and rebuilt with
//! the triplication `x -> 3x - 4x^3` after the series.
//!
//! `atan` halves its argument twice through
//! `atan(x) = 2 atan(x / (1 + sqrt(1 + x^2)))`, which lands any real below
//! `tan(pi/8) < 1/2`, sums the odd-reciprocal series and scales back.

use num_bigint::BigInt;
use num_integer::Roots;
use num_traits::{One, Signed, Zero};

use crate::approx::{Approx, ERROR_BITS};
use crate::dyadic::{ilog2, Dyadic};
use crate::ops::pi::pi_approx;
use crate::ops::series::taylor_a;
use crate::ops::sqrt::sqrt_approx;

/// Sine of an approximation at working precision `res`.
pub fn sin_approx(res: i64, a: &Approx) -> Approx {
    let Approx::Finite { e, s, .. } = a else {
        return Approx::Bottom;
    };
    let mbw = a.mbound().max(res);
    let core = sin_core(res + ERROR_BITS, &a.centre_approx().set_mb(mbw), mbw);
    if core.is_bottom() {
        return Approx::Bottom;
    }
    let widened = if e.is_zero() {
        core
    } else {
        core.add_approx(&Approx::with_mb(mbw, 0, e.clone(), *s))
    };
    clamp_unit(widened).bound_error_term()
}

/// Cosine via `cos x = sin(pi/2 - x)`.
pub fn cos_approx(res: i64, a: &Approx) -> Approx {
    if a.is_bottom() {
        return Approx::Bottom;
    }
    let half_pi = pi_approx(res + 2).scale(-1);
    sin_approx(res, &half_pi.sub_approx(a))
}

/// Arctangent of an approximation at working precision `res`.
pub fn atan_approx(res: i64, a: &Approx) -> Approx {
    let Approx::Finite { e, s, .. } = a else {
        return Approx::Bottom;
    };
    let mbw = a.mbound().max(res);
    let core = atan_core(res + ERROR_BITS, &a.centre_approx().set_mb(mbw));
    if core.is_bottom() {
        return Approx::Bottom;
    }
    if e.is_zero() {
        core.bound_error_term()
    } else {
        core.add_approx(&Approx::with_mb(mbw, 0, e.clone(), *s))
            .bound_error_term()
    }
}

fn clamp_unit(a: Approx) -> Approx {
    a.intersection_approx(&Approx::new(0, 1, 0))
}

/// Sine of an exact value. The reduction keeps the series operand thin: the
/// only width it picks up is the sharpness of pi itself.
fn sin_core(res: i64, x: &Approx, mbw: i64) -> Approx {
    let Approx::Finite { m, s, .. } = x else {
        return Approx::Bottom;
    };
    if m.is_zero() {
        return Approx::zero().set_mb(mbw);
    }

    // Pi sharp enough that reducing an argument of this magnitude still
    // leaves res good bits.
    let magnitude = (ilog2(&m.abs()) + s).max(0);
    let pi_enc = pi_approx(res + magnitude + 10).set_mb(mbw.max(res + magnitude));
    let two_pi = pi_enc.scale(1);
    let (_, reduced) = x.div_mod_approx(&two_pi);
    if reduced.is_bottom() {
        return Approx::Bottom;
    }

    // Fold [0, 2 pi) into [-pi/2, pi/2] by exact identities; the branch is
    // picked on midpoints, which is safe because every identity holds
    // everywhere.
    let (Some(c), Some(c_pi)) = (reduced.centre(), pi_enc.centre()) else {
        return Approx::Bottom;
    };
    let half_pi_centre = c_pi.shifted(-1);
    let folded = if c <= half_pi_centre {
        reduced
    } else if c <= c_pi.add(&half_pi_centre) {
        pi_enc.sub_approx(&reduced)
    } else {
        reduced.sub_approx(&two_pi)
    };

    sin_reduced(res, &folded, mbw)
}

/// Taylor stage on an argument within about `[-pi/2, pi/2]`: scale down by
/// `3^k`, sum, then triplicate `k` times.
fn sin_reduced(res: i64, x: &Approx, mbw: i64) -> Approx {
    let Approx::Finite { m, s, .. } = x else {
        return Approx::Bottom;
    };
    let k = if m.is_zero() {
        0
    } else {
        (ilog2(&m.abs()) + s + mbw.sqrt()).max(0)
    };

    let scaled = if k == 0 {
        x.set_mb(res)
    } else {
        let divisor = Approx::integer(BigInt::from(3).pow(k as u32)).set_mb(res);
        x.set_mb(res).div_approx(&divisor)
    };

    let neg_sq = scaled.sqr().neg_approx().bound_error_term();
    let coefficients = (0u64..).scan(BigInt::one(), move |factorial, n| {
        if n > 0 {
            *factorial *= (2 * n) * (2 * n + 1);
        }
        Some(Approx::integer(factorial.clone()).set_mb(res).recip_approx())
    });
    let mut value = scaled.mul_approx(&taylor_a(res, coefficients, &neg_sq));
    for _ in 0..k {
        // sin(3u) = 3 sin u - 4 sin^3 u
        let squared = value.sqr().scale(2);
        value = value
            .mul_approx(&Approx::integer(3).sub_approx(&squared))
            .bound_error_term_mb();
    }
    value
}

/// Arctangent of an exact value: two half-angle reductions put any real
/// below `tan(pi/8)`, then the odd-reciprocal series.
fn atan_core(res: i64, x: &Approx) -> Approx {
    if x.is_bottom() {
        return Approx::Bottom;
    }
    if x.is_exact() && x.centre() == Some(Dyadic::zero()) {
        return Approx::zero();
    }
    let working = res + ERROR_BITS;
    let one = Approx::one().set_mb(working);
    let mut y = x.set_mb(working);
    for _ in 0..2 {
        let hyp = sqrt_approx(working, &one.add_approx(&y.sqr()));
        y = y.div_approx(&one.add_approx(&hyp)).bound_error_term_mb();
    }

    let neg_sq = y.sqr().neg_approx().bound_error_term();
    let coefficients =
        (0u64..).map(move |n| Approx::integer(2 * n + 1).set_mb(working).recip_approx());
    let series = taylor_a(working, coefficients, &neg_sq);
    y.mul_approx(&series).scale(2)
}
