//! Summation frameworks with explicit truncation-error bookkeeping.
//!
//! Both Taylor drivers add terms while they are still significant at the
//! working precision and then widen the partial sum by a bound on the omitted
//! tail (`fudge`). The precondition is geometric convergence with ratio at
//! most one half; the tail is then bounded by twice the first omitted term.
//!
//! Binary splitting evaluates series defined by multiplicatively structured
//! integer recurrences; the partial sum over `[n1, n2)` comes out as the
//! exact rational `T / (B * Q)`.

use num_bigint::BigInt;
use num_traits::Signed;

use crate::approx::{Approx, ERROR_BITS};
use crate::dyadic::shift_floor;

/// Widens `partial` so its radius covers twice the magnitude of `next_term`
/// plus one ulp, in `partial`'s exponent frame. With a convergence ratio of
/// at most one half this bounds the whole omitted tail.
pub fn fudge(partial: &Approx, next_term: &Approx) -> Approx {
    let (
        Approx::Finite { mb, m, e, s },
        Approx::Finite {
            m: tm, e: te, s: ts, ..
        },
    ) = (partial, next_term)
    else {
        return Approx::Bottom;
    };
    let tail = (tm.abs() + te) << 1usize;
    let widened = shift_floor(&tail, ts - s) + 2;
    Approx::Finite {
        mb: *mb,
        m: m.clone(),
        e: e + widened,
        s: *s,
    }
}

fn significant(term: &Approx) -> bool {
    matches!(term, Approx::Finite { m, .. } if !num_traits::Zero::is_zero(m))
}

/// Sums `terms` at working precision `res` until a term becomes insignificant,
/// then fudges with the first omitted term. Also stops (still soundly, thanks
/// to the geometric tail bound) if an unreasonable number of terms is reached.
fn sum_terms(res: i64, terms: impl Iterator<Item = Approx>) -> Approx {
    let working = res + ERROR_BITS;
    let cap = (4 * res).max(64) as usize;
    let mut sum = Approx::zero();
    let mut last = Approx::Bottom;
    for (count, term) in terms.enumerate() {
        if term.is_bottom() {
            return Approx::Bottom;
        }
        let term = term.limit_and_bound(working);
        if !significant(&term) || count >= cap {
            return fudge(&sum, &term).bound_error_term();
        }
        sum = sum.add_approx(&term);
        last = term;
    }
    // A finite series that never went insignificant: cover the (empty) tail
    // with the last term for safety.
    fudge(&sum, &last).bound_error_term()
}

/// Computes `sum a_n / q_n` at precision `res`, where subsequent terms
/// eventually shrink by at least a factor of two.
pub fn taylor(res: i64, terms: impl Iterator<Item = (Approx, BigInt)>) -> Approx {
    let working = res + ERROR_BITS;
    sum_terms(
        res,
        terms.map(move |(a, q)| a.div_approx(&Approx::integer(q).set_mb(working))),
    )
}

/// Computes `sum c_n * x^n` at precision `res` under the same tail
/// precondition as `taylor`.
pub fn taylor_a(res: i64, coefficients: impl Iterator<Item = Approx>, x: &Approx) -> Approx {
    sum_terms(
        res,
        coefficients
            .zip(x.powers_iter())
            .map(|(c, p)| c.mul_approx(&p)),
    )
}

/// The four accumulators of binary splitting over an index range:
/// `P = prod p`, `Q = prod q`, `B = prod b` and
/// `T = sum_k a_k * b_k * (prod_{i<=k} p_i) * (prod_{j>k} q_j)`,
/// so the partial sum of the series is `T / (B * Q)`.
pub struct SplitSums {
    pub p: BigInt,
    pub q: BigInt,
    pub b: BigInt,
    pub t: BigInt,
}

/// Integer recurrences of a binary-splitting series.
pub trait SplitSeries {
    fn a(&self, n: u64) -> BigInt;
    fn b(&self, n: u64) -> BigInt;
    fn p(&self, n: u64) -> BigInt;
    fn q(&self, n: u64) -> BigInt;
}

fn split_single(series: &impl SplitSeries, n: u64) -> SplitSums {
    let p = series.p(n);
    let b = series.b(n);
    let t = series.a(n) * &b * &p;
    SplitSums {
        p,
        q: series.q(n),
        b,
        t,
    }
}

fn split_combine(left: SplitSums, right: SplitSums) -> SplitSums {
    SplitSums {
        t: &right.b * &right.q * left.t + &left.b * &left.p * right.t,
        p: left.p * right.p,
        q: left.q * right.q,
        b: left.b * right.b,
    }
}

/// Divide-and-conquer evaluation of the series accumulators over `[n1, n2)`.
/// Short ranges are folded sequentially.
pub fn split_sum(series: &impl SplitSeries, n1: u64, n2: u64) -> SplitSums {
    debug_assert!(n1 < n2, "split_sum needs a nonempty range");
    if n2 - n1 <= 5 {
        let mut acc = split_single(series, n1);
        for n in n1 + 1..n2 {
            acc = split_combine(acc, split_single(series, n));
        }
        return acc;
    }
    let mid = (n1 + n2 + 1) / 2;
    split_combine(split_sum(series, n1, mid), split_sum(series, mid, n2))
}
