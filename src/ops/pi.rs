//! Pi by several algorithms.
//!
//! The workhorse is binary splitting of Ramanujan-style series
//! `1/pi = 12 * sum (-1)^n (6n)! (13591409 + 545140134 n) /
//! ((3n)! (n!)^3 640320^(3n+3/2))`, whose integer recurrences contribute a
//! touch over 47 bits per term. `pi_raw` exposes the doubling-term partial
//! sums as a lazy sequence; `pi_approx` answers a precision request directly
//! and memoises the best enclosure seen so far.
//!
//! Machin's formula (via binary-split arctangents), Borwein's quartic
//! iteration and the Gauss-Legendre AGM are kept as cross-checking
//! alternatives; all four produce rigorous enclosures of the same real, but
//! not bit-identical ones.

use num_bigint::BigInt;
use num_traits::One;
use parking_lot::Mutex;

use crate::approx::{Approx, ERROR_BITS};
use crate::dyadic::ilog2;
use crate::ops::series::{split_sum, SplitSeries};
use crate::ops::sqrt::{sqrt_approx, sqrt_rec_approx};

/// Bits contributed by each series term (conservative: the true figure is
/// slightly above 47.1).
const BITS_PER_TERM: i64 = 47;

/// `sqrt` of this constant over the series sum gives pi: `640320^3 / 144`.
const SQRT_SCALE: u64 = 1_823_176_476_672_000;

static PI_CACHE: Mutex<Option<(i64, Approx)>> = Mutex::new(None);

struct RamanujanSeries;

impl SplitSeries for RamanujanSeries {
    fn a(&self, n: u64) -> BigInt {
        BigInt::from(13_591_409u64) + BigInt::from(545_140_134u64) * n
    }
    fn b(&self, _n: u64) -> BigInt {
        BigInt::one()
    }
    fn p(&self, n: u64) -> BigInt {
        if n == 0 {
            BigInt::one()
        } else {
            -BigInt::from(6 * n - 5) * (2 * n - 1) * (6 * n - 1)
        }
    }
    fn q(&self, n: u64) -> BigInt {
        if n == 0 {
            BigInt::one()
        } else {
            BigInt::from(n).pow(3) * BigInt::from(640_320u64).pow(2) * 26_680u64
        }
    }
}

/// Bits of the tail bound per term: the term ratio is below `2^-47`, but the
/// linear factor in `a_n` gives one bit per index back.
const TAIL_BITS_PER_TERM: i64 = 46;

/// Enclosure of pi from the first `terms` series terms.
fn pi_from_terms(terms: u64) -> Approx {
    let working = BITS_PER_TERM * terms as i64 + 2 * ERROR_BITS;
    let sums = split_sum(&RamanujanSeries, 0, terms);
    let value = Approx::integer(sums.t)
        .set_mb(working)
        .div_approx(&Approx::integer(sums.b * sums.q).set_mb(working));
    // Alternating tail: |term_t| <= 2^30 * 2^t * 2^(-47t), summed below
    // 2^(31 - 46t).
    let tail = Approx::new(0, 1, 31 - TAIL_BITS_PER_TERM * terms as i64);
    let sum = value.add_approx(&tail);
    let root = sqrt_approx(working, &Approx::integer(SQRT_SCALE).set_mb(working));
    root.div_approx(&sum).bound_error_term()
}

/// Lazy sequence of sharpening enclosures of pi; element `i` includes
/// `2^i` series terms, doubling the work (and roughly the precision) each
/// step.
pub fn pi_raw() -> impl Iterator<Item = Approx> {
    (0u32..).map(|i| pi_from_terms(1u64 << i))
}

/// Enclosure of pi with at least `res` bits, memoised process-wide. The
/// cache never returns a worse enclosure than requested.
pub fn pi_approx(res: i64) -> Approx {
    {
        let guard = PI_CACHE.lock();
        if let Some((cached_res, value)) = guard.as_ref() {
            if *cached_res >= res {
                return value.clone();
            }
        }
    }
    let terms = ((res + 2 * ERROR_BITS + 32) / TAIL_BITS_PER_TERM + 1).max(1) as u64;
    let value = pi_from_terms(terms);
    let mut guard = PI_CACHE.lock();
    *guard = Some((res, value.clone()));
    value
}

/// `atan(1/k)` for integer `k >= 2` by binary splitting of the alternating
/// reciprocal series. Kept public for very high precision arctangents.
pub fn atan_recip_split(res: i64, k: u64) -> Approx {
    debug_assert!(k >= 2);
    struct AtanRecip {
        k: BigInt,
    }
    impl SplitSeries for AtanRecip {
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
                -BigInt::from(2 * n - 1)
            }
        }
        fn q(&self, n: u64) -> BigInt {
            if n == 0 {
                self.k.clone()
            } else {
                BigInt::from(2 * n + 1) * &self.k * &self.k
            }
        }
    }

    let working = res + 2 * ERROR_BITS;
    let bits_per_term = 2 * ilog2(&BigInt::from(k)).max(1);
    let terms = (working / bits_per_term + 2).max(2) as u64;
    let series = AtanRecip { k: BigInt::from(k) };
    let sums = split_sum(&series, 0, terms);
    let value = Approx::integer(sums.t)
        .set_mb(working)
        .div_approx(&Approx::integer(sums.b * sums.q).set_mb(working));
    // Alternating series: the tail is bounded by the first omitted term.
    let tail = Approx::new(0, 1, -bits_per_term * terms as i64 + 1);
    value.add_approx(&tail).bound_error_term()
}

/// Pi from Machin's formula `pi = 16 atan(1/5) - 4 atan(1/239)`.
pub fn pi_machin_approx(res: i64) -> Approx {
    let working = res + ERROR_BITS;
    let a5 = atan_recip_split(working, 5).scale(4);
    let a239 = atan_recip_split(working, 239).scale(2);
    a5.sub_approx(&a239).bound_error_term()
}

/// Pi from Borwein's quartically convergent iteration.
pub fn pi_borwein_approx(res: i64) -> Approx {
    let p = res + 2 * ERROR_BITS;
    // Iterate until the quartic truncation error 2^-(4^(n+1)) passes p.
    let mut iterations = 0u32;
    let mut reach = 4i64;
    while reach < p + 16 {
        reach = reach.saturating_mul(4);
        iterations += 1;
    }

    let one = Approx::one().set_mb(p);
    let sqrt2 = sqrt_approx(p, &Approx::integer(2).set_mb(p));
    let mut y = sqrt2.sub_approx(&one).bound_error_term_mb();
    let mut a = Approx::integer(6)
        .set_mb(p)
        .sub_approx(&sqrt2.scale(2))
        .bound_error_term_mb(); // 6 - 4*sqrt(2)

    for k in 0..=iterations {
        let y4 = y.sqr().sqr().bound_error_term_mb();
        let t = sqrt_approx(p, &sqrt_approx(p, &one.sub_approx(&y4)));
        y = one
            .sub_approx(&t)
            .div_approx(&one.add_approx(&t))
            .bound_error_term_mb();
        let y1 = one.add_approx(&y);
        let y1_sq = y1.sqr().bound_error_term_mb();
        let poly = one.add_approx(&y).add_approx(&y.sqr());
        a = a
            .mul_approx(&y1_sq.sqr())
            .sub_approx(
                &y.mul_approx(&poly)
                    .scale(2 * i64::from(k) + 3),
            )
            .bound_error_term_mb();
    }

    // a now encloses 1/pi up to the quartic truncation error.
    let widened = a.add_approx(&Approx::new(0, 1, -(p + 16)));
    widened.recip_approx().bound_error_term()
}

/// Pi by the Gauss-Legendre (Brent-Salamin) AGM iteration. The caller
/// supplies an enclosure of `1/sqrt(2)` at the working precision, which is
/// the seed of the geometric side.
pub fn pi_agm_approx(res: i64, sqrt2_rec: &Approx) -> Approx {
    let p = res + 2 * ERROR_BITS;
    let mut iterations = 0u32;
    let mut reach = 2i64;
    while reach < p + 8 {
        reach *= 2;
        iterations += 1;
    }

    let one = Approx::one().set_mb(p);
    let mut a = one.clone();
    let mut b = sqrt2_rec.set_mb(p);
    let mut t = Approx::new(1, 0, -2).set_mb(p);
    let mut doubling = 0i64;

    for _ in 0..=iterations {
        let mean = a.add_approx(&b).scale(-1).bound_error_term_mb();
        let gmean = sqrt_approx(p, &a.mul_approx(&b)).bound_error_term_mb();
        let diff = a.sub_approx(&mean);
        t = t
            .sub_approx(&diff.sqr().scale(doubling))
            .bound_error_term_mb();
        a = mean;
        b = gmean;
        doubling += 1;
    }

    let candidate = a.add_approx(&b).sqr().div_approx(&t.scale(2));
    candidate
        .add_approx(&Approx::new(0, 1, -(p + 8)))
        .bound_error_term()
}

/// Convenience seed for `pi_agm_approx`.
pub fn sqrt2_rec_approx(res: i64) -> Approx {
    sqrt_rec_approx(res, &Approx::integer(2).set_mb(res))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::approx::XBits;
    use crate::test_utils::{assert_close_f64, assert_contains_f64};

    #[test]
    fn pi_approx_contains_pi() {
        let r = pi_approx(100);
        assert_close_f64(&r, std::f64::consts::PI, "pi");
        assert!(r.precision() > XBits::Finite(90), "{:?}", r.precision());
    }

    #[test]
    fn pi_raw_elements_sharpen() {
        let mut elements = pi_raw();
        let first = elements.next().expect("infinite sequence");
        let second = elements.next().expect("infinite sequence");
        let third = elements.next().expect("infinite sequence");
        assert_contains_f64(&first, std::f64::consts::PI, "pi_raw[0]");
        assert_close_f64(&third, std::f64::consts::PI, "pi_raw[2]");
        assert!(first.consistent_approx(&second));
        assert!(second.consistent_approx(&third));
        assert!(third.precision() > first.precision());
    }

    #[test]
    fn atan_recip_split_matches_f64() {
        let a5 = atan_recip_split(80, 5);
        assert_close_f64(&a5, 0.2f64.atan(), "atan(1/5)");
        let a239 = atan_recip_split(80, 239);
        assert_close_f64(&a239, (1.0f64 / 239.0).atan(), "atan(1/239)");
    }

    #[test]
    fn machin_contains_pi() {
        let r = pi_machin_approx(120);
        assert_close_f64(&r, std::f64::consts::PI, "Machin pi");
        assert!(r.precision() > XBits::Finite(100), "{:?}", r.precision());
    }

    #[test]
    fn borwein_contains_pi() {
        let r = pi_borwein_approx(120);
        assert_close_f64(&r, std::f64::consts::PI, "Borwein pi");
    }

    #[test]
    fn agm_contains_pi() {
        let r = pi_agm_approx(120, &sqrt2_rec_approx(140));
        assert_close_f64(&r, std::f64::consts::PI, "AGM pi");
    }

    #[test]
    fn all_algorithms_agree() {
        let res = 200;
        let chudnovsky = pi_approx(res);
        let machin = pi_machin_approx(res);
        let borwein = pi_borwein_approx(res);
        let agm = pi_agm_approx(res, &sqrt2_rec_approx(res + 20));
        assert!(chudnovsky.consistent_approx(&machin));
        assert!(chudnovsky.consistent_approx(&borwein));
        assert!(chudnovsky.consistent_approx(&agm));
        assert!(machin.consistent_approx(&borwein));
    }
}
