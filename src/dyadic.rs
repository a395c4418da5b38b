//! Exact dyadic numbers `m * 2^s` and the integer-level algorithms built on them.
//!
//! `Dyadic` is the exact substrate of the interval engine: midpoints, radii and
//! interval endpoints are all dyadic, so field operations on them never round.
//! The module also provides the rounded dyadic primitives the elementary
//! functions need: floor square root, floor reciprocal square root (Newton
//! iteration seeded from a float) and rounded division at a given exponent.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Exponent type for `Dyadic` and for the approximation layer above it.
pub type Exponent = i64;

/// Floor of the base-2 logarithm of `|x|` for nonzero `x`.
///
/// # Panics
/// Panics if `x` is zero.
pub fn ilog2(x: &BigInt) -> Exponent {
    assert!(!x.is_zero(), "ilog2 of zero is undefined");
    x.magnitude().bits() as Exponent - 1
}

/// Exact binary number represented as `mantissa * 2^exponent`.
/// `mantissa` is normalized to be odd unless the value is zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dyadic {
    mantissa: BigInt,
    exponent: Exponent,
}

impl Dyadic {
    pub fn new(mantissa: BigInt, exponent: Exponent) -> Self {
        Self::normalize(mantissa, exponent)
    }

    pub fn zero() -> Self {
        Self {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }

    pub fn one() -> Self {
        Self {
            mantissa: BigInt::one(),
            exponent: 0,
        }
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> Exponent {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.mantissa.is_positive()
    }

    pub fn add(&self, other: &Self) -> Self {
        let (lhs, rhs, exponent) = Self::align_mantissas(self, other);
        Self::normalize(lhs + rhs, exponent)
    }

    pub fn sub(&self, other: &Self) -> Self {
        let (lhs, rhs, exponent) = Self::align_mantissas(self, other);
        Self::normalize(lhs - rhs, exponent)
    }

    pub fn neg(&self) -> Self {
        if self.mantissa.is_zero() {
            return self.clone();
        }
        Self {
            mantissa: -self.mantissa.clone(),
            exponent: self.exponent,
        }
    }

    pub fn abs(&self) -> Self {
        if self.mantissa.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        let exponent = self.exponent + other.exponent;
        let mantissa = &self.mantissa * &other.mantissa;
        Self::normalize(mantissa, exponent)
    }

    /// The value `self * 2^k`, an exact shift.
    pub fn shifted(&self, k: Exponent) -> Self {
        if self.mantissa.is_zero() {
            return self.clone();
        }
        Self {
            mantissa: self.mantissa.clone(),
            exponent: self.exponent + k,
        }
    }

    fn normalize(mut mantissa: BigInt, mut exponent: Exponent) -> Self {
        if mantissa.is_zero() {
            return Self {
                mantissa,
                exponent: 0,
            };
        }

        if let Some(tz) = mantissa.trailing_zeros() {
            if tz > 0 {
                mantissa >>= tz;
                exponent += tz as Exponent;
            }
        }

        Self { mantissa, exponent }
    }

    fn align_mantissas(lhs: &Self, rhs: &Self) -> (BigInt, BigInt, Exponent) {
        let exponent = lhs.exponent.min(rhs.exponent);
        let lhs_mantissa = &lhs.mantissa << (lhs.exponent - exponent) as usize;
        let rhs_mantissa = &rhs.mantissa << (rhs.exponent - exponent) as usize;
        (lhs_mantissa, rhs_mantissa, exponent)
    }

    /// Leading mantissa bits as an `f64` in `[1, 2)` together with the
    /// binary exponent of the value, so that
    /// `self ~= fraction * 2^exponent`. Used only to seed Newton iterations.
    ///
    /// # Panics
    /// Panics if the value is zero.
    pub(crate) fn frexp(&self) -> (f64, Exponent) {
        assert!(!self.is_zero(), "frexp of zero is undefined");
        let bits = self.mantissa.magnitude().bits() as Exponent;
        let top = if bits > 53 {
            self.mantissa.magnitude() >> (bits - 53) as usize
        } else {
            self.mantissa.magnitude() << (53 - bits) as usize
        };
        let fraction = top.to_f64().unwrap_or(f64::MAX) / (1u64 << 52) as f64;
        let fraction = if self.mantissa.is_negative() {
            -fraction
        } else {
            fraction
        };
        (fraction, self.exponent + bits - 1)
    }
}

impl Add for Dyadic {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Dyadic::add(&self, &rhs)
    }
}

impl Sub for Dyadic {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Dyadic::sub(&self, &rhs)
    }
}

impl Neg for Dyadic {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Dyadic::neg(&self)
    }
}

impl Mul for Dyadic {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Dyadic::mul(&self, &rhs)
    }
}

impl num_traits::Zero for Dyadic {
    fn zero() -> Self {
        Dyadic::zero()
    }

    fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }
}

impl Ord for Dyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        let lsign = self.mantissa.sign();
        let rsign = other.mantissa.sign();
        if lsign != rsign {
            return lsign.cmp(&rsign);
        }
        if self.mantissa.is_zero() {
            return Ordering::Equal;
        }

        // Same nonzero sign. Compare positions of the leading bit first so
        // that wildly different exponents never force a huge shift.
        let ltop = self.exponent as i128 + self.mantissa.magnitude().bits() as i128;
        let rtop = other.exponent as i128 + other.mantissa.magnitude().bits() as i128;
        if ltop != rtop {
            let by_magnitude = ltop.cmp(&rtop);
            return if self.mantissa.is_negative() {
                by_magnitude.reverse()
            } else {
                by_magnitude
            };
        }

        // Equal leading-bit positions: the exponent gap is bounded by the
        // mantissa lengths, so aligning is cheap.
        if self.exponent >= other.exponent {
            let shifted = &self.mantissa << (self.exponent - other.exponent) as usize;
            shifted.cmp(&other.mantissa)
        } else {
            let shifted = &other.mantissa << (other.exponent - self.exponent) as usize;
            self.mantissa.cmp(&shifted)
        }
    }
}

impl PartialOrd for Dyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Dyadic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*2^{}", self.mantissa, self.exponent)
    }
}

/// Floor square root at exponent `prec`: returns `r * 2^prec` with
/// `r * 2^prec <= sqrt(x) < (r + 2) * 2^prec`.
///
/// # Panics
/// Panics if `x` is negative.
pub fn sqrt_dyadic(prec: Exponent, x: &Dyadic) -> Dyadic {
    assert!(
        !x.is_negative(),
        "sqrt_dyadic of a negative dyadic is undefined"
    );
    if x.is_zero() {
        return Dyadic::zero();
    }
    let shift = x.exponent() - 2 * prec;
    let scaled = shift_floor(x.mantissa(), shift);
    Dyadic::new(scaled.sqrt(), prec)
}

/// Floor reciprocal square root at exponent `prec`: returns `r * 2^prec` with
/// `r * 2^prec <= 1/sqrt(x) < (r + 1) * 2^prec`, i.e. the exact floor.
///
/// A Newton iteration on `y -> y*(3*2^K - m*y^2) / 2^(K+1)` (which needs no
/// bigint division) is seeded from a float estimate, then nudged onto the
/// exact floor by the defining inequality `r^2 * m <= 2^K < (r+1)^2 * m`.
///
/// # Panics
/// Panics if `x` is not strictly positive, or if `prec` is too large for the
/// result to have any significant bits.
pub fn sqrt_rec_dyadic(prec: Exponent, x: &Dyadic) -> Dyadic {
    assert!(
        x.is_positive(),
        "sqrt_rec_dyadic requires a strictly positive dyadic"
    );
    // r = floor(sqrt(2^k / m)) with k = -2*prec - s.
    let k = -2 * prec - x.exponent();
    assert!(k >= 0, "sqrt_rec_dyadic: requested exponent {prec} too coarse");

    let m = x.mantissa().clone();
    let target = BigInt::one() << k as usize;

    let mut r = if k < 128 {
        (&target / &m).sqrt()
    } else {
        let seed = sqrt_rec_seed(&m, k);
        newton_sqrt_rec(seed, &m, k)
    };

    // Land exactly on the floor. Newton leaves us within a few ulps, so these
    // loops run O(1) steps.
    while &r * &r * &m > target {
        r -= 1;
    }
    loop {
        let next = &r + 1;
        if &next * &next * &m <= target {
            r = next;
        } else {
            break;
        }
    }
    Dyadic::new(r, prec)
}

/// Float starting value for the reciprocal square root of `m`, scaled so the
/// Newton iterate targets `2^(k/2) / sqrt(m)`.
fn sqrt_rec_seed(m: &BigInt, k: Exponent) -> BigInt {
    let (fraction, g) = Dyadic::new(m.clone(), 0).frexp();
    let h = k - g;
    // 1/sqrt(fraction * 2^(h mod 2 adjust)) carried in the float part.
    let c = if h.rem_euclid(2) == 1 {
        (2.0 / fraction).sqrt()
    } else {
        (1.0 / fraction).sqrt()
    };
    let scaled = (c * f64::from(1u32 << 26).powi(2)) as u64;
    let shift = h.div_euclid(2) - 52;
    shift_floor(&BigInt::from(scaled), shift)
}

/// Newton iteration for `floor(2^(k/2) / sqrt(m))` on integers.
fn newton_sqrt_rec(seed: BigInt, m: &BigInt, k: Exponent) -> BigInt {
    // The seed carries ~50 correct bits; each step doubles that. A couple of
    // guard iterations keep the final nudge loops short.
    let result_bits = (k / 2 - ilog2(m) / 2).max(1);
    let mut steps = 2;
    let mut correct = 50i64;
    while correct < result_bits {
        correct *= 2;
        steps += 1;
    }

    let three_target = BigInt::from(3) << k as usize;
    let mut y = seed.max(BigInt::one());
    for _ in 0..steps {
        let y_sq = &y * &y;
        let t = &three_target - m * y_sq;
        y = shift_floor(&(&y * t), -(k + 1));
        if !y.is_positive() {
            y = BigInt::one();
        }
    }
    y
}

/// Rounded division at exponent `prec`: returns `q * 2^prec` with
/// `|q * 2^prec - a/b| <= 2^(prec-1)`.
///
/// # Panics
/// Panics if `b` is zero.
pub fn divide_dyadic(prec: Exponent, a: &Dyadic, b: &Dyadic) -> Dyadic {
    assert!(!b.is_zero(), "divide_dyadic by zero");
    let shift = a.exponent() - b.exponent() - prec;
    // A right shift of the numerator is folded into the denominator so the
    // rounding happens once.
    let (numerator, denominator) = if shift >= 0 {
        (a.mantissa() << shift as usize, b.mantissa().clone())
    } else {
        (a.mantissa().clone(), b.mantissa() << (-shift) as usize)
    };
    Dyadic::new(round_div(&numerator, &denominator), prec)
}

/// Division of bigints rounded to nearest (ties toward positive infinity).
pub(crate) fn round_div(n: &BigInt, d: &BigInt) -> BigInt {
    assert!(!d.is_zero(), "round_div by zero");
    let (n, d) = if d.is_negative() {
        (-n, d.abs())
    } else {
        (n.clone(), d.clone())
    };
    let floor = n.div_floor(&d);
    let rem = &n - &floor * &d;
    if &rem * 2u8 >= d {
        floor + 1
    } else {
        floor
    }
}

/// `x * 2^shift` with floor on right shifts.
pub(crate) fn shift_floor(x: &BigInt, shift: Exponent) -> BigInt {
    if shift >= 0 {
        x << shift as usize
    } else {
        x >> (-shift) as usize
    }
}

/// `x * 2^shift` with ceiling on right shifts (for radii, which must never
/// shrink below the true value).
pub(crate) fn shift_ceil(x: &BigInt, shift: Exponent) -> BigInt {
    if shift >= 0 {
        x << shift as usize
    } else {
        let k = (-shift) as usize;
        let dropped = x.trailing_zeros().map_or(false, |tz| (tz as usize) < k);
        // Shifts on BigInt floor, so a nonzero dropped part means +1 to ceil.
        let down = x >> k;
        if dropped {
            down + 1
        } else {
            down
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn dy(mantissa: i64, exponent: i64) -> Dyadic {
        Dyadic::new(BigInt::from(mantissa), exponent)
    }

    #[test]
    fn normalizes_even_mantissa() {
        let value = dy(8, 0);
        assert_eq!(value.mantissa(), &BigInt::from(1));
        assert_eq!(value.exponent(), 3);
    }

    #[test]
    fn zero_uses_zero_exponent() {
        let value = Dyadic::new(BigInt::zero(), 42);
        assert_eq!(value.mantissa(), &BigInt::zero());
        assert_eq!(value.exponent(), 0);
    }

    #[test]
    fn add_aligns_exponents() {
        let one = dy(1, 0);
        let half = dy(1, -1);
        assert_eq!(one + half, dy(3, -1));
    }

    #[test]
    fn sub_handles_negative_result() {
        assert_eq!(dy(1, 0) - dy(1, 1), dy(-1, 0));
    }

    #[test]
    fn mul_adds_exponents() {
        assert_eq!(dy(1, 1) * dy(1, -1), dy(1, 0));
    }

    #[test]
    fn ordering_with_exponents() {
        assert!(dy(1, 0) > dy(1, -1));
        assert!(dy(-1, 10) < dy(1, -10));
        assert!(dy(3, -1) < dy(2, 0));
    }

    #[test]
    fn ordering_handles_large_exponent_gaps() {
        let huge = Dyadic::new(BigInt::from(1), Exponent::MAX / 2);
        let tiny = Dyadic::new(BigInt::from(1), Exponent::MIN / 2);
        assert!(huge > tiny);
        assert!(huge.neg() < tiny);
    }

    #[test]
    fn shifted_scales_by_powers_of_two() {
        assert_eq!(dy(3, 0).shifted(2), dy(3, 2));
        assert_eq!(dy(3, 0).shifted(-1), dy(3, -1));
    }

    #[test]
    fn ilog2_matches_bit_length() {
        assert_eq!(ilog2(&BigInt::from(1)), 0);
        assert_eq!(ilog2(&BigInt::from(2)), 1);
        assert_eq!(ilog2(&BigInt::from(255)), 7);
        assert_eq!(ilog2(&BigInt::from(-256)), 8);
    }

    #[test]
    fn frexp_brackets_value() {
        let (fraction, exponent) = dy(5, -3).frexp();
        // 5 * 2^-3 = 1.25 * 2^-1
        assert!((fraction - 1.25).abs() < 1e-12);
        assert_eq!(exponent, -1);
    }

    #[test]
    fn sqrt_dyadic_brackets_root() {
        // sqrt(2) to 2^-40.
        let root = sqrt_dyadic(-40, &dy(2, 0));
        let lo = root.clone();
        let hi = root.add(dy(2, -40));
        assert!(lo.clone().mul(lo) <= dy(2, 0));
        assert!(hi.clone().mul(hi) > dy(2, 0));
    }

    #[test]
    fn sqrt_dyadic_of_square_is_exact() {
        let root = sqrt_dyadic(0, &dy(144, 0));
        assert_eq!(root, dy(12, 0));
    }

    #[test]
    fn sqrt_rec_dyadic_is_exact_floor() {
        for (m, s) in [(3i64, 0i64), (2, 0), (7, -2), (1, 4), (12345, -7)] {
            let x = dy(m, s);
            let r = sqrt_rec_dyadic(-60, &x);
            // r^2 * x <= 1 < (r + ulp)^2 * x
            let r_hi = r.clone().add(dy(1, -60));
            assert!(r.clone().mul(r.clone()).mul(x.clone()) <= dy(1, 0), "low bound for {x}");
            assert!(r_hi.clone().mul(r_hi.clone()).mul(x.clone()) > dy(1, 0), "high bound for {x}");
        }
    }

    #[test]
    fn sqrt_rec_dyadic_high_precision_uses_newton() {
        let x = dy(5, 0);
        let r = sqrt_rec_dyadic(-300, &x);
        let r_hi = r.clone().add(dy(1, -300));
        assert!(r.clone().mul(r.clone()).mul(x.clone()) <= dy(1, 0));
        assert!(r_hi.clone().mul(r_hi.clone()).mul(x) > dy(1, 0));
    }

    #[test]
    fn divide_dyadic_rounds_to_nearest() {
        // 1/3 at 2^-10: 341.33../1024 rounds to 341.
        let q = divide_dyadic(-10, &dy(1, 0), &dy(3, 0));
        assert_eq!(q, Dyadic::new(BigInt::from(341), -10));
        // 2/3 at 2^-10: 682.66../1024 rounds to 683.
        let q = divide_dyadic(-10, &dy(2, 0), &dy(3, 0));
        assert_eq!(q, Dyadic::new(BigInt::from(683), -10));
    }

    #[test]
    fn round_div_ties_and_signs() {
        assert_eq!(round_div(&BigInt::from(7), &BigInt::from(2)), BigInt::from(4));
        assert_eq!(round_div(&BigInt::from(-7), &BigInt::from(2)), BigInt::from(-3));
        assert_eq!(round_div(&BigInt::from(6), &BigInt::from(3)), BigInt::from(2));
    }

    #[test]
    fn shift_ceil_rounds_up() {
        assert_eq!(shift_ceil(&BigInt::from(5), -1), BigInt::from(3));
        assert_eq!(shift_ceil(&BigInt::from(4), -2), BigInt::from(1));
        assert_eq!(shift_ceil(&BigInt::from(3), 1), BigInt::from(6));
    }
}
