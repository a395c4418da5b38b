//! Centred dyadic interval approximations.
//!
//! An `Approx` is either the interval `[(m-e)*2^s, (m+e)*2^s]` together with a
//! bound `mb` on the bit size of the midpoint `m`, or `Bottom`, the trivial
//! approximation containing every real. All arithmetic here preserves the
//! enclosure property: the result interval contains every real obtainable by
//! applying the operation to points of the input intervals.
//!
//! The `mb` bound acts like a floating-point significand size: operations
//! propagate `max(mb1, mb2)` and renormalize with `enforce_mb`, which keeps
//! midpoints from growing without bound in long iterations. The canonicalising
//! operators `bound_error_term` and `limit_size` trade precision for compact
//! representations and are always below the identity in the `better_than`
//! information order.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::dyadic::{ilog2, round_div, shift_ceil, shift_floor, Dyadic, Exponent};
use crate::extended::XDyadic;

mod display;

pub use display::BOTTOM_SYMBOL;

/// Number of error bits a canonicalised approximation keeps in its radius.
pub const ERROR_BITS: i64 = 10;

/// Default precision (bits after the binary point) for conversions that need
/// to pick one, such as `to_rational`.
pub const DEFAULT_PRECISION: i64 = 31;

/// Precision or significance measured in bits, extended with infinities for
/// exact values and for `Bottom`. The derived order places
/// `NegInf < Finite(_) < PosInf`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum XBits {
    NegInf,
    Finite(i64),
    PosInf,
}

/// A centred dyadic interval `[(m-e)*2^s, (m+e)*2^s]` with midpoint bit bound
/// `mb`, or the trivial approximation `Bottom`.
///
/// Invariants: `e >= 0`, and `|m| <= 2^mb` after constructor normalisation.
/// Use the constructors rather than building variants directly.
#[derive(Clone, Debug)]
pub enum Approx {
    Bottom,
    Finite {
        mb: i64,
        m: BigInt,
        e: BigInt,
        s: Exponent,
    },
}

/// Minimal legal midpoint bound for the given midpoint and radius.
fn auto_mb(m: &BigInt, e: &BigInt) -> i64 {
    let magnitude = m.abs() + e;
    if magnitude <= BigInt::one() {
        2
    } else {
        (1 + ilog2(&(magnitude - 1))).max(2)
    }
}

impl Approx {
    /// Exact-fit constructor: `mb` is set to the minimal legal bound for the
    /// given midpoint and radius.
    pub fn new(m: impl Into<BigInt>, e: impl Into<BigInt>, s: Exponent) -> Self {
        let m = m.into();
        let e = e.into();
        let mb = auto_mb(&m, &e);
        Self::finite_enforced(mb, m, e, s)
    }

    /// Constructor with an explicit midpoint bound; the midpoint is shifted
    /// down if it does not fit.
    pub fn with_mb(mb: i64, m: impl Into<BigInt>, e: impl Into<BigInt>, s: Exponent) -> Self {
        Self::finite_enforced(mb, m.into(), e.into(), s)
    }

    /// Constructor taking the bounds of both operands of a binary operation.
    pub fn with_mb2(
        mb1: i64,
        mb2: i64,
        m: impl Into<BigInt>,
        e: impl Into<BigInt>,
        s: Exponent,
    ) -> Self {
        Self::finite_enforced(mb1.max(mb2), m.into(), e.into(), s)
    }

    /// An exact integer approximation.
    pub fn integer(i: impl Into<BigInt>) -> Self {
        Self::new(i, 0, 0)
    }

    pub fn zero() -> Self {
        Self::integer(0)
    }

    pub fn one() -> Self {
        Self::integer(1)
    }

    /// An exact approximation of a dyadic number, with auto bound.
    pub fn from_dyadic(d: &Dyadic) -> Self {
        Self::new(d.mantissa().clone(), 0, d.exponent())
    }

    /// An exact approximation of a dyadic number with a fixed bound.
    pub fn from_dyadic_mb(mb: i64, d: &Dyadic) -> Self {
        Self::with_mb(mb, d.mantissa().clone(), 0, d.exponent())
    }

    /// The centred approximation with the given extended-dyadic endpoints, or
    /// `Bottom` when either endpoint is infinite or `upper < lower`.
    pub fn from_ends(mb: i64, lower: XDyadic, upper: XDyadic) -> Self {
        let (XDyadic::Finite(l), XDyadic::Finite(u)) = (lower, upper) else {
            return Self::Bottom;
        };
        if u < l {
            return Self::Bottom;
        }
        let r = l.exponent().min(u.exponent());
        let lm = l.mantissa() << (l.exponent() - r) as usize;
        let um = u.mantissa() << (u.exponent() - r) as usize;
        Self::with_mb(mb, &um + &lm, um - lm, r - 1)
    }

    /// Best `mb`-bit approximation of a rational, with a 1 ulp radius (0 when
    /// the rational is exactly representable).
    pub fn from_rational(mb: i64, r: &BigRational) -> Self {
        let numer = r.numer() << mb.max(0) as usize;
        let (q, rem) = numer.div_rem(r.denom());
        if rem.is_zero() {
            Self::with_mb(mb, q, 0, -mb)
        } else {
            Self::with_mb(mb, round_div(&numer, r.denom()), 1, -mb)
        }
    }

    fn finite_enforced(mb: i64, m: BigInt, e: BigInt, s: Exponent) -> Self {
        debug_assert!(!e.is_negative(), "approximation radius must be nonnegative");
        debug_assert!(mb >= 0, "midpoint bound must be nonnegative");
        if m.is_zero() {
            return Self::Finite { mb, m, e, s };
        }
        let bl = m.magnitude().bits() as i64;
        if bl <= mb || bl <= 1 {
            return Self::Finite { mb, m, e, s };
        }
        // Shift the excess bits out of the midpoint; the radius is shifted
        // with ceiling and grows by one ulp when the midpoint shift is
        // inexact, so the new interval still encloses the old one.
        let d = bl - mb;
        let inexact = m.trailing_zeros().map_or(false, |tz| (tz as i64) < d);
        let m2 = shift_floor(&m, -d);
        let mut e2 = shift_ceil(&e, -d);
        if inexact {
            e2 += 1;
        }
        Self::Finite {
            mb,
            m: m2,
            e: e2,
            s: s + d,
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }

    /// Whether the approximation is a single point (`e == 0`).
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Finite { e, .. } if e.is_zero())
    }

    /// The midpoint bit bound.
    ///
    /// # Panics
    /// Panics on `Bottom`, whose midpoint bound is undefined.
    pub fn mbound(&self) -> i64 {
        match self {
            Self::Bottom => panic!("midpoint bound of Bottom is undefined"),
            Self::Finite { mb, .. } => *mb,
        }
    }

    /// Raises (never lowers) the midpoint bit bound.
    pub fn set_mb(&self, new_mb: i64) -> Self {
        match self {
            Self::Bottom => Self::Bottom,
            Self::Finite { mb, m, e, s } => Self::Finite {
                mb: (*mb).max(new_mb),
                m: m.clone(),
                e: e.clone(),
                s: *s,
            },
        }
    }

    pub fn lower(&self) -> XDyadic {
        match self {
            Self::Bottom => XDyadic::NegInf,
            Self::Finite { m, e, s, .. } => XDyadic::Finite(Dyadic::new(m - e, *s)),
        }
    }

    pub fn upper(&self) -> XDyadic {
        match self {
            Self::Bottom => XDyadic::PosInf,
            Self::Finite { m, e, s, .. } => XDyadic::Finite(Dyadic::new(m + e, *s)),
        }
    }

    pub fn centre(&self) -> Option<Dyadic> {
        match self {
            Self::Bottom => None,
            Self::Finite { m, s, .. } => Some(Dyadic::new(m.clone(), *s)),
        }
    }

    /// The centre as an exact approximation (radius zero), keeping `mb`.
    pub fn centre_approx(&self) -> Self {
        match self {
            Self::Bottom => Self::Bottom,
            Self::Finite { mb, m, s, .. } => Self::with_mb(*mb, m.clone(), 0, *s),
        }
    }

    pub fn radius(&self) -> XDyadic {
        match self {
            Self::Bottom => XDyadic::PosInf,
            Self::Finite { e, s, .. } => XDyadic::Finite(Dyadic::new(e.clone(), *s)),
        }
    }

    pub fn diameter(&self) -> XDyadic {
        match self {
            Self::Bottom => XDyadic::PosInf,
            Self::Finite { e, s, .. } => XDyadic::Finite(Dyadic::new(e.clone(), s + 1)),
        }
    }

    /// Reverse-inclusion information order: `self` is at least as sharp as
    /// `other` when its interval is contained in `other`'s. `Bottom` is the
    /// top element.
    pub fn better_than(&self, other: &Self) -> bool {
        self.lower() >= other.lower() && self.upper() <= other.upper()
    }

    /// Correct bits after the binary point, roughly `-log2` of the radius.
    pub fn precision(&self) -> XBits {
        match self {
            Self::Bottom => XBits::NegInf,
            Self::Finite { e, s, .. } => {
                if e.is_zero() {
                    XBits::PosInf
                } else {
                    XBits::Finite(-s - ilog2(e) - 1)
                }
            }
        }
    }

    /// Correct bits of the midpoint, roughly `log2 |m| - log2 e`.
    pub fn significance(&self) -> XBits {
        match self {
            Self::Bottom => XBits::NegInf,
            Self::Finite { m, e, .. } => {
                if e.is_zero() {
                    return XBits::PosInf;
                }
                if m.is_zero() {
                    return XBits::NegInf;
                }
                if e.is_one() {
                    XBits::Finite(ilog2(&m.abs()) - 1)
                } else {
                    XBits::Finite(ilog2(&m.abs()) - ilog2(&(e - 1)) - 1)
                }
            }
        }
    }

    pub fn contains_dyadic(&self, d: &Dyadic) -> bool {
        let x = XDyadic::Finite(d.clone());
        self.lower() <= x && x <= self.upper()
    }

    /// Smallest interval containing both operands. `Bottom` absorbs.
    pub fn union_approx(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom, _) | (_, Self::Bottom) => Self::Bottom,
            _ => Self::from_ends(
                self.mbound().max(other.mbound()),
                self.lower().min(other.lower()),
                self.upper().max(other.upper()),
            ),
        }
    }

    /// Intersection of the operands; `Bottom` is the identity.
    ///
    /// # Panics
    /// Panics when the intervals are disjoint, which indicates inconsistent
    /// approximations of the same real and is a programmer error.
    pub fn intersection_approx(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom, _) => other.clone(),
            (_, Self::Bottom) => self.clone(),
            _ => {
                let lower = self.lower().max(other.lower());
                let upper = self.upper().min(other.upper());
                assert!(
                    lower <= upper,
                    "intersection of disjoint approximations: [{}, {}] and [{}, {}]",
                    self.lower(),
                    self.upper(),
                    other.lower(),
                    other.upper()
                );
                Self::from_ends(self.mbound().max(other.mbound()), lower, upper)
            }
        }
    }

    /// Whether the two approximations could describe the same real.
    pub fn consistent_approx(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bottom, _) | (_, Self::Bottom) => true,
            _ => {
                self.lower().max(other.lower()) <= self.upper().min(other.upper())
            }
        }
    }

    pub fn add_approx(&self, other: &Self) -> Self {
        let (
            Self::Finite {
                mb: mb1,
                m: m1,
                e: e1,
                s: s1,
            },
            Self::Finite {
                mb: mb2,
                m: m2,
                e: e2,
                s: s2,
            },
        ) = (self, other)
        else {
            return Self::Bottom;
        };
        let r = (*s1).min(*s2);
        let m = (m1 << (s1 - r) as usize) + (m2 << (s2 - r) as usize);
        let e = (e1 << (s1 - r) as usize) + (e2 << (s2 - r) as usize);
        Self::with_mb2(*mb1, *mb2, m, e, r)
    }

    pub fn neg_approx(&self) -> Self {
        match self {
            Self::Bottom => Self::Bottom,
            Self::Finite { mb, m, e, s } => Self::Finite {
                mb: *mb,
                m: -m,
                e: e.clone(),
                s: *s,
            },
        }
    }

    pub fn sub_approx(&self, other: &Self) -> Self {
        self.add_approx(&other.neg_approx())
    }

    /// Interval product, case-analysed on the sign and zero-crossing of the
    /// operands to pick the tightest centred enclosure.
    pub fn mul_approx(&self, other: &Self) -> Self {
        let (
            Self::Finite {
                mb: mb1,
                m: m1,
                e: e1,
                s: s1,
            },
            Self::Finite {
                mb: mb2,
                m: m2,
                e: e2,
                s: s2,
            },
        ) = (self, other)
        else {
            return Self::Bottom;
        };
        let u = s1 + s2;
        let a = m1 * m2;
        let d = e1 * e2;
        let am = m1.abs();
        let an = m2.abs();
        let ab = &am * e2;
        let ac = &an * e1;

        let (mid, rad) = if a.is_zero() {
            (BigInt::zero(), ab + ac + d)
        } else if &am >= e1 && &an >= e2 {
            // Neither factor crosses zero.
            let mid = if a.is_positive() { &a + &d } else { &a - &d };
            (mid, ab + ac)
        } else if &am >= e1 {
            // Only the second factor crosses zero.
            let c = m2 * e1;
            let mid = if m1.is_positive() { &a + &c } else { &a - &c };
            (mid, ab + d)
        } else if &an >= e2 {
            // Only the first factor crosses zero.
            let b = m1 * e2;
            let mid = if m2.is_positive() { &a + &b } else { &a - &b };
            (mid, ac + d)
        } else {
            // Both factors cross zero; extrema sit at the box corners.
            let small = ab.clone().min(ac.clone());
            let large = ab.max(ac);
            let mid = if a.is_positive() { &a + &small } else { &a - &small };
            (mid, large + d)
        };
        Self::with_mb2(*mb1, *mb2, mid, rad, u)
    }

    pub fn abs_approx(&self) -> Self {
        match self {
            Self::Bottom => Self::Bottom,
            Self::Finite { mb, m, e, s } => {
                let am = m.abs();
                if &am >= e {
                    Self::Finite {
                        mb: *mb,
                        m: am,
                        e: e.clone(),
                        s: *s,
                    }
                } else {
                    // Sign-crossing interval folds to [0, |m| + e].
                    let v = am + e;
                    Self::with_mb(*mb, v.clone(), v, s - 1)
                }
            }
        }
    }

    /// Sign of the approximation as an approximation: exact `-1`, `0` or `1`
    /// when decidable, an enclosing interval otherwise. `signum(Bottom)` is
    /// `[0 +- 1]`.
    pub fn signum_approx(&self) -> Self {
        match self {
            Self::Bottom => Self::new(0, 1, 0),
            Self::Finite { mb, m, e, s: _ } => {
                if e.is_zero() {
                    return Self::integer(m.signum());
                }
                let am = m.abs();
                match am.cmp(e) {
                    Ordering::Less => Self::new(0, 1, 0),
                    Ordering::Equal => {
                        // The interval touches zero at one end.
                        Self::with_mb(*mb, m.signum(), 1, -1)
                    }
                    Ordering::Greater => Self::integer(m.signum()),
                }
            }
        }
    }

    /// Multiplicative inverse. Exact powers of two invert exactly; any other
    /// exact value gets one rational rounding at `mb`-bit significance; an
    /// interval containing zero gives `Bottom`.
    pub fn recip_approx(&self) -> Self {
        let Self::Finite { mb, m, e, s } = self else {
            return Self::Bottom;
        };
        if e.is_zero() {
            if m.is_zero() {
                return Self::Bottom;
            }
            let k = ilog2(&m.abs());
            if m.magnitude().count_ones() == 1 {
                return Self::with_mb(*mb, m.signum(), 0, -s - k);
            }
            let t = k + mb + 2;
            let mid = round_div(&(BigInt::one() << t as usize), m);
            return Self::with_mb(*mb, mid, 1, -t - s);
        }
        if &m.abs() > e {
            // 1/(m +- e) = (m -+ e)/(m^2 - e^2); scale so the rounded
            // midpoint keeps a couple of error-bits' worth of headroom.
            let den = m * m - e * e;
            let sp = ilog2(&den) + 2 * ERROR_BITS;
            let mid = round_div(&(m << sp as usize), &den);
            let rad = (e << sp as usize).div_ceil(&den) + 1;
            return Self::with_mb(*mb, mid, rad, -s - sp);
        }
        Self::Bottom
    }

    pub fn div_approx(&self, other: &Self) -> Self {
        let mb = match (self, other) {
            (Self::Finite { mb: mb1, .. }, Self::Finite { mb: mb2, .. }) => (*mb1).max(*mb2),
            _ => return Self::Bottom,
        };
        self.mul_approx(&other.set_mb(mb).recip_approx())
    }

    /// Euclidean division on the aligned midpoints. The quotient is an exact
    /// integer approximation; the remainder absorbs both operand radii.
    /// `Bottom` when the divisor's interval contains zero.
    pub fn div_mod_approx(&self, other: &Self) -> (Self, Self) {
        let (
            Self::Finite {
                mb: mb1,
                m: m1,
                e: e1,
                s: s1,
            },
            Self::Finite {
                mb: mb2,
                m: m2,
                e: e2,
                s: s2,
            },
        ) = (self, other)
        else {
            return (Self::Bottom, Self::Bottom);
        };
        if m2.is_zero() || &m2.abs() <= e2 && !e2.is_zero() {
            return (Self::Bottom, Self::Bottom);
        }
        let r = (*s1).min(*s2);
        let ma = m1 << (s1 - r) as usize;
        let na = m2 << (s2 - r) as usize;
        let ea = e1 << (s1 - r) as usize;
        let fa = e2 << (s2 - r) as usize;
        let (d, m_rem) = ma.div_mod_floor(&na);
        let rem = Self::with_mb2(*mb1, *mb2, m_rem, ea + d.abs() * fa, r);
        (Self::integer(d), rem)
    }

    pub fn mod_approx(&self, other: &Self) -> Self {
        self.div_mod_approx(other).1
    }

    /// Tight square, avoiding the dependency inflation of `a * a` on
    /// sign-crossing intervals.
    pub fn sqr(&self) -> Self {
        let Self::Finite { mb, m, e, s } = self else {
            return Self::Bottom;
        };
        let am = m.abs();
        if &am > e {
            let mid = m * m + e * e;
            let rad = (am << 1usize) * e;
            Self::with_mb(*mb, mid, rad, 2 * s)
        } else {
            let v = (am + e).pow(2);
            Self::with_mb(*mb, v.clone(), v, 2 * s - 1)
        }
    }

    /// The sequence `[1, a, a^2, ..., a^n]`, using a binomial pair recurrence
    /// on sign-definite intervals for enclosures at least as tight as
    /// iterated multiplication.
    pub fn powers(&self, n: usize) -> Vec<Self> {
        self.powers_iter().take(n + 1).collect()
    }

    /// Unbounded power sequence iterator starting at `a^0`.
    pub fn powers_iter(&self) -> Powers {
        Powers::new(self.clone())
    }

    /// Polynomial evaluation with dependency-aware error: the polynomial is
    /// evaluated at the exact midpoint, and the radius is the supremum of the
    /// derivative's magnitude over the interval times the interval radius
    /// (mean value theorem).
    pub fn poly(coefficients: &[Self], x: &Self) -> Self {
        if coefficients.iter().any(Self::is_bottom) {
            return Self::Bottom;
        }
        let Self::Finite { e, s, .. } = x else {
            return Self::Bottom;
        };
        if coefficients.is_empty() {
            return Self::zero();
        }

        let centre = x.centre_approx();
        let mut value = Self::zero();
        for (c, p) in coefficients.iter().zip(centre.powers_iter()) {
            value = value.add_approx(&c.mul_approx(&p));
        }
        if e.is_zero() || coefficients.len() < 2 {
            // Exact argument, or a constant polynomial whose derivative
            // vanishes: no dependency error to account for.
            return value.bound_error_term();
        }

        let mut derivative = Self::zero();
        let x_powers = x.powers(coefficients.len() - 2);
        for (i, c) in coefficients.iter().enumerate().skip(1) {
            let scaled = c.mul_approx(&Self::integer(i as i64));
            derivative = derivative.add_approx(&scaled.mul_approx(&x_powers[i - 1]));
        }
        let bound = match derivative.abs_approx().upper() {
            XDyadic::Finite(b) => b,
            XDyadic::NegInf | XDyadic::PosInf => return Self::Bottom,
        };
        let err = bound.mul(Dyadic::new(e.clone(), *s));
        let spread = Self::with_mb(
            x.mbound(),
            BigInt::zero(),
            err.mantissa().abs(),
            err.exponent(),
        );
        value.add_approx(&spread).bound_error_term()
    }

    /// Rounds the radius down to at most `ERROR_BITS` bits, adjusting the
    /// midpoint to keep the enclosure. Below identity in `better_than`.
    pub fn bound_error_term(&self) -> Self {
        match self.bounded_parts() {
            None => self.clone(),
            Some((mb, m, e, s)) => Self::Finite { mb, m, e, s },
        }
    }

    /// `bound_error_term` followed by midpoint-bound enforcement.
    pub fn bound_error_term_mb(&self) -> Self {
        match self.bounded_parts() {
            None => self.clone(),
            Some((mb, m, e, s)) => Self::finite_enforced(mb, m, e, s),
        }
    }

    fn bounded_parts(&self) -> Option<(i64, BigInt, BigInt, Exponent)> {
        let Self::Finite { mb, m, e, s } = self else {
            return None;
        };
        if (e.magnitude().bits() as i64) <= ERROR_BITS {
            return None;
        }
        let k = ilog2(e) + 1 - ERROR_BITS;
        Some(rounded_shift(m, e, *s, k, *mb))
    }

    /// Forces the exponent up to at least `-l`, rounding midpoint and radius.
    /// Below identity in `better_than`.
    pub fn limit_size(&self, l: i64) -> Self {
        let Self::Finite { mb, m, e, s } = self else {
            return Self::Bottom;
        };
        let k = -l - s;
        if k <= 0 {
            return self.clone();
        }
        let (mb2, m2, e2, s2) = rounded_shift(m, e, *s, k, (*mb - k).max(2));
        Self::Finite {
            mb: mb2,
            m: m2,
            e: e2,
            s: s2,
        }
    }

    /// The canonicalisation applied after every lifted operation:
    /// `limit_size(l)` after `bound_error_term`.
    pub fn limit_and_bound(&self, l: i64) -> Self {
        self.bound_error_term().limit_size(l)
    }

    /// Exact scaling by `2^k`.
    pub fn scale(&self, k: Exponent) -> Self {
        match self {
            Self::Bottom => Self::Bottom,
            Self::Finite { mb, m, e, s } => Self::Finite {
                mb: *mb,
                m: m.clone(),
                e: e.clone(),
                s: s + k,
            },
        }
    }

    /// The midpoint as the nearest `f64` (infinite when out of range); `None`
    /// for `Bottom`.
    pub fn to_f64(&self) -> Option<f64> {
        let centre = self.centre()?;
        if centre.is_zero() {
            return Some(0.0);
        }
        let (fraction, exponent) = centre.frexp();
        let exponent = exponent.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        Some(fraction * 2f64.powi(exponent))
    }
}

/// Shift midpoint and radius right by `k` with round-to-nearest on the
/// midpoint (test bit `k-1`, increment if set) and a covering radius.
fn rounded_shift(
    m: &BigInt,
    e: &BigInt,
    s: Exponent,
    k: i64,
    new_mb: i64,
) -> (i64, BigInt, BigInt, Exponent) {
    let round_up = m.bit((k - 1) as u64);
    let mut m2 = shift_floor(m, -k);
    if round_up {
        m2 += 1;
    }
    let e2 = 1 + shift_floor(&(e + (BigInt::one() << (k - 1) as usize)), -k);
    (new_mb, m2, e2, s + k)
}

/// Iterator of `a^0, a^1, a^2, ...` with tight enclosures.
pub struct Powers {
    base: Approx,
    state: PowerState,
}

enum PowerState {
    /// Sign-definite base: midpoint/radius pair recurrence at growing scale.
    Tight {
        mb: i64,
        mid: BigInt,
        rad: BigInt,
        s: Exponent,
    },
    /// General base: iterated interval multiplication.
    General(Approx),
    Exhausted,
}

impl Powers {
    fn new(base: Approx) -> Self {
        let state = match &base {
            Approx::Bottom => PowerState::Exhausted,
            Approx::Finite { mb, m, e, .. } => {
                if &m.abs() > e {
                    PowerState::Tight {
                        mb: *mb,
                        mid: BigInt::one(),
                        rad: BigInt::zero(),
                        s: 0,
                    }
                } else {
                    PowerState::General(Approx::one())
                }
            }
        };
        Self { base, state }
    }
}

impl Iterator for Powers {
    type Item = Approx;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            PowerState::Exhausted => Some(Approx::Bottom),
            PowerState::General(current) => {
                let out = current.clone();
                *current = current.mul_approx(&self.base);
                Some(out)
            }
            PowerState::Tight { mb, mid, rad, s } => {
                let Approx::Finite {
                    m: bm, e: be, s: bs, ..
                } = &self.base
                else {
                    return Some(Approx::Bottom);
                };
                let out = Approx::with_mb(*mb, mid.clone(), rad.clone(), *s);
                // (mid +- rad)(bm +- be) for sign-definite factors:
                // midpoint mid*bm + sign(mid*bm)*rad*be, radius |mid|be + |bm|rad.
                let a = &*mid * bm;
                let d = &*rad * be;
                let new_mid = if a.is_negative() { &a - &d } else { &a + &d };
                let new_rad = mid.abs() * be + bm.abs() * &*rad;
                *mid = new_mid;
                *rad = new_rad;
                *s += bs;
                Some(out)
            }
        }
    }
}

impl PartialEq for Approx {
    /// Equality of the encoded intervals (after aligning exponents), not of
    /// the representation tuples; `mb` does not participate.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bottom, Self::Bottom) => true,
            (
                Self::Finite {
                    m: m1, e: e1, s: s1, ..
                },
                Self::Finite {
                    m: m2, e: e2, s: s2, ..
                },
            ) => {
                let r = (*s1).min(*s2);
                (m1 << (s1 - r) as usize) == (m2 << (s2 - r) as usize)
                    && (e1 << (s1 - r) as usize) == (e2 << (s2 - r) as usize)
            }
            _ => false,
        }
    }
}

impl Eq for Approx {}

impl PartialOrd for Approx {
    /// Partial order on approximations: defined for identical intervals, for
    /// exact values, and for disjoint intervals. Overlapping distinct
    /// intervals are not comparable (`None`); deciding their order would
    /// require more information than either approximation carries.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        if self.is_exact() && other.is_exact() {
            return self.centre().partial_cmp(&other.centre());
        }
        if self.upper() < other.lower() {
            return Some(Ordering::Less);
        }
        if self.lower() > other.upper() {
            return Some(Ordering::Greater);
        }
        None
    }
}

impl Add for Approx {
    type Output = Approx;

    fn add(self, rhs: Self) -> Approx {
        self.add_approx(&rhs)
    }
}

impl Add for &Approx {
    type Output = Approx;

    fn add(self, rhs: Self) -> Approx {
        self.add_approx(rhs)
    }
}

impl Sub for Approx {
    type Output = Approx;

    fn sub(self, rhs: Self) -> Approx {
        self.sub_approx(&rhs)
    }
}

impl Sub for &Approx {
    type Output = Approx;

    fn sub(self, rhs: Self) -> Approx {
        self.sub_approx(rhs)
    }
}

impl Mul for Approx {
    type Output = Approx;

    fn mul(self, rhs: Self) -> Approx {
        self.mul_approx(&rhs)
    }
}

impl Mul for &Approx {
    type Output = Approx;

    fn mul(self, rhs: Self) -> Approx {
        self.mul_approx(rhs)
    }
}

impl Neg for Approx {
    type Output = Approx;

    fn neg(self) -> Approx {
        self.neg_approx()
    }
}

impl Neg for &Approx {
    type Output = Approx;

    fn neg(self) -> Approx {
        self.neg_approx()
    }
}
