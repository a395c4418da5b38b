//! Extended dyadic numbers: `-inf`, a finite dyadic, or `+inf`.
//!
//! Interval endpoints of approximations live here so that the trivial
//! approximation (which covers every real) has representable bounds.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::Float;

use crate::dyadic::Dyadic;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XDyadic {
    NegInf,
    Finite(Dyadic),
    PosInf,
}

impl XDyadic {
    pub fn zero() -> Self {
        Self::Finite(Dyadic::zero())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Finite(value) if value.is_zero())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    pub fn finite(&self) -> Option<&Dyadic> {
        match self {
            Self::Finite(value) => Some(value),
            Self::NegInf | Self::PosInf => None,
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Self::NegInf => Self::PosInf,
            Self::PosInf => Self::NegInf,
            Self::Finite(value) => Self::Finite(value.neg()),
        }
    }

    /// Decodes an IEEE-754 double exactly. Infinities map to the infinite
    /// endpoints; NaN has no dyadic meaning.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        if value == 0.0 {
            return Some(Self::Finite(Dyadic::zero()));
        }
        if value == f64::INFINITY {
            return Some(Self::PosInf);
        }
        if value == f64::NEG_INFINITY {
            return Some(Self::NegInf);
        }
        let (mantissa, exponent, sign) = value.integer_decode();
        let mantissa = BigInt::from(sign) * BigInt::from(mantissa);
        Some(Self::Finite(Dyadic::new(mantissa, i64::from(exponent))))
    }
}

impl From<Dyadic> for XDyadic {
    fn from(value: Dyadic) -> Self {
        Self::Finite(value)
    }
}

impl Ord for XDyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        use XDyadic::{Finite, NegInf, PosInf};
        match (self, other) {
            (NegInf, NegInf) | (PosInf, PosInf) => Ordering::Equal,
            (NegInf, _) => Ordering::Less,
            (_, NegInf) => Ordering::Greater,
            (PosInf, _) => Ordering::Greater,
            (_, PosInf) => Ordering::Less,
            (Finite(lhs), Finite(rhs)) => lhs.cmp(rhs),
        }
    }
}

impl PartialOrd for XDyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for XDyadic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegInf => write!(f, "-inf"),
            Self::PosInf => write!(f, "+inf"),
            Self::Finite(value) => write!(f, "{value}"),
        }
    }
}
