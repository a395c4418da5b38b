//! Textual rendering of approximations.
//!
//! The format marks uncertainty in-band: digits of the midpoint are printed
//! down to the place where the radius starts to matter, then a `~`. A `~` in
//! integer position means the magnitude itself is uncertain; a `+-` prefix
//! marks an interval straddling zero, whose leading zeros still convey scale.
//! Exact values print as plain integers or fractions with no trailing symbol.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::Approx;

/// Rendering of `Bottom`.
pub const BOTTOM_SYMBOL: &str = "⊥";

const DIGITS: &[u8; 16] = b"0123456789abcdef";

impl Approx {
    /// Renders the approximation in the given base (between 2 and 16).
    ///
    /// # Panics
    /// Panics when the base is outside `2..=16`.
    pub fn to_string_base(&self, base: u32) -> String {
        assert!((2..=16).contains(&base), "base must be between 2 and 16");
        let Self::Finite { m, e, s, .. } = self else {
            return BOTTOM_SYMBOL.to_string();
        };

        // Normalise to a nonpositive exponent so the value is am/2^g.
        let (m, e, g) = if *s > 0 {
            (m << *s as usize, e << *s as usize, 0u64)
        } else {
            (m.clone(), e.clone(), (-*s) as u64)
        };

        let negative = m.is_negative();
        let am = BigInt::from(m.magnitude().clone());
        if e.is_zero() {
            let mut out = String::new();
            if negative {
                out.push('-');
            }
            render_exact(&mut out, &am, g, base);
            return out;
        }
        if am < e {
            let mut out = String::from("±");
            render_near_zero(&mut out, &(&am + &e), g, base);
            return out;
        }
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        render_inexact(&mut out, &am, &e, g, base);
        out
    }
}

impl fmt::Display for Approx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_base(10))
    }
}

/// Exact nonnegative value `am / 2^g`. Terminates for even bases; for odd
/// bases the fractional expansion is cut off after `g + 1` digits with a `~`.
fn render_exact(out: &mut String, am: &BigInt, g: u64, base: u32) {
    let int_part: BigInt = am >> g;
    let mut frac = am - (&int_part << g);
    out.push_str(&int_part.to_str_radix(base));
    if frac.is_zero() {
        return;
    }
    out.push('.');
    let mut emitted = 0u64;
    while !frac.is_zero() {
        if emitted > g {
            // Odd base: the expansion does not terminate.
            out.push('~');
            return;
        }
        frac *= base;
        let digit: BigInt = &frac >> g;
        frac -= &digit << g;
        out.push(digit_char(&digit));
        emitted += 1;
    }
}

/// Near-zero rendering: leading zeros of the magnitude bound `hi / 2^g`
/// convey the scale, then a `~` at the first significant place.
fn render_near_zero(out: &mut String, hi: &BigInt, g: u64, base: u32) {
    let int_part: BigInt = hi >> g;
    if !int_part.is_zero() {
        out.push('~');
        return;
    }
    out.push_str("0.");
    let mut frac = hi.clone();
    // The first significant digit appears within ~g/log2(base) places; the
    // cap only guards against a zero bound, which cannot happen here.
    for _ in 0..=(2 * g + 2) {
        frac *= base;
        let digit: BigInt = &frac >> g;
        frac -= &digit << g;
        if digit.is_zero() {
            out.push('0');
        } else {
            break;
        }
    }
    out.push('~');
}

/// Inexact rendering: midpoint digits down to the place where the radius
/// starts to matter, then `~`.
fn render_inexact(out: &mut String, am: &BigInt, e: &BigInt, g: u64, base: u32) {
    let int_part: BigInt = am >> g;
    let mut frac = am - (&int_part << g);
    let int_digits = int_part.to_str_radix(base);

    // Weight of the leading integer digit, scaled by 2^g so the comparison
    // against the radius stays integral.
    let mut weight: BigInt = BigInt::from(base).pow(int_digits.len() as u32 - 1) << g;
    for c in int_digits.chars() {
        if &weight < e {
            out.push('~');
            return;
        }
        out.push(c);
        weight /= base;
    }

    out.push('.');
    let threshold: BigInt = BigInt::one() << g;
    let mut scaled_e = e * base;
    loop {
        if threshold < scaled_e {
            out.push('~');
            return;
        }
        frac *= base;
        let digit: BigInt = &frac >> g;
        frac -= &digit << g;
        out.push(digit_char(&digit));
        scaled_e *= base;
    }
}

fn digit_char(d: &BigInt) -> char {
    let idx = d.to_u32().unwrap_or(0) as usize;
    DIGITS[idx.min(15)] as char
}
