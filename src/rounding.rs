//! Quantization and rounding primitives.
//!
//! Every place the crate loses precision goes through the same half-to-even
//! rule implemented here, whether that is scaling a mantissa down, normalizing
//! a product against a rational, or dividing two values.

use core::cmp::Ordering;

use tracing::trace;

use crate::{Operand, QIntError, Result};

/// Any `i64` divided by `10^exp` for `exp` above this rounds to zero.
const MAX_SIGNIFICANT_SHIFT: u32 = 19;

/// Returns `10^exp`, or `None` if it does not fit in an `i128`.
#[inline(always)]
pub(crate) const fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// Narrows an intermediate result back into the mantissa range.
#[inline(always)]
pub(crate) fn narrow(value: i128) -> Result<i64> {
    i64::try_from(value).map_err(|_| QIntError::Overflow)
}

// ============================================================================
// Quantization
// ============================================================================

/// Quantizes `x` to an integer mantissa at `precision` decimal places.
///
/// Computes `round(x * 10^precision)` with ties going to the even neighbour.
///
/// # Errors
/// Returns [`QIntError::InvalidOperand`] if `x` is NaN or infinite, and
/// [`QIntError::Overflow`] if the scaled value does not fit in an `i64`.
pub fn quantize(x: f64, precision: u32) -> Result<i64> {
    if !x.is_finite() {
        return Err(QIntError::InvalidOperand {
            operand: Operand::Float(x),
            operation: "quantize",
        });
    }
    if x == 0.0 {
        return Ok(0);
    }

    let exp = i32::try_from(precision).map_err(|_| QIntError::Overflow)?;
    let scaled = (x * 10f64.powi(exp)).round_ties_even();

    // i64::MAX as f64 is 2^63, which is already out of range
    if !scaled.is_finite() || scaled >= i64::MAX as f64 || scaled < i64::MIN as f64 {
        return Err(QIntError::Overflow);
    }

    Ok(scaled as i64)
}

/// Converts a mantissa back to a float: `value * 10^-precision`.
///
/// This is the one place where float rounding is accepted.
#[inline]
pub fn unquantize(value: i64, precision: u32) -> f64 {
    let exp = i32::try_from(precision).unwrap_or(i32::MAX);
    value as f64 / 10f64.powi(exp)
}

// ============================================================================
// Scaling
// ============================================================================

/// Rescales a mantissa by `10^delta`.
///
/// A non-negative `delta` multiplies and is exact. A negative `delta` divides
/// by `10^|delta|` with banker's rounding.
///
/// # Errors
/// Returns [`QIntError::Overflow`] if scaling up leaves the `i64` range.
pub fn scale(value: i64, delta: i64) -> Result<i64> {
    match delta.cmp(&0) {
        Ordering::Equal => Ok(value),
        Ordering::Greater => {
            if value == 0 {
                return Ok(0);
            }
            let exp = u32::try_from(delta).map_err(|_| QIntError::Overflow)?;
            let factor = pow10(exp).ok_or(QIntError::Overflow)?;
            let scaled = (value as i128)
                .checked_mul(factor)
                .ok_or(QIntError::Overflow)?;
            narrow(scaled)
        }
        Ordering::Less => {
            let exp = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
            Ok(round_to_power(value, exp))
        }
    }
}

/// Divides `value` by `10^exp` with banker's rounding.
///
/// Never fails: the divisor is non-zero and the quotient is no larger in
/// magnitude than `value`.
pub(crate) fn round_to_power(value: i64, exp: u32) -> i64 {
    if exp == 0 {
        return value;
    }
    if exp > MAX_SIGNIFICANT_SHIFT {
        if value != 0 {
            trace!(value, exp, "rescale discarded every significant digit");
        }
        return 0;
    }

    let divisor = 10i128.pow(exp);
    let rounded = round_half_even(value as i128, divisor);
    if rounded * divisor != value as i128 {
        trace!(value, exp, rounded = rounded as i64, "lossy rescale");
    }

    rounded as i64
}

// ============================================================================
// Division
// ============================================================================

/// Integer division rounded half to even.
///
/// `bankers_divide(5, 2)` is 2, `bankers_divide(15, 2)` is 8 and
/// `bankers_divide(-5, 2)` is -2.
///
/// # Errors
/// Returns [`QIntError::DivisionByZero`] if `denominator` is zero and
/// [`QIntError::Overflow`] for `i64::MIN / -1`.
pub fn bankers_divide(numerator: i64, denominator: i64) -> Result<i64> {
    narrow(bankers_divide_wide(numerator as i128, denominator as i128)?)
}

pub(crate) fn bankers_divide_wide(numerator: i128, denominator: i128) -> Result<i128> {
    let (numerator, denominator) = normalize_sign(numerator, denominator)?;
    Ok(round_half_even(numerator, denominator))
}

/// Integer division rounded toward negative infinity.
pub(crate) fn floor_divide_wide(numerator: i128, denominator: i128) -> Result<i128> {
    let (numerator, denominator) = normalize_sign(numerator, denominator)?;
    Ok(numerator.div_euclid(denominator))
}

/// Floored remainder: the result carries the sign of `denominator`.
pub(crate) fn floor_mod(numerator: i64, denominator: i64) -> Result<i64> {
    if denominator == 0 {
        return Err(QIntError::DivisionByZero);
    }

    // wrapping_rem only wraps for i64::MIN % -1, whose remainder is 0 anyway
    let rem = numerator.wrapping_rem(denominator);
    if rem != 0 && ((rem < 0) != (denominator < 0)) {
        Ok(rem + denominator)
    } else {
        Ok(rem)
    }
}

/// Moves the sign onto the numerator so the denominator is strictly positive.
#[inline]
fn normalize_sign(numerator: i128, denominator: i128) -> Result<(i128, i128)> {
    match denominator.cmp(&0) {
        Ordering::Equal => Err(QIntError::DivisionByZero),
        Ordering::Greater => Ok((numerator, denominator)),
        Ordering::Less => {
            let numerator = numerator.checked_neg().ok_or(QIntError::Overflow)?;
            let denominator = denominator.checked_neg().ok_or(QIntError::Overflow)?;
            Ok((numerator, denominator))
        }
    }
}

/// Core rounding rule. `denominator` must be positive.
#[inline]
fn round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);

    // Compare r against d - r rather than 2r against d to stay in range
    match remainder.cmp(&(denominator - remainder)) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => {
            if quotient % 2 == 0 {
                quotient
            } else {
                quotient + 1
            }
        }
    }
}
