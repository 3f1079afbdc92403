use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign};
use core::str::FromStr;

use num_rational::Ratio;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::rounding::{self, bankers_divide_wide, floor_divide_wide, floor_mod, narrow, pow10};
use crate::{Number, Operand, QIntError, Result};

/// Quantized integer: an `i64` mantissa with `precision` implied decimal places.
///
/// The true value is `value / 10^precision`. Values are immutable; every
/// operation returns a new `QInt`.
///
/// Equality is structural, so `QInt::new(100, 2)` (1.00) and
/// `QInt::new(1000, 3)` (1.000) are not equal, and ordering is only defined
/// between values of the same precision.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct QInt {
    value: i64,
    precision: u32,
}

// ============================================================================
// Constructors and Raw Access
// ============================================================================

impl QInt {
    /// Creates a `QInt` from an already quantized mantissa.
    ///
    /// `new(12345, 2)` is 123.45.
    #[inline(always)]
    pub const fn new(value: i64, precision: u32) -> Self {
        Self { value, precision }
    }

    /// Zero at the given precision.
    #[inline(always)]
    pub const fn zero(precision: u32) -> Self {
        Self::new(0, precision)
    }

    /// Quantizes a plain number to `precision` decimal places.
    ///
    /// Integers are scaled exactly; floats are rounded half to even, so
    /// `create(0.125, 2)` is 0.12.
    ///
    /// # Errors
    /// [`QIntError::InvalidOperand`] for NaN or infinite floats and
    /// [`QIntError::Overflow`] if the mantissa does not fit in an `i64`.
    pub fn create(x: impl Into<Number>, precision: u32) -> Result<Self> {
        let value = match x.into() {
            Number::Int(n) => rounding::scale(n, precision as i64)?,
            Number::Float(x) => rounding::quantize(x, precision)?,
        };
        Ok(Self::new(value, precision))
    }

    /// Quantizes an arbitrary-precision decimal to `precision` decimal places
    /// without going through a float.
    pub fn from_decimal(decimal: Decimal, precision: u32) -> Result<Self> {
        let rounded = decimal.round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven);
        let factor = pow10(precision.saturating_sub(rounded.scale())).ok_or(QIntError::Overflow)?;
        let value = rounded
            .mantissa()
            .checked_mul(factor)
            .ok_or(QIntError::Overflow)?;
        Ok(Self::new(narrow(value)?, precision))
    }

    /// The quantized mantissa.
    #[inline(always)]
    pub const fn value(self) -> i64 {
        self.value
    }

    /// Number of implied decimal places.
    #[inline(always)]
    pub const fn precision(self) -> u32 {
        self.precision
    }

    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.value == 0
    }

    #[inline(always)]
    pub const fn is_positive(self) -> bool {
        self.value > 0
    }

    #[inline(always)]
    pub const fn is_negative(self) -> bool {
        self.value < 0
    }

    /// Returns -1, 0 or 1.
    #[inline(always)]
    pub const fn signum(self) -> i64 {
        self.value.signum()
    }

    #[inline(always)]
    fn with_value(self, value: Option<i64>) -> Result<Self> {
        match value {
            Some(value) => Ok(Self::new(value, self.precision)),
            None => Err(QIntError::Overflow),
        }
    }

    #[inline(always)]
    fn from_wide(value: i128, precision: u32) -> Result<Self> {
        Ok(Self::new(narrow(value)?, precision))
    }
}

// ============================================================================
// Operand Validation
// ============================================================================

fn reject(operand: Operand, operation: &'static str) -> QIntError {
    debug!(operation, kind = ?operand.kind(), "invalid operand");
    QIntError::InvalidOperand { operand, operation }
}

fn unsupported(operation: &'static str) -> QIntError {
    debug!(operation, "unsupported operation");
    QIntError::UnsupportedOperation(operation)
}

impl QInt {
    #[inline]
    fn require_precision(self, rhs: Self, operation: &'static str) -> Result<()> {
        if self.precision == rhs.precision {
            return Ok(());
        }
        debug!(operation, lhs = self.precision, rhs = rhs.precision, "precision mismatch");
        Err(QIntError::PrecisionMismatch(self.precision, rhs.precision))
    }

    /// Dividend mantissa and result precision for `self / rhs`.
    ///
    /// When `rhs` carries more decimals than `self` the dividend is scaled up
    /// to `rhs.precision` first so the result lands on precision 0.
    fn dividend_over(self, rhs: Self) -> Result<(i128, u32)> {
        match self.precision.checked_sub(rhs.precision) {
            Some(precision) => Ok((self.value as i128, precision)),
            None if self.value == 0 => Ok((0, 0)),
            None => {
                let factor = pow10(rhs.precision - self.precision).ok_or(QIntError::Overflow)?;
                let dividend = (self.value as i128)
                    .checked_mul(factor)
                    .ok_or(QIntError::Overflow)?;
                Ok((dividend, 0))
            }
        }
    }
}

// ============================================================================
// Scaling
// ============================================================================

impl QInt {
    /// Rescales to `target` decimal places.
    ///
    /// Returns `self` when `target` is `None` or already matches. Scaling up
    /// is exact, scaling down rounds half to even.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn scale(self, target: impl Into<Option<u32>>) -> Result<Self> {
        match target.into() {
            Some(target) if target != self.precision => {
                let delta = target as i64 - self.precision as i64;
                Ok(Self::new(rounding::scale(self.value, delta)?, target))
            }
            _ => Ok(self),
        }
    }
}

// ============================================================================
// Arithmetic Operations
// ============================================================================

impl QInt {
    /// `QInt + QInt` at equal precision, or `QInt + i64` on the mantissa.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_add(self, other: impl Into<Operand>) -> Result<Self> {
        match other.into() {
            Operand::QInt(rhs) => {
                self.require_precision(rhs, "add")?;
                self.with_value(self.value.checked_add(rhs.value))
            }
            Operand::Int(n) => self.with_value(self.value.checked_add(n)),
            other => Err(reject(other, "add")),
        }
    }

    /// `QInt - QInt` at equal precision, or `QInt - i64` on the mantissa.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_sub(self, other: impl Into<Operand>) -> Result<Self> {
        match other.into() {
            Operand::QInt(rhs) => {
                self.require_precision(rhs, "sub")?;
                self.with_value(self.value.checked_sub(rhs.value))
            }
            Operand::Int(n) => self.with_value(self.value.checked_sub(n)),
            other => Err(reject(other, "sub")),
        }
    }

    /// Multiplication.
    ///
    /// - `QInt * QInt`: mantissas multiply, precisions add.
    /// - `QInt * i64`: precision unchanged.
    /// - `QInt * n/d`: `value * n / d` rounded half to even, precision unchanged.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_mul(self, other: impl Into<Operand>) -> Result<Self> {
        match other.into() {
            Operand::QInt(rhs) => {
                let precision = self
                    .precision
                    .checked_add(rhs.precision)
                    .ok_or(QIntError::Overflow)?;
                match self.value.checked_mul(rhs.value) {
                    Some(value) => Ok(Self::new(value, precision)),
                    None => Err(QIntError::Overflow),
                }
            }
            Operand::Int(n) => self.with_value(self.value.checked_mul(n)),
            Operand::Ratio(ratio) => {
                let product = self.value as i128 * *ratio.numer() as i128;
                let value = bankers_divide_wide(product, *ratio.denom() as i128)?;
                Self::from_wide(value, self.precision)
            }
            other => Err(reject(other, "mul")),
        }
    }

    /// Division, rounded half to even.
    ///
    /// - `QInt / QInt`: precision is `self.precision - other.precision`, or 0
    ///   when `other` has more decimals (the dividend is scaled up first).
    /// - `QInt / i64`: precision unchanged.
    /// - `QInt / (n/d)`: `value * d / n`, precision unchanged.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_div(self, other: impl Into<Operand>) -> Result<Self> {
        match other.into() {
            Operand::QInt(rhs) => {
                if rhs.value == 0 {
                    return Err(QIntError::DivisionByZero);
                }
                let (dividend, precision) = self.dividend_over(rhs)?;
                Self::from_wide(bankers_divide_wide(dividend, rhs.value as i128)?, precision)
            }
            Operand::Int(n) => {
                let value = bankers_divide_wide(self.value as i128, n as i128)?;
                Self::from_wide(value, self.precision)
            }
            Operand::Ratio(ratio) => {
                let product = self.value as i128 * *ratio.denom() as i128;
                let value = bankers_divide_wide(product, *ratio.numer() as i128)?;
                Self::from_wide(value, self.precision)
            }
            other => Err(reject(other, "div")),
        }
    }

    /// Like [`try_div`](Self::try_div) but rounds toward negative infinity.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_floor_div(self, other: impl Into<Operand>) -> Result<Self> {
        match other.into() {
            Operand::QInt(rhs) => {
                if rhs.value == 0 {
                    return Err(QIntError::DivisionByZero);
                }
                let (dividend, precision) = self.dividend_over(rhs)?;
                Self::from_wide(floor_divide_wide(dividend, rhs.value as i128)?, precision)
            }
            Operand::Int(n) => {
                let value = floor_divide_wide(self.value as i128, n as i128)?;
                Self::from_wide(value, self.precision)
            }
            Operand::Ratio(ratio) => {
                let product = self.value as i128 * *ratio.denom() as i128;
                let value = floor_divide_wide(product, *ratio.numer() as i128)?;
                Self::from_wide(value, self.precision)
            }
            other => Err(reject(other, "floordiv")),
        }
    }

    /// Floored modulo of two values at the same precision. The result takes
    /// the sign of `other`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_rem(self, other: impl Into<Operand>) -> Result<Self> {
        match other.into() {
            Operand::QInt(rhs) => {
                self.require_precision(rhs, "mod")?;
                Ok(Self::new(floor_mod(self.value, rhs.value)?, self.precision))
            }
            other => Err(reject(other, "mod")),
        }
    }

    /// Raises to a non-negative integer power. The result precision is
    /// `precision * exponent`, so no rounding ever happens.
    ///
    /// # Errors
    /// [`QIntError::UnsupportedOperation`] for a `QInt` exponent,
    /// [`QIntError::InvalidOperand`] for negative, rational or float exponents.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_pow(self, exponent: impl Into<Operand>) -> Result<Self> {
        match exponent.into() {
            Operand::QInt(_) => Err(unsupported("exponentiation by QInt")),
            Operand::Int(exp) if exp >= 0 => {
                let exp = u32::try_from(exp).map_err(|_| QIntError::Overflow)?;
                let precision = self
                    .precision
                    .checked_mul(exp)
                    .ok_or(QIntError::Overflow)?;
                match self.value.checked_pow(exp) {
                    Some(value) => Ok(Self::new(value, precision)),
                    None => Err(QIntError::Overflow),
                }
            }
            other => Err(reject(other, "pow")),
        }
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_neg(self) -> Result<Self> {
        self.with_value(self.value.checked_neg())
    }

    /// Unary plus.
    #[inline(always)]
    pub const fn pos(self) -> Self {
        self
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_abs(self) -> Result<Self> {
        self.with_value(self.value.checked_abs())
    }
}

// ============================================================================
// Scale-then-combine
// ============================================================================

impl QInt {
    /// [`try_add`](Self::try_add), then rescale the result to `target`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn add_at(self, other: impl Into<Operand>, target: impl Into<Option<u32>>) -> Result<Self> {
        self.try_add(other)?.scale(target)
    }

    /// [`try_sub`](Self::try_sub), then rescale the result to `target`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn sub_at(self, other: impl Into<Operand>, target: impl Into<Option<u32>>) -> Result<Self> {
        self.try_sub(other)?.scale(target)
    }

    /// [`try_mul`](Self::try_mul), then rescale the result to `target`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn mul_at(self, other: impl Into<Operand>, target: impl Into<Option<u32>>) -> Result<Self> {
        self.try_mul(other)?.scale(target)
    }

    /// Divides so that the result has `target` decimal places.
    ///
    /// The quotient is rounded once, at the target precision. `1.00 / 3.00` at
    /// 4 places is 0.3333, where dividing first and rescaling afterwards would
    /// give 0.0000, and `4.5 / 3` at 0 places is 2 rather than `4 / 3`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn div_at(self, other: impl Into<Operand>, target: impl Into<Option<u32>>) -> Result<Self> {
        let other = other.into();
        let Some(target) = target.into() else {
            return self.try_div(other);
        };
        let (numerator, denominator, divisor_precision) = match other {
            Operand::QInt(rhs) => (self.value as i128, rhs.value as i128, rhs.precision),
            Operand::Int(n) => (self.value as i128, n as i128, 0),
            Operand::Ratio(ratio) => (
                self.value as i128 * *ratio.denom() as i128,
                *ratio.numer() as i128,
                0,
            ),
            other => return Err(reject(other, "div")),
        };
        // mantissa = numerator * 10^(p_rhs + target - p_self) / denominator
        let shift = divisor_precision as i64 + target as i64 - self.precision as i64;
        Self::from_wide(shifted_quotient(numerator, denominator, shift)?, target)
    }
}

/// `numerator * 10^shift / denominator`, rounded half to even exactly once.
///
/// A positive shift scales the numerator up. A negative one scales the
/// denominator up instead, so no digits are dropped before the division.
fn shifted_quotient(numerator: i128, denominator: i128, shift: i64) -> Result<i128> {
    if denominator == 0 {
        return Err(QIntError::DivisionByZero);
    }
    if numerator == 0 {
        return Ok(0);
    }

    let exp = u32::try_from(shift.unsigned_abs()).unwrap_or(u32::MAX);
    if shift >= 0 {
        let factor = pow10(exp).ok_or(QIntError::Overflow)?;
        let numerator = numerator.checked_mul(factor).ok_or(QIntError::Overflow)?;
        bankers_divide_wide(numerator, denominator)
    } else {
        // |numerator| < 2^126, so a denominator past i128 rounds it to zero
        match pow10(exp).and_then(|factor| denominator.checked_mul(factor)) {
            Some(denominator) => bankers_divide_wide(numerator, denominator),
            None => Ok(0),
        }
    }
}

// ============================================================================
// Scale-safe Combination
// ============================================================================

impl QInt {
    /// Brings both sides up to the larger precision. Scaling up is exact, so
    /// this never loses digits.
    fn align(self, other: Operand, operation: &'static str) -> Result<(Self, Self)> {
        let Operand::QInt(rhs) = other else {
            return Err(reject(other, operation));
        };
        let precision = self.precision.max(rhs.precision);
        Ok((self.scale(precision)?, rhs.scale(precision)?))
    }

    /// Adds after aligning both operands to the larger precision.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn scale_safe_add(self, other: impl Into<Operand>) -> Result<Self> {
        let (lhs, rhs) = self.align(other.into(), "add")?;
        lhs.try_add(rhs)
    }

    /// Subtracts after aligning both operands to the larger precision.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn scale_safe_sub(self, other: impl Into<Operand>) -> Result<Self> {
        let (lhs, rhs) = self.align(other.into(), "sub")?;
        lhs.try_sub(rhs)
    }

    /// Multiplies after aligning; the result has twice the larger precision.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn scale_safe_mul(self, other: impl Into<Operand>) -> Result<Self> {
        let (lhs, rhs) = self.align(other.into(), "mul")?;
        lhs.try_mul(rhs)
    }

    /// Divides after aligning; the result has precision 0.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn scale_safe_div(self, other: impl Into<Operand>) -> Result<Self> {
        let (lhs, rhs) = self.align(other.into(), "div")?;
        lhs.try_div(rhs)
    }
}

// ============================================================================
// Comparison
// ============================================================================

impl QInt {
    /// Compares two values of the same precision.
    ///
    /// # Errors
    /// [`QIntError::PrecisionMismatch`] if precisions differ and
    /// [`QIntError::InvalidOperand`] for anything that is not a `QInt`.
    pub fn try_cmp(self, other: impl Into<Operand>) -> Result<Ordering> {
        match other.into() {
            Operand::QInt(rhs) => {
                self.require_precision(rhs, "compare")?;
                Ok(self.value.cmp(&rhs.value))
            }
            other => Err(reject(other, "compare")),
        }
    }

    pub fn try_eq(self, other: impl Into<Operand>) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_eq)
    }

    pub fn try_ne(self, other: impl Into<Operand>) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_ne)
    }

    pub fn try_lt(self, other: impl Into<Operand>) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_lt)
    }

    pub fn try_le(self, other: impl Into<Operand>) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_le)
    }

    pub fn try_gt(self, other: impl Into<Operand>) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_gt)
    }

    pub fn try_ge(self, other: impl Into<Operand>) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_ge)
    }
}

impl PartialOrd for QInt {
    /// `None` when the precisions differ.
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.precision == other.precision).then(|| self.value.cmp(&other.value))
    }
}

// ============================================================================
// Bitwise Operations (rejected)
// ============================================================================

impl QInt {
    /// Always fails: bits of a scaled mantissa carry no decimal meaning.
    pub fn try_bitand(self, _other: impl Into<Operand>) -> Result<Self> {
        Err(unsupported("bitwise AND"))
    }

    /// Always fails with [`QIntError::UnsupportedOperation`].
    pub fn try_bitor(self, _other: impl Into<Operand>) -> Result<Self> {
        Err(unsupported("bitwise OR"))
    }

    /// Always fails with [`QIntError::UnsupportedOperation`].
    pub fn try_bitxor(self, _other: impl Into<Operand>) -> Result<Self> {
        Err(unsupported("bitwise XOR"))
    }

    /// Always fails with [`QIntError::UnsupportedOperation`].
    pub fn try_shl(self, _other: impl Into<Operand>) -> Result<Self> {
        Err(unsupported("bitwise left shift"))
    }

    /// Always fails with [`QIntError::UnsupportedOperation`].
    pub fn try_shr(self, _other: impl Into<Operand>) -> Result<Self> {
        Err(unsupported("bitwise right shift"))
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl QInt {
    /// Float approximation of the true value.
    #[inline]
    pub fn to_f64(self) -> f64 {
        rounding::unquantize(self.value, self.precision)
    }

    /// Exact rational `value / 10^precision`, reduced by [`Ratio::new`].
    ///
    /// # Errors
    /// [`QIntError::Overflow`] if `10^precision` does not fit in an `i64`.
    pub fn to_ratio(self) -> Result<Ratio<i64>> {
        let denom = pow10(self.precision).ok_or(QIntError::Overflow)?;
        Ok(Ratio::new(self.value, narrow(denom)?))
    }

    /// Exact decimal `value / 10^precision`.
    ///
    /// # Errors
    /// [`QIntError::Overflow`] if the precision exceeds the 28 places a
    /// [`Decimal`] can carry.
    pub fn to_decimal(self) -> Result<Decimal> {
        Decimal::try_from_i128_with_scale(self.value as i128, self.precision)
            .map_err(|_| QIntError::Overflow)
    }

    /// Nearest integer, ties to even.
    #[inline]
    pub fn to_integer(self) -> i64 {
        rounding::round_to_power(self.value, self.precision)
    }
}

impl From<QInt> for f64 {
    #[inline(always)]
    fn from(value: QInt) -> Self {
        value.to_f64()
    }
}

impl TryFrom<QInt> for Ratio<i64> {
    type Error = QIntError;

    #[inline(always)]
    fn try_from(value: QInt) -> Result<Self> {
        value.to_ratio()
    }
}

impl TryFrom<QInt> for Decimal {
    type Error = QIntError;

    #[inline(always)]
    fn try_from(value: QInt) -> Result<Self> {
        value.to_decimal()
    }
}

impl TryFrom<Decimal> for QInt {
    type Error = QIntError;

    /// Keeps the decimal's own scale as the precision, so this is exact.
    #[inline(always)]
    fn try_from(value: Decimal) -> Result<Self> {
        Self::from_decimal(value, value.scale())
    }
}

// ============================================================================
// Operator Overloading
// ============================================================================

macro_rules! forward_binop {
    ($rhs:ty, $op:ident, $method:ident, $assign_op:ident, $assign_method:ident, $try_method:ident, $verb:literal) => {
        impl $op<$rhs> for QInt {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: $rhs) -> Self::Output {
                match self.$try_method(rhs) {
                    Ok(result) => result,
                    Err(err) => panic!("attempt to {}: {}", $verb, err),
                }
            }
        }

        impl $assign_op<$rhs> for QInt {
            #[inline]
            fn $assign_method(&mut self, rhs: $rhs) {
                *self = $op::$method(*self, rhs);
            }
        }
    };
}

forward_binop!(QInt, Add, add, AddAssign, add_assign, try_add, "add");
forward_binop!(i64, Add, add, AddAssign, add_assign, try_add, "add");
forward_binop!(QInt, Sub, sub, SubAssign, sub_assign, try_sub, "subtract");
forward_binop!(i64, Sub, sub, SubAssign, sub_assign, try_sub, "subtract");
forward_binop!(QInt, Mul, mul, MulAssign, mul_assign, try_mul, "multiply");
forward_binop!(i64, Mul, mul, MulAssign, mul_assign, try_mul, "multiply");
forward_binop!(Ratio<i64>, Mul, mul, MulAssign, mul_assign, try_mul, "multiply");
forward_binop!(QInt, Div, div, DivAssign, div_assign, try_div, "divide");
forward_binop!(i64, Div, div, DivAssign, div_assign, try_div, "divide");
forward_binop!(Ratio<i64>, Div, div, DivAssign, div_assign, try_div, "divide");
forward_binop!(QInt, Rem, rem, RemAssign, rem_assign, try_rem, "calculate the remainder");

impl Neg for QInt {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        match self.try_neg() {
            Ok(result) => result,
            Err(err) => panic!("attempt to negate: {}", err),
        }
    }
}

// ============================================================================
// Formatting and Parsing
// ============================================================================

impl fmt::Display for QInt {
    /// Prints exactly `precision` fractional digits, so `QInt::new(100, 2)`
    /// is `1.00` and the text parses back to the same value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };
        let abs = self.value.unsigned_abs();

        if self.precision == 0 {
            return write!(f, "{sign}{abs}");
        }

        let width = self.precision as usize;
        match pow10(self.precision) {
            Some(scale) => {
                let scale = scale as u128;
                let abs = abs as u128;
                write!(f, "{sign}{}.{:0width$}", abs / scale, abs % scale)
            }
            // 10^precision exceeds every i64, the integer part is zero
            None => write!(f, "{sign}0.{abs:0width$}"),
        }
    }
}

impl fmt::Debug for QInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // {:#?} shows raw internals
            f.debug_struct("QInt")
                .field("value", &self.value)
                .field("precision", &self.precision)
                .finish()
        } else {
            write!(f, "QInt({})", self)
        }
    }
}

impl FromStr for QInt {
    type Err = QIntError;

    /// Parses `[-+]digits[.digits]`. The precision is the number of digits
    /// after the decimal point, so `"1.50"` is `QInt::new(150, 2)`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(QIntError::InvalidFormat),
        };

        let (integer, fraction) = match digits.split_once('.') {
            Some((_, "")) => return Err(QIntError::InvalidFormat),
            Some(parts) => parts,
            None => (digits, ""),
        };
        if integer.is_empty() && fraction.is_empty() {
            return Err(QIntError::InvalidFormat);
        }

        // Accumulate negatively so i64::MIN parses
        let mut value = 0i64;
        for byte in integer.bytes().chain(fraction.bytes()) {
            let digit = byte.wrapping_sub(b'0');
            if digit > 9 {
                return Err(QIntError::InvalidFormat);
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_sub(digit as i64))
                .ok_or(QIntError::Overflow)?;
        }

        let value = if negative {
            value
        } else {
            value.checked_neg().ok_or(QIntError::Overflow)?
        };
        let precision = u32::try_from(fraction.len()).map_err(|_| QIntError::Overflow)?;

        Ok(Self::new(value, precision))
    }
}

// ============================================================================
// Serde Support
// ============================================================================

#[cfg(feature = "serde")]
impl Serialize for QInt {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            // JSON, TOML, etc. - the string keeps the precision
            serializer.collect_str(self)
        } else {
            // Bincode, MessagePack, etc. - raw pair
            (self.value, self.precision).serialize(serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for QInt {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_str(&s).map_err(de::Error::custom)
        } else {
            let (value, precision) = <(i64, u32)>::deserialize(deserializer)?;
            Ok(Self::new(value, precision))
        }
    }
}


#[cfg(test)]
mod operator_tests {
    use super::*;

    #[test]
    fn test_add() {
        let a = QInt::new(100, 2);
        let b = QInt::new(250, 2);
        assert_eq!(a.try_add(b).unwrap(), QInt::new(350, 2));
        assert_eq!(a.try_add(5).unwrap(), QInt::new(105, 2));
    }

    #[test]
    fn test_add_precision_mismatch() {
        let err = QInt::new(100, 2).try_add(QInt::new(100, 3)).unwrap_err();
        assert_eq!(err, QIntError::PrecisionMismatch(2, 3));
    }

    #[test]
    fn test_add_rejects_ratio_and_float() {
        let a = QInt::new(100, 2);
        assert_eq!(
            a.try_add(Ratio::new(1i64, 2)),
            Err(QIntError::InvalidOperand {
                operand: Operand::Ratio(Ratio::new(1i64, 2)),
                operation: "add",
            })
        );
        assert!(matches!(
            a.try_add(0.5),
            Err(QIntError::InvalidOperand { operation: "add", .. })
        ));
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(QInt::new(i64::MAX, 0).try_add(1), Err(QIntError::Overflow));
    }

    #[test]
    fn test_sub() {
        let a = QInt::new(1_000, 2);
        assert_eq!(a.try_sub(QInt::new(1, 2)).unwrap(), QInt::new(999, 2));
        assert_eq!(a.try_sub(1_000).unwrap(), QInt::zero(2));
        assert_eq!(a.try_sub(a).unwrap(), QInt::zero(2));
        assert_eq!(
            a.try_sub(QInt::new(1, 0)),
            Err(QIntError::PrecisionMismatch(2, 0))
        );
        assert_eq!(QInt::new(i64::MIN, 0).try_sub(1), Err(QIntError::Overflow));
    }

    #[test]
    fn test_mul_adds_precisions() {
        let a = QInt::new(150, 1); // 15.0
        let b = QInt::new(25, 2); // 0.25
        assert_eq!(a.try_mul(b).unwrap(), QInt::new(3_750, 3)); // 3.750
    }

    #[test]
    fn test_mul_scalar_and_ratio() {
        let a = QInt::new(150, 1);
        assert_eq!(a.try_mul(3).unwrap(), QInt::new(450, 1));

        let one = QInt::new(100, 2);
        assert_eq!(one.try_mul(Ratio::new(1i64, 3)).unwrap(), QInt::new(33, 2));
        assert_eq!(one.try_mul(Ratio::new(2i64, 3)).unwrap(), QInt::new(67, 2));
        assert_eq!(QInt::new(5, 0).try_mul(Ratio::new(1i64, 2)).unwrap(), QInt::new(2, 0)); // 2.5 -> 2
        assert!(matches!(
            one.try_mul(2.0),
            Err(QIntError::InvalidOperand { operation: "mul", .. })
        ));
    }

    #[test]
    fn test_mul_overflow() {
        assert_eq!(
            QInt::new(i64::MAX / 2, 0).try_mul(QInt::new(3, 0)),
            Err(QIntError::Overflow)
        );
    }

    #[test]
    fn test_div_subtracts_precisions() {
        // 1.000 / 0.4 = 2.50
        assert_eq!(QInt::new(1_000, 3).try_div(QInt::new(4, 1)).unwrap(), QInt::new(250, 2));
        // 1.00 / 3.00 = 0 at precision 0
        assert_eq!(QInt::new(100, 2).try_div(QInt::new(300, 2)).unwrap(), QInt::new(0, 0));
    }

    #[test]
    fn test_div_by_more_precise_value() {
        // 0.5 / 0.25 = 2
        assert_eq!(QInt::new(5, 1).try_div(QInt::new(25, 2)).unwrap(), QInt::new(2, 0));
    }

    #[test]
    fn test_zero_div_by_far_more_precise_value() {
        // 10^40 does not fit an i128, but zero needs no scaling
        assert_eq!(QInt::new(0, 0).try_div(QInt::new(1, 40)).unwrap(), QInt::new(0, 0));
        assert_eq!(QInt::new(0, 1).try_floor_div(QInt::new(-3, 45)).unwrap(), QInt::new(0, 0));
        assert_eq!(QInt::new(1, 0).try_div(QInt::new(1, 40)), Err(QIntError::Overflow));
    }

    #[test]
    fn test_div_scalar_and_ratio() {
        assert_eq!(QInt::new(1_000, 2).try_div(3).unwrap(), QInt::new(333, 2));
        assert_eq!(QInt::new(250, 2).try_div(2).unwrap(), QInt::new(125, 2));
        assert_eq!(QInt::new(5, 0).try_div(2).unwrap(), QInt::new(2, 0)); // 2.5 -> 2
        assert_eq!(QInt::new(7, 0).try_div(2).unwrap(), QInt::new(4, 0)); // 3.5 -> 4

        let one = QInt::new(100, 2);
        assert_eq!(one.try_div(Ratio::new(1i64, 3)).unwrap(), QInt::new(300, 2));
        assert_eq!(one.try_div(Ratio::new(3i64, 2)).unwrap(), QInt::new(67, 2));
    }

    #[test]
    fn test_div_by_zero() {
        let a = QInt::new(100, 2);
        assert_eq!(a.try_div(QInt::new(0, 2)), Err(QIntError::DivisionByZero));
        assert_eq!(a.try_div(0), Err(QIntError::DivisionByZero));
        assert_eq!(a.try_div(Ratio::new(0i64, 1)), Err(QIntError::DivisionByZero));
    }

    #[test]
    fn test_floor_div() {
        let two = QInt::new(200, 2);
        assert_eq!(QInt::new(700, 2).try_floor_div(two).unwrap(), QInt::new(3, 0));
        assert_eq!(QInt::new(-700, 2).try_floor_div(two).unwrap(), QInt::new(-4, 0));
        assert_eq!(QInt::new(-7, 0).try_floor_div(2).unwrap(), QInt::new(-4, 0));
        assert_eq!(QInt::new(100, 2).try_floor_div(Ratio::new(3i64, 2)).unwrap(), QInt::new(66, 2));
        assert_eq!(QInt::new(100, 2).try_floor_div(QInt::new(0, 2)), Err(QIntError::DivisionByZero));
        assert_eq!(QInt::new(100, 2).try_floor_div(0), Err(QIntError::DivisionByZero));
    }

    #[test]
    fn test_rem() {
        let three = QInt::new(300, 2);
        assert_eq!(QInt::new(700, 2).try_rem(three).unwrap(), QInt::new(100, 2));
        assert_eq!(QInt::new(-700, 2).try_rem(three).unwrap(), QInt::new(200, 2));
        assert_eq!(
            QInt::new(700, 2).try_rem(QInt::new(3, 0)),
            Err(QIntError::PrecisionMismatch(2, 0))
        );
        assert!(matches!(
            QInt::new(700, 2).try_rem(3),
            Err(QIntError::InvalidOperand { operation: "mod", .. })
        ));
        assert_eq!(QInt::new(700, 2).try_rem(QInt::zero(2)), Err(QIntError::DivisionByZero));
    }

    #[test]
    fn test_pow() {
        let a = QInt::new(15, 1); // 1.5
        assert_eq!(a.try_pow(2).unwrap(), QInt::new(225, 2)); // 2.25
        assert_eq!(a.try_pow(3u32).unwrap(), QInt::new(3_375, 3));
        assert_eq!(a.try_pow(0).unwrap(), QInt::new(1, 0));
    }

    #[test]
    fn test_pow_rejections() {
        let a = QInt::new(15, 1);
        assert_eq!(
            a.try_pow(QInt::new(2, 0)),
            Err(QIntError::UnsupportedOperation("exponentiation by QInt"))
        );
        assert!(matches!(a.try_pow(-1), Err(QIntError::InvalidOperand { operation: "pow", .. })));
        assert!(matches!(a.try_pow(2.0), Err(QIntError::InvalidOperand { operation: "pow", .. })));
        assert!(matches!(
            a.try_pow(Ratio::new(1i64, 2)),
            Err(QIntError::InvalidOperand { operation: "pow", .. })
        ));
        assert_eq!(QInt::new(10, 0).try_pow(19), Err(QIntError::Overflow));
    }

    #[test]
    fn test_unary() {
        let a = QInt::new(-125, 2);
        assert_eq!(a.try_neg().unwrap(), QInt::new(125, 2));
        assert_eq!(a.pos(), a);
        assert_eq!(a.try_abs().unwrap(), QInt::new(125, 2));
        assert_eq!(QInt::new(i64::MIN, 0).try_neg(), Err(QIntError::Overflow));
        assert_eq!(QInt::new(i64::MIN, 0).try_abs(), Err(QIntError::Overflow));
    }

    #[test]
    fn test_bitwise_always_rejected() {
        let a = QInt::new(6, 0);
        let b = QInt::new(3, 0);
        assert_eq!(a.try_bitand(b), Err(QIntError::UnsupportedOperation("bitwise AND")));
        assert_eq!(a.try_bitor(3), Err(QIntError::UnsupportedOperation("bitwise OR")));
        assert_eq!(a.try_bitxor(b), Err(QIntError::UnsupportedOperation("bitwise XOR")));
        assert_eq!(a.try_shl(1), Err(QIntError::UnsupportedOperation("bitwise left shift")));
        assert_eq!(a.try_shr(1), Err(QIntError::UnsupportedOperation("bitwise right shift")));
    }

    #[test]
    fn test_operators() {
        let a = QInt::new(300, 2);
        let b = QInt::new(200, 2);
        assert_eq!(a + b, QInt::new(500, 2));
        assert_eq!(a - b, QInt::new(100, 2));
        assert_eq!(a * b, QInt::new(60_000, 4));
        assert_eq!(a / b, QInt::new(2, 0)); // 1.5 -> 2
        assert_eq!(a % b, QInt::new(100, 2));
        assert_eq!(-a, QInt::new(-300, 2));
        assert_eq!(a + 1, QInt::new(301, 2));
        assert_eq!(a * Ratio::new(1i64, 2), QInt::new(150, 2));
        assert_eq!(a / Ratio::new(1i64, 2), QInt::new(600, 2));
    }

    #[test]
    fn test_assign_operators() {
        let mut a = QInt::new(100, 2);
        a += QInt::new(50, 2);
        assert_eq!(a, QInt::new(150, 2));
        a -= 50;
        assert_eq!(a, QInt::new(100, 2));
        a *= 3;
        assert_eq!(a, QInt::new(300, 2));
        a /= 4;
        assert_eq!(a, QInt::new(75, 2));
        a %= QInt::new(50, 2);
        assert_eq!(a, QInt::new(25, 2));
    }

    #[test]
    #[should_panic(expected = "attempt to add")]
    fn test_add_operator_panics_on_mismatch() {
        let _ = QInt::new(100, 2) + QInt::new(100, 3);
    }

    #[test]
    #[should_panic(expected = "attempt to divide: division by zero")]
    fn test_div_operator_panics_on_zero() {
        let _ = QInt::new(100, 2) / QInt::zero(2);
    }

    #[test]
    fn test_operands_are_not_mutated() {
        let a = QInt::new(123, 2);
        let b = QInt::new(456, 2);
        let _ = a.try_add(b);
        let _ = a.try_mul(b);
        let _ = a.try_div(b);
        let _ = a.div_at(b, 6);
        let _ = a.scale(0);
        assert_eq!((a.value(), a.precision()), (123, 2));
        assert_eq!((b.value(), b.precision()), (456, 2));
    }
}
