//! Exact fixed-point decimal integers with a per-value precision
//!
//! A [`QInt`] stores an `i64` mantissa together with a precision, the number
//! of implied fractional digits. The true value is `value / 10^precision`:
//!
//! - `QInt::new(12345, 2)` is 123.45
//! - `QInt::new(5, 0)` is 5
//! - `QInt::new(-1, 3)` is -0.001
//!
//! ## Precision rules
//!
//! - Addition, subtraction, modulo and comparison require both sides to have
//!   the same precision. Mixing precisions fails with
//!   [`QIntError::PrecisionMismatch`]; nothing is coerced behind your back.
//! - Multiplication adds precisions, division subtracts them.
//! - Scaling up is exact. Scaling down, and every division, rounds half to
//!   even (banker's rounding).
//! - The `*_at` methods rescale the result to a target precision, and the
//!   `scale_safe_*` methods bring both operands up to the larger precision
//!   before combining them.
//!
//! ## Example
//!
//! ```rust
//! use qint::{QInt, QIntError};
//!
//! let price = QInt::create(19.99, 2)?;
//! let fee = QInt::new(150, 2);
//! let total = price.try_add(fee)?;
//! assert_eq!(total, QInt::new(2149, 2));
//!
//! // 1.00 / 3.00 at four decimal places
//! let third = QInt::new(100, 2).div_at(QInt::new(300, 2), 4)?;
//! assert_eq!(third, QInt::new(3333, 4));
//!
//! let err = QInt::new(100, 2).try_add(QInt::new(100, 3)).unwrap_err();
//! assert_eq!(err, QIntError::PrecisionMismatch(2, 3));
//! # Ok::<(), QIntError>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`QInt`]. Human-readable formats
//!   use the decimal string, binary formats the raw `(value, precision)` pair.

mod operand;
mod qint;
pub mod rounding;

pub use operand::{Number, Operand, OperandKind};
pub use qint::QInt;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QIntError {
    #[error("cannot operate on QInt values with differing precisions: {0} and {1}")]
    PrecisionMismatch(u32, u32),

    #[error("invalid operand {operand:?} for {operation}")]
    InvalidOperand {
        operand: Operand,
        operation: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0} is not supported for QInt")]
    UnsupportedOperation(&'static str),

    #[error("overflow: value too large to represent")]
    Overflow,

    #[error("invalid string format")]
    InvalidFormat,
}

pub type Result<T> = core::result::Result<T, QIntError>;
