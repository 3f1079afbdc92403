use num_rational::Ratio;

use crate::QInt;

/// A plain scalar that has not been quantized yet.
///
/// Used by [`QInt::create`], which scales integers exactly and quantizes
/// floats with banker's rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl From<i64> for Number {
    #[inline(always)]
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    #[inline(always)]
    fn from(value: i32) -> Self {
        Number::Int(value as i64)
    }
}

impl From<u32> for Number {
    #[inline(always)]
    fn from(value: u32) -> Self {
        Number::Int(value as i64)
    }
}

impl From<f64> for Number {
    #[inline(always)]
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<f32> for Number {
    #[inline(always)]
    fn from(value: f32) -> Self {
        Number::Float(value as f64)
    }
}

/// The right-hand side of a binary [`QInt`] operation.
///
/// Each operator accepts only some of these kinds:
///
/// | Operation | `QInt` | `Int` | `Ratio` | `Float` |
/// |---|---|---|---|---|
/// | add, sub | same precision | yes | no | no |
/// | mul | yes | yes | yes | no |
/// | div, floor div | yes | yes | yes | no |
/// | mod | same precision | no | no | no |
/// | pow | no (unsupported) | non-negative | no | no |
/// | comparisons | same precision | no | no | no |
///
/// Anything outside the table fails with
/// [`QIntError::InvalidOperand`](crate::QIntError::InvalidOperand).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    QInt(QInt),
    /// A raw integer, applied to the mantissa directly.
    Int(i64),
    /// An exact rational `numer / denom`.
    Ratio(Ratio<i64>),
    /// Never accepted by an operator; kept so the rejection is a typed error.
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    QInt,
    Int,
    Ratio,
    Float,
}

impl Operand {
    #[inline(always)]
    pub const fn kind(&self) -> OperandKind {
        match self {
            Operand::QInt(_) => OperandKind::QInt,
            Operand::Int(_) => OperandKind::Int,
            Operand::Ratio(_) => OperandKind::Ratio,
            Operand::Float(_) => OperandKind::Float,
        }
    }
}

impl From<QInt> for Operand {
    #[inline(always)]
    fn from(value: QInt) -> Self {
        Operand::QInt(value)
    }
}

impl From<i64> for Operand {
    #[inline(always)]
    fn from(value: i64) -> Self {
        Operand::Int(value)
    }
}

impl From<i32> for Operand {
    #[inline(always)]
    fn from(value: i32) -> Self {
        Operand::Int(value as i64)
    }
}

impl From<u32> for Operand {
    #[inline(always)]
    fn from(value: u32) -> Self {
        Operand::Int(value as i64)
    }
}

impl From<Ratio<i64>> for Operand {
    #[inline(always)]
    fn from(value: Ratio<i64>) -> Self {
        Operand::Ratio(value)
    }
}

impl From<f64> for Operand {
    #[inline(always)]
    fn from(value: f64) -> Self {
        Operand::Float(value)
    }
}

impl From<Number> for Operand {
    #[inline(always)]
    fn from(value: Number) -> Self {
        match value {
            Number::Int(n) => Operand::Int(n),
            Number::Float(x) => Operand::Float(x),
        }
    }
}
