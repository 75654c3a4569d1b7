//! # Operators
//!
//! Comparison operators for rules and the epsilon-tolerant comparator every
//! monetary comparison in the engine goes through.
//!
//! Raw `==` on `f64` is never used for amounts: sums of prices accumulate
//! representation error (`0.1 + 0.2 != 0.3`), so two values closer than
//! [`FLOAT_EPSILON`] are treated as equal, and the boundaries of `>=`/`<=`
//! inherit that tolerance.

use std::fmt;
use std::str::FromStr;

/// Absolute difference below which two amounts compare equal
pub const FLOAT_EPSILON: f64 = 1e-10;

/// Comparison operator configured on a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal
    Eq,
    /// Not equal
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
}

impl Operator {
    /// Every operator, in configuration order
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
    ];

    /// Equality operators only
    pub const EQUALITY: [Operator; 2] = [Operator::Eq, Operator::Neq];

    /// Returns the configuration string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    /// Returns true for operators that compare ranges rather than equality
    pub fn is_range(&self) -> bool {
        !matches!(self, Operator::Eq | Operator::Neq)
    }

    /// Compare `actual` against `expected` with this operator
    pub fn compare(self, actual: f64, expected: f64) -> bool {
        compare(self, actual, expected)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator string that does not name any [`Operator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator `{}`", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" | "=" => Ok(Operator::Eq),
            "neq" | "!=" => Ok(Operator::Neq),
            "gt" | ">" => Ok(Operator::Gt),
            "gte" | ">=" => Ok(Operator::Gte),
            "lt" | "<" => Ok(Operator::Lt),
            "lte" | "<=" => Ok(Operator::Lte),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// Returns true if `a` and `b` differ by less than [`FLOAT_EPSILON`]
pub fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < FLOAT_EPSILON
}

/// Compare `actual` against `expected` using `operator`.
///
/// Equality is epsilon-tolerant, and strict operators exclude values that are
/// equal within the tolerance, so `compare(Gt, 2.0 + 1e-12, 2.0)` is false and
/// `compare(Lte, 2.0 + 1e-12, 2.0)` is true.
pub fn compare(operator: Operator, actual: f64, expected: f64) -> bool {
    let eq = float_eq(actual, expected);

    match operator {
        Operator::Eq => eq,
        Operator::Neq => !eq,
        Operator::Gt => !eq && actual > expected,
        Operator::Gte => eq || actual > expected,
        Operator::Lt => !eq && actual < expected,
        Operator::Lte => eq || actual < expected,
    }
}
