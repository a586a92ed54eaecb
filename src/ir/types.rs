//! Value types and predicate guards.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel written for an unconditional predicate or polarity.
pub const UNCONDITIONAL: &str = "undefined";

/// The result type of an instruction.
///
/// Only [`Type::Int`] and [`Type::Vector`] take part in rewriting; any other type
/// string is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Type {
    /// A scalar integer.
    Int,
    /// A scalar boolean.
    Bool,
    /// A full vector register.
    Vector,
    /// Any other type, kept verbatim.
    Other(String),
}

impl Type {
    /// Returns `true` for [`Type::Vector`].
    #[must_use]
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector)
    }

    /// Returns the type as written in program documents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Vector => "vector",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Type {
    fn from(value: String) -> Self {
        match value.as_str() {
            "int" => Self::Int,
            "bool" => Self::Bool,
            "vector" => Self::Vector,
            _ => Self::Other(value),
        }
    }
}

impl From<Type> for String {
    fn from(value: Type) -> Self {
        match value {
            Type::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-lane guard of a predicated vector instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Predicate {
    /// Every lane executes.
    Unconditional,
    /// Lanes execute where the named predicate register is set.
    Lane(String),
}

impl Predicate {
    /// Returns the guarding variable, if any.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Unconditional => None,
            Self::Lane(name) => Some(name),
        }
    }
}

impl From<String> for Predicate {
    fn from(value: String) -> Self {
        if value == UNCONDITIONAL {
            Self::Unconditional
        } else {
            Self::Lane(value)
        }
    }
}

impl From<Predicate> for String {
    fn from(value: Predicate) -> Self {
        match value {
            Predicate::Unconditional => UNCONDITIONAL.to_string(),
            Predicate::Lane(name) => name,
        }
    }
}

/// Polarity of a predicate guard.
///
/// A guard is negated when `neg` equals `1` under loose comparison, so both
/// `"1"` and `1` negate; `"undefined"` means no guard is in effect. The value
/// read from the document is kept and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Polarity {
    /// No guard is in effect.
    Unconditional,
    /// Lanes run where the predicate is set.
    Positive(Value),
    /// Lanes run where the predicate is clear.
    Negated(Value),
}

impl Polarity {
    /// A positive guard, encoded as `"0"`.
    #[must_use]
    pub fn positive() -> Self {
        Self::Positive(Value::from("0"))
    }

    /// A negated guard, encoded as `"1"`.
    #[must_use]
    pub fn negated() -> Self {
        Self::Negated(Value::from("1"))
    }

    /// Returns `true` for a negated guard.
    #[must_use]
    pub fn is_negated(&self) -> bool {
        matches!(self, Self::Negated(_))
    }
}

impl From<Value> for Polarity {
    fn from(value: Value) -> Self {
        let negated = match &value {
            Value::String(text) if text == UNCONDITIONAL => return Self::Unconditional,
            Value::String(text) => text == "1",
            Value::Number(number) => number.as_f64() == Some(1.0),
            Value::Bool(flag) => *flag,
            _ => false,
        };
        if negated {
            Self::Negated(value)
        } else {
            Self::Positive(value)
        }
    }
}

impl From<Polarity> for Value {
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Unconditional => Value::from(UNCONDITIONAL),
            Polarity::Positive(value) | Polarity::Negated(value) => value,
        }
    }
}
