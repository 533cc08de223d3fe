#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! In-memory representation of Python literal values and the equality rules
//! used when grading printed answers.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Numeric tolerance applied whenever a float takes part in a comparison.
///
/// Two numbers `a` and `b` are accepted when
/// `|a - b| <= max(absolute, relative * max(|a|, |b|))`, mirroring
/// `math.isclose`. Integer-to-integer comparisons ignore the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Absolute slack.
    #[serde(default)]
    pub absolute: f64,
    /// Slack relative to the larger magnitude of the two operands.
    #[serde(default)]
    pub relative: f64,
}

impl Tolerance {
    /// Exact equality.
    pub const EXACT: Tolerance = Tolerance {
        absolute: 0.0,
        relative: 0.0,
    };

    /// Creates a new tolerance.
    pub const fn new(absolute: f64, relative: f64) -> Self {
        Self { absolute, relative }
    }

    /// Returns true if `a` and `b` are close enough.
    pub fn accepts(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let slack = self
            .absolute
            .max(self.relative * a.abs().max(b.abs()));
        (a - b).abs() <= slack
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::EXACT
    }
}

/// A Python value, as produced by `ast.literal_eval`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `None`
    None,
    /// `True` / `False`
    Bool(bool),
    /// An integer that fits in 64 bits.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// A list.
    List(Vec<Value>),
    /// A tuple.
    Tuple(Vec<Value>),
    /// A dict, in insertion order, with unique keys.
    Dict(Vec<(Value, Value)>),
    /// A set, with unique members.
    Set(Vec<Value>),
}

impl Value {
    /// Builds a dict the way Python does: a repeated key keeps its first
    /// position and its last value.
    pub fn dict(pairs: Vec<(Value, Value)>) -> Value {
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            match entries
                .iter_mut()
                .find(|(existing, _)| existing.py_eq(&key, &Tolerance::EXACT))
            {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Value::Dict(entries)
    }

    /// Builds a set, dropping members equal to an earlier one.
    pub fn set(members: Vec<Value>) -> Value {
        let mut unique: Vec<Value> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.iter().any(|m| m.py_eq(&member, &Tolerance::EXACT)) {
                unique.push(member);
            }
        }
        Value::Set(unique)
    }

    /// Name of the Python type, used in grading remarks.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
        }
    }

    /// Numeric view of bools, ints and floats.
    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Returns true when the two values can be meaningfully compared with
    /// `==` in Python without it being trivially `False` due to type.
    pub fn comparable_with(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.as_number().is_some() && b.as_number().is_some() => true,
            (Value::None, Value::None)
            | (Value::Str(_), Value::Str(_))
            | (Value::List(_), Value::List(_))
            | (Value::Tuple(_), Value::Tuple(_))
            | (Value::Dict(_), Value::Dict(_))
            | (Value::Set(_), Value::Set(_)) => true,
            _ => false,
        }
    }

    /// Python `==`, with floats compared under `tolerance`.
    pub fn py_eq(&self, other: &Value, tolerance: &Tolerance) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(a), Number::Int(b)) => a == b,
                (a, b) => tolerance.accepts(a.as_f64(), b.as_f64()),
            };
        }

        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y, tolerance))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter()
                            .find(|(other_key, _)| other_key.py_eq(key, &Tolerance::EXACT))
                            .is_some_and(|(_, other_value)| value.py_eq(other_value, tolerance))
                    })
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|x| b.iter().any(|y| x.py_eq(y, &Tolerance::EXACT)))
            }
            _ => false,
        }
    }
}

/// Numeric projection used by [`Value::py_eq`].
#[derive(Clone, Copy)]
enum Number {
    /// Exact integer, including bools.
    Int(i64),
    /// Floating point.
    Float(f64),
}

impl Number {
    /// Widens to `f64`.
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Writes a string the way Python's `repr` does for common text.
fn write_py_str(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c if c == quote => write!(f, "\\{c}")?,
            c if (c as u32) < 0x20 || c as u32 == 0x7f => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

/// Writes `items` separated by `, `.
fn write_seq(f: &mut Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Formats like Python's `repr`.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_nan() => write!(f, "nan"),
            Value::Float(x) if x.is_infinite() => {
                write!(f, "{}", if *x > 0.0 { "inf" } else { "-inf" })
            }
            Value::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write_py_str(f, s),
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => {
                write!(f, "{{")?;
                write_seq(f, items)?;
                write!(f, "}}")
            }
        }
    }
}
