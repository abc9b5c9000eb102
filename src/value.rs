use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed value domain for condition-table factors.
///
/// Design files carry plain literals. Untagged deserialization tries scalars
/// first, then the fixed-arity vectors, then the nested list, so a 2/3/4
/// element numeric array reads as a vector and longer arrays fall through to
/// `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Color { r: f32, g: f32, b: f32, a: f32 },
    List(Vec<FactorValue>),
}

impl FactorValue {
    /// Numeric view used by range-expanded designs and summaries.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactorValue::Int(v) => Some(*v as f64),
            FactorValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FactorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorValue::Bool(v) => write!(f, "{v}"),
            FactorValue::Int(v) => write!(f, "{v}"),
            FactorValue::Float(v) => write!(f, "{v}"),
            FactorValue::Vec2([x, y]) => write!(f, "({x}, {y})"),
            FactorValue::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            FactorValue::Vec4([x, y, z, w]) => write!(f, "({x}, {y}, {z}, {w})"),
            FactorValue::Color { r, g, b, a } => write!(f, "rgba({r}, {g}, {b}, {a})"),
            FactorValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
