//! Core types for labeled rasters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the column (longitude/easting) dimension.
pub const X_DIM: &str = "x";
/// Name of the row (latitude/northing) dimension.
pub const Y_DIM: &str = "y";
/// Name of the date dimension.
pub const DATE_DIM: &str = "date";

/// A coordinate label along a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CoordValue {
    /// Integer view of the label, accepting integral floats.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Numeric view of the label.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CoordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CoordValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for CoordValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for CoordValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CoordValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CoordValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A named dimension and its coordinate labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub labels: Vec<CoordValue>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, labels: Vec<CoordValue>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    /// A dimension labeled `0..size`.
    pub fn indexed(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, (0..size as i64).map(CoordValue::Int).collect())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of `label` along this dimension.
    pub fn position(&self, label: &CoordValue) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// How attributes are combined when rasters are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrPolicy {
    /// Discard all attributes.
    Drop,
    /// Keep attributes whose values agree across all parts.
    #[default]
    DropConflicts,
    /// Keep the first part's attributes.
    First,
}

impl AttrPolicy {
    /// Combine attribute maps according to the policy.
    pub fn combine<'a, I>(&self, parts: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = &'a BTreeMap<String, String>>,
    {
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return BTreeMap::new();
        };

        match self {
            Self::Drop => BTreeMap::new(),
            Self::First => first.clone(),
            Self::DropConflicts => {
                let mut merged = first.clone();
                let mut conflicted = Vec::new();
                for attrs in parts {
                    for (key, value) in attrs {
                        match merged.get(key) {
                            Some(existing) if existing != value => conflicted.push(key.clone()),
                            Some(_) => {}
                            None => {
                                merged.insert(key.clone(), value.clone());
                            }
                        }
                    }
                }
                for key in conflicted {
                    merged.remove(&key);
                }
                merged
            }
        }
    }
}
