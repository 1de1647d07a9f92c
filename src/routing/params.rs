//! Request and link parameter values.
//!
//! Parameters flow in both directions: variables bound by a forward match,
//! and caller-supplied values rendered by a [`UrlCreator`](crate::routing::UrlCreator).
//! Values are strings, lists of strings, or absent.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered parameter map. Iteration is by name, so rendered query strings
/// and cache keys are deterministic.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// Returns the first value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            ParamValue::Null => None,
            ParamValue::Single(s) => Some(s.as_str()),
            ParamValue::Many(values) => values.first().map(String::as_str),
        }
    }

    /// Returns all values in order. `Null` yields nothing.
    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Null => Vec::new(),
            ParamValue::Single(s) => vec![s.as_str()],
            ParamValue::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Flattens the value into one string, joining lists with `,`.
    pub fn joined(&self) -> String {
        match self {
            ParamValue::Null => String::new(),
            ParamValue::Single(s) => s.clone(),
            ParamValue::Many(values) => values.join(","),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// True for `Null`, an empty string, or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Null => true,
            ParamValue::Single(s) => s.is_empty(),
            ParamValue::Many(values) => values.is_empty(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Single(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Single(value.to_string())
    }
}

macro_rules! param_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    ParamValue::Single(value.to_string())
                }
            }
        )*
    };
}

param_from_number!(i32, i64, u32, u64, usize, f64);

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Many(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Builds a [`ParamMap`] from `name => value` pairs.
#[macro_export]
macro_rules! params {
    () => { $crate::routing::ParamMap::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::routing::ParamMap::new();
        $( map.insert($name.to_string(), $crate::routing::ParamValue::from($value)); )+
        map
    }};
}
