//! Structural query identity.
//!
//! A [`QueryKey`] names a logical resource plus an ordered list of primitive
//! parameter values. Equality and hashing are structural, so two keys built
//! independently from the same inputs address the same cache entry. Parameter
//! order is significant: `issues[react, facebook]` and `issues[facebook,
//! react]` are different keys.

use std::fmt;

/// A primitive query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{s}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Structural identifier for one cached query.
///
/// Immutable once built. Used as the cache's mapping key; `Hash` + `Eq`
/// derive from the name and the ordered parameter list.
///
/// ```rust
/// use requery::QueryKey;
///
/// let a = QueryKey::new("repositories").param("react").param("stars");
/// let b = QueryKey::new("repositories").param("react").param("stars");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    name: String,
    params: Vec<ParamValue>,
}

impl QueryKey {
    /// Start a key for the given logical resource name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter value. Order is significant.
    pub fn param(mut self, value: impl Into<ParamValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// The logical resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered parameter values.
    pub fn params(&self) -> &[ParamValue] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, "]")
    }
}
