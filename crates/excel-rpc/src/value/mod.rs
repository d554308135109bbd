//! Host-side values.
//!
//! [`HostValue`] is everything an adapter can hand back to the dispatcher.
//! Its variants follow the order in which [`crate::serialize::serialize`]
//! tries them: primitives, temporal values, containers, numeric arrays,
//! tabular data, live handles, fixed-width scalars and finally anything
//! printable.

mod array;
mod frame;
mod scalar;

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::handle::Handle;

pub use array::NdArray;
pub use frame::{DataFrame, Series};
pub use scalar::Scalar;
pub(crate) use scalar::float_to_json;

/// A value produced (or consumed) by the automation layer.
#[derive(Debug, Clone)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<HostValue>),
    /// Key/value pairs in insertion order. Keys may be any host value.
    Map(Vec<(HostValue, HostValue)>),
    Array(NdArray),
    Frame(DataFrame),
    Series(Series),
    Handle(Handle),
    Scalar(Scalar),
    Object(Opaque),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Wrap anything printable as an opaque value.
    pub fn object<T: fmt::Display + Send + Sync + 'static>(value: T) -> Self {
        HostValue::Object(Opaque(Arc::new(value)))
    }

    /// Build a map from string keys.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        HostValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (HostValue::Str(k.into()), v))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Int(n) => Some(*n as f64),
            HostValue::Float(x) => Some(*x),
            HostValue::Scalar(s) => Some(s.as_f64()),
            _ => None,
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::Null
    }
}

/// A value whose only capability is its textual representation.
#[derive(Clone)]
pub struct Opaque(pub Arc<dyn fmt::Display + Send + Sync>);

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.0)
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plain structural conversion. Tagged tabular payloads stay ordinary maps;
/// use [`crate::serialize::deserialize`] to rebuild frames and series.
impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => HostValue::Int(i),
                (None, Some(u)) => HostValue::Scalar(Scalar::U64(u)),
                (None, None) => HostValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => HostValue::Str(s),
            Value::Array(items) => HostValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => HostValue::Map(
                map.into_iter()
                    .map(|(k, v)| (HostValue::Str(k), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Int(i64::from(n))
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Int(n)
    }
}

impl From<u32> for HostValue {
    fn from(n: u32) -> Self {
        HostValue::Int(i64::from(n))
    }
}

impl From<f64> for HostValue {
    fn from(x: f64) -> Self {
        HostValue::Float(x)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl From<NaiveDate> for HostValue {
    fn from(d: NaiveDate) -> Self {
        HostValue::Date(d)
    }
}

impl From<NaiveDateTime> for HostValue {
    fn from(dt: NaiveDateTime) -> Self {
        HostValue::DateTime(dt)
    }
}

impl From<Scalar> for HostValue {
    fn from(s: Scalar) -> Self {
        HostValue::Scalar(s)
    }
}

impl From<NdArray> for HostValue {
    fn from(a: NdArray) -> Self {
        HostValue::Array(a)
    }
}

impl From<DataFrame> for HostValue {
    fn from(df: DataFrame) -> Self {
        HostValue::Frame(df)
    }
}

impl From<Series> for HostValue {
    fn from(s: Series) -> Self {
        HostValue::Series(s)
    }
}

impl From<Handle> for HostValue {
    fn from(h: Handle) -> Self {
        HostValue::Handle(h)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(HostValue::Null, Into::into)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::List(items.into_iter().map(Into::into).collect())
    }
}
