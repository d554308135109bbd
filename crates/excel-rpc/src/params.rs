//! Typed access to call parameters.
//!
//! Handlers declare each parameter with its name and its position, so the
//! same handler serves `{"book": "Book1"}` and `["Book1"]`.

use excel_rpc_protocol::Params;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{HostError, HostResult};

/// Parameters of one call. Empty when the request carried none.
#[derive(Debug, Clone, Default)]
pub struct Args {
    params: Option<Params>,
}

impl Args {
    pub fn new(params: Option<Params>) -> Self {
        Self { params }
    }

    fn raw(&self, name: &str, position: usize) -> Option<&Value> {
        self.params
            .as_ref()
            .and_then(|p| p.get(name, position))
            .filter(|v| !v.is_null())
    }

    /// A parameter that must be present and non-null.
    pub fn required<T: DeserializeOwned>(&self, name: &str, position: usize) -> HostResult<T> {
        match self.raw(name, position) {
            Some(value) => decode(name, value),
            None => Err(HostError::invalid_argument(format!(
                "missing required parameter '{name}'"
            ))),
        }
    }

    /// A parameter that may be absent or null.
    pub fn optional<T: DeserializeOwned>(
        &self,
        name: &str,
        position: usize,
    ) -> HostResult<Option<T>> {
        self.raw(name, position).map(|v| decode(name, v)).transpose()
    }

    /// A parameter with a default for when it is absent or null.
    pub fn or<T: DeserializeOwned>(&self, name: &str, position: usize, default: T) -> HostResult<T> {
        Ok(self.optional(name, position)?.unwrap_or(default))
    }

    /// The raw JSON of a parameter, for values that go through
    /// [`crate::serialize::deserialize`] rather than a typed decode.
    pub fn value(&self, name: &str, position: usize) -> HostResult<Value> {
        self.raw(name, position).cloned().ok_or_else(|| {
            HostError::invalid_argument(format!("missing required parameter '{name}'"))
        })
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> HostResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| HostError::invalid_argument(format!("invalid parameter '{name}': {e}")))
}
