//! Wire types for the Excel automation JSON-RPC 2.0 service.
//!
//! The protocol is plain JSON-RPC 2.0: a client POSTs a request object (or an
//! array of them) and receives a response object (or an array of them).
//!
//! ```text
//! --> {"jsonrpc":"2.0","method":"sheet.get","params":{"book":"Book1","sheet":0},"id":1}
//! <-- {"jsonrpc":"2.0","result":{"name":"Sheet1",...},"id":1}
//! ```
//!
//! This crate only describes envelopes. Dispatching, value conversion and
//! error classification live in `excel-rpc`.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only protocol tag this server speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// The `"jsonrpc": "2.0"` member. Deserializing any other tag fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version;

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        if tag == JSONRPC_VERSION {
            Ok(Version)
        } else {
            Err(de::Error::custom(format!(
                "unsupported jsonrpc version '{tag}'"
            )))
        }
    }
}

/// Request identifier. Requests without one are notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl Id {
    /// Accept only the identifier shapes JSON-RPC allows (integers and strings).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Id::Number),
            Value::String(s) => Some(Id::String(s.clone())),
            _ => None,
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
        }
    }
}

/// Call parameters: by name or by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Named(Map<String, Value>),
    Positional(Vec<Value>),
}

impl Params {
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Named(map) => map.is_empty(),
            Params::Positional(list) => list.is_empty(),
        }
    }

    /// Look a parameter up by name, or by position for positional calls.
    pub fn get(&self, name: &str, position: usize) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(name),
            Params::Positional(list) => list.get(position),
        }
    }
}

/// A validated request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: Version,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

/// Why a payload is not a valid request, plus whatever identifier could be
/// recovered from it so the error response can still be correlated.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeError {
    pub id: Option<Id>,
    pub reason: String,
}

impl EnvelopeError {
    fn new(id: Option<Id>, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for EnvelopeError {}

impl Request {
    /// Validate an arbitrary JSON value as a request envelope.
    ///
    /// An explicit `"id": null` is treated like a missing id, i.e. the
    /// request becomes a notification.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut map) = value else {
            return Err(EnvelopeError::new(None, "request must be a JSON object"));
        };

        let id = match map.remove("id") {
            None | Some(Value::Null) => None,
            Some(raw) => match Id::from_value(&raw) {
                Some(id) => Some(id),
                None => {
                    return Err(EnvelopeError::new(
                        None,
                        "id must be a string or an integer",
                    ))
                }
            },
        };

        match map.get("jsonrpc") {
            Some(Value::String(tag)) if tag == JSONRPC_VERSION => {}
            _ => {
                return Err(EnvelopeError::new(
                    id,
                    format!("jsonrpc must be exactly \"{JSONRPC_VERSION}\""),
                ))
            }
        }

        let method = match map.remove("method") {
            Some(Value::String(method)) if !method.is_empty() => method,
            _ => return Err(EnvelopeError::new(id, "method must be a non-empty string")),
        };

        let params = match map.remove("params") {
            None | Some(Value::Null) => None,
            Some(Value::Object(named)) => Some(Params::Named(named)),
            Some(Value::Array(positional)) => Some(Params::Positional(positional)),
            Some(_) => {
                return Err(EnvelopeError::new(
                    id,
                    "params must be an object or an array",
                ))
            }
        };

        Ok(Request {
            jsonrpc: Version,
            method,
            params,
            id,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// The closed set of error codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // JSON-RPC 2.0 standard codes
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,

    // Server-defined range (-32000 to -32099)
    ExcelNotFound,
    WorkbookNotFound,
    SheetNotFound,
    RangeError,
    ExcelError,
    PermissionDenied,
    Timeout,
    ChartNotFound,
    ChartTypeError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 14] = [
        ErrorCode::ParseError,
        ErrorCode::InvalidRequest,
        ErrorCode::MethodNotFound,
        ErrorCode::InvalidParams,
        ErrorCode::InternalError,
        ErrorCode::ExcelNotFound,
        ErrorCode::WorkbookNotFound,
        ErrorCode::SheetNotFound,
        ErrorCode::RangeError,
        ErrorCode::ExcelError,
        ErrorCode::PermissionDenied,
        ErrorCode::Timeout,
        ErrorCode::ChartNotFound,
        ErrorCode::ChartTypeError,
    ];

    pub fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ExcelNotFound => -32000,
            ErrorCode::WorkbookNotFound => -32001,
            ErrorCode::SheetNotFound => -32002,
            ErrorCode::RangeError => -32003,
            ErrorCode::ExcelError => -32004,
            ErrorCode::PermissionDenied => -32005,
            ErrorCode::Timeout => -32006,
            ErrorCode::ChartNotFound => -32007,
            ErrorCode::ChartTypeError => -32008,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Message used when an error is raised without one.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ExcelNotFound => "Excel application not found",
            ErrorCode::WorkbookNotFound => "Workbook not found",
            ErrorCode::SheetNotFound => "Sheet not found",
            ErrorCode::RangeError => "Range error",
            ErrorCode::ExcelError => "Excel error",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::Timeout => "Operation timed out",
            ErrorCode::ChartNotFound => "Chart not found",
            ErrorCode::ChartTypeError => "Invalid chart type",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.default_message(), self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        ErrorCode::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown error code {code}")))
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// An error carrying the code's default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            data: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach diagnostic data. Code and message are left untouched.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

/// Exactly one of `result` / `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

/// A response envelope. `id` is serialized as `null` when the request id
/// could not be determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: Version,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub id: Option<Id>,
}

impl Response {
    pub fn success(id: Option<Id>, result: Value) -> Self {
        Self {
            jsonrpc: Version,
            outcome: Outcome::Result(result),
            id,
        }
    }

    pub fn error(id: Option<Id>, error: ErrorObject) -> Self {
        Self {
            jsonrpc: Version,
            outcome: Outcome::Error(error),
            id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}

/// Reference to a worksheet, by 0-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(u32),
    Name(String),
}

/// Reference to a chart on a sheet, by 0-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartRef {
    Index(u32),
    Name(String),
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Index(i) => write!(f, "{i}"),
            SheetRef::Name(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Display for ChartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartRef::Index(i) => write!(f, "{i}"),
            ChartRef::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for SheetRef {
    fn from(s: &str) -> Self {
        SheetRef::Name(s.to_string())
    }
}

impl From<u32> for SheetRef {
    fn from(i: u32) -> Self {
        SheetRef::Index(i)
    }
}

impl From<&str> for ChartRef {
    fn from(s: &str) -> Self {
        ChartRef::Name(s.to_string())
    }
}

impl From<u32> for ChartRef {
    fn from(i: u32) -> Self {
        ChartRef::Index(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_request_with_named_params() {
        let req = Request::from_value(json!({
            "jsonrpc": "2.0",
            "method": "sheet.get",
            "params": {"book": "Book1", "sheet": 0},
            "id": 7
        }))
        .unwrap();

        assert_eq!(req.method, "sheet.get");
        assert_eq!(req.id, Some(Id::Number(7)));
        let params = req.params.unwrap();
        assert_eq!(params.get("book", 0), Some(&json!("Book1")));
        assert_eq!(params.get("missing", 5), None);
    }

    #[test]
    fn test_parse_positional_params() {
        let req = Request::from_value(json!({
            "jsonrpc": "2.0",
            "method": "app.quit",
            "params": [1234, false],
            "id": "q"
        }))
        .unwrap();

        let params = req.params.unwrap();
        assert_eq!(params.get("pid", 0), Some(&json!(1234)));
        assert_eq!(params.get("save_changes", 1), Some(&json!(false)));
        assert_eq!(req.id, Some(Id::from("q")));
    }

    #[test]
    fn test_missing_and_null_id_are_notifications() {
        let missing = Request::from_value(json!({"jsonrpc": "2.0", "method": "app.list"})).unwrap();
        assert!(missing.is_notification());

        let null = Request::from_value(json!({"jsonrpc": "2.0", "method": "app.list", "id": null}))
            .unwrap();
        assert!(null.is_notification());
    }

    #[test]
    fn test_wrong_version_keeps_id() {
        let err = Request::from_value(json!({"jsonrpc": "1.0", "method": "app.list", "id": 3}))
            .unwrap_err();
        assert_eq!(err.id, Some(Id::Number(3)));
    }

    #[test]
    fn test_missing_method_rejected() {
        let err = Request::from_value(json!({"jsonrpc": "2.0", "id": "x"})).unwrap_err();
        assert_eq!(err.id, Some(Id::from("x")));

        let err = Request::from_value(json!({"jsonrpc": "2.0", "method": "", "id": 1})).unwrap_err();
        assert_eq!(err.id, Some(Id::Number(1)));
    }

    #[test]
    fn test_scalar_params_rejected() {
        let err = Request::from_value(json!({
            "jsonrpc": "2.0",
            "method": "app.get",
            "params": "nope",
            "id": 1
        }))
        .unwrap_err();
        assert_eq!(err.id, Some(Id::Number(1)));
    }

    #[test]
    fn test_non_object_rejected_without_id() {
        let err = Request::from_value(json!(42)).unwrap_err();
        assert_eq!(err.id, None);

        let err = Request::from_value(json!({"jsonrpc": "2.0", "method": "a.b", "id": true}))
            .unwrap_err();
        assert_eq!(err.id, None);
    }

    #[test]
    fn test_success_response_shape() {
        let resp = Response::success(Some(Id::Number(1)), json!({"value": [[1, 2]]}));
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"jsonrpc": "2.0", "result": {"value": [[1, 2]]}, "id": 1})
        );
    }

    #[test]
    fn test_error_response_has_null_id() {
        let resp = Response::error(None, ErrorObject::new(ErrorCode::ParseError));
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "error": {"code": -32700, "message": "Parse error"},
                "id": null
            })
        );
    }

    #[test]
    fn test_response_deserializes() {
        let resp: Response = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32007, "message": "Chart not found", "data": {"kind": "not_found"}},
            "id": "c1"
        }))
        .unwrap();

        let error = resp.error_object().unwrap();
        assert_eq!(error.code, ErrorCode::ChartNotFound);
        assert_eq!(resp.id, Some(Id::from("c1")));
        assert!(resp.result().is_none());
    }

    #[test]
    fn test_error_codes_are_unique() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_code(code.code()), Some(code));
            assert!(!code.default_message().is_empty());
        }
        assert_eq!(ErrorCode::from_code(-1), None);
    }

    #[test]
    fn test_sheet_ref_untagged() {
        let by_index: SheetRef = serde_json::from_value(json!(2)).unwrap();
        let by_name: SheetRef = serde_json::from_value(json!("Data")).unwrap();
        assert_eq!(by_index, SheetRef::Index(2));
        assert_eq!(by_name, SheetRef::Name("Data".into()));
    }
}
