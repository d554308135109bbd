//! Request dispatch, batching and payload handling.

use std::sync::Arc;

use excel_rpc_protocol::{ErrorCode, ErrorObject, Id, Request, Response};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};

use crate::mapper::map_error;
use crate::registry::MethodRegistry;
use crate::serialize::serialize;

/// Dispatcher settings.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Attach `data = {"kind", "causes"}` to mapped handler errors.
    pub include_error_details: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            include_error_details: true,
        }
    }
}

/// What the transport should send back for one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
}

impl Reply {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_options(registry, DispatchOptions::default())
    }

    pub fn with_options(registry: MethodRegistry, options: DispatchOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Dispatch one request value.
    ///
    /// Returns `None` only for a notification whose handler succeeded.
    /// Failures always produce a response, notifications included.
    pub async fn dispatch(&self, payload: Value) -> Option<Response> {
        let request = match Request::from_value(payload) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!("Rejecting malformed request: {err}");
                let error =
                    self.protocol_error(ErrorCode::InvalidRequest, json!({"reason": err.reason}));
                return Some(Response::error(err.id, error));
            }
        };

        let Request {
            method, params, id, ..
        } = request;

        let Some(handler) = self.registry.get(&method) else {
            tracing::debug!("Unknown method '{method}'");
            let error =
                self.protocol_error(ErrorCode::MethodNotFound, json!({"method": method}));
            return Some(Response::error(id, error));
        };

        let params = params.filter(|p| !p.is_empty());
        tracing::debug!("Dispatching '{method}' (id: {})", display_id(&id));

        match handler(params).await {
            Ok(value) => id.map(|id| Response::success(Some(id), serialize(&value))),
            Err(err) => {
                tracing::error!("Error executing '{method}': {err}");
                let error = map_error(&err, self.options.include_error_details);
                Some(Response::error(id, error))
            }
        }
    }

    /// Dispatch a batch concurrently.
    ///
    /// Responses come back in request order with notifications dropped. An
    /// empty batch is itself an invalid request.
    pub async fn dispatch_batch(&self, payloads: Vec<Value>) -> Result<Vec<Response>, Response> {
        if payloads.is_empty() {
            let error =
                self.protocol_error(ErrorCode::InvalidRequest, json!({"reason": "empty batch"}));
            return Err(Response::error(None, error));
        }
        let responses = join_all(payloads.into_iter().map(|p| self.dispatch(p))).await;
        Ok(responses.into_iter().flatten().collect())
    }

    /// Protocol errors keep the default message; details go in `data`.
    fn protocol_error(&self, code: ErrorCode, details: Value) -> ErrorObject {
        let error = ErrorObject::new(code);
        if self.options.include_error_details {
            error.with_data(details)
        } else {
            error
        }
    }

    /// Handle a raw request body.
    ///
    /// Returns `None` when there is nothing to send back: a successful
    /// notification, or a batch made only of successful notifications.
    ///
    /// The body is taken as raw bytes: invalid UTF-8 is a parse error like
    /// any other malformed JSON.
    pub async fn handle_payload(&self, body: impl AsRef<[u8]>) -> Option<Reply> {
        let payload: Value = match serde_json::from_slice(body.as_ref()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!("Unparsable request body: {err}");
                return Some(Reply::Single(Response::error(
                    None,
                    ErrorObject::new(ErrorCode::ParseError),
                )));
            }
        };

        match payload {
            Value::Array(items) => match self.dispatch_batch(items).await {
                Ok(responses) if responses.is_empty() => None,
                Ok(responses) => Some(Reply::Batch(responses)),
                Err(invalid) => Some(Reply::Single(invalid)),
            },
            single => self.dispatch(single).await.map(Reply::Single),
        }
    }
}

fn display_id(id: &Option<Id>) -> String {
    id.as_ref()
        .map_or_else(|| "notification".to_string(), ToString::to_string)
}
