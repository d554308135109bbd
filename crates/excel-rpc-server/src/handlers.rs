//! HTTP request handlers.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// POST /rpc
///
/// The body is handed to the dispatcher as raw bytes, so malformed JSON and
/// invalid UTF-8 still get a JSON-RPC parse error instead of an HTTP
/// rejection.
pub async fn rpc(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(reply) = state.dispatcher().handle_payload(body).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match reply.to_json() {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode reply: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /health
pub async fn health() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "status": "ok" }).to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_rpc::{methods, Automation, Dispatcher, MemoryHost, MethodContext};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn state() -> State<Arc<AppState>> {
        let automation = Automation::start(|| Ok(MemoryHost::with_workbook())).unwrap();
        let dispatcher = Dispatcher::new(methods::registry(automation, MethodContext::default()));
        State(Arc::new(AppState::new(dispatcher)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rpc_single_request() {
        let body = r#"{"jsonrpc":"2.0","method":"book.list","id":1}"#;
        let response = rpc(state(), Bytes::from(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["id"], json!(1));
        assert_eq!(json["result"][0]["name"], json!("Book1"));
    }

    #[tokio::test]
    async fn test_rpc_notification_has_no_body() {
        let body = r#"{"jsonrpc":"2.0","method":"book.list"}"#;
        let response = rpc(state(), Bytes::from(body)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_rpc_parse_error() {
        let response = rpc(state(), Bytes::from_static(b"{not json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "jsonrpc": "2.0",
                "error": {"code": -32700, "message": "Parse error"},
                "id": null
            })
        );
    }

    #[tokio::test]
    async fn test_rpc_batch() {
        let body = r#"[
            {"jsonrpc":"2.0","method":"app.get_calculation","id":"a"},
            {"jsonrpc":"2.0","method":"nope","id":"b"}
        ]"#;
        let json = body_json(rpc(state(), Bytes::from(body)).await).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], json!("a"));
        assert_eq!(items[1]["error"]["code"], json!(-32601));
    }

    #[tokio::test]
    async fn test_rpc_invalid_utf8_body() {
        let response = rpc(state(), Bytes::from_static(b"{\xff\xfe}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], json!(-32700));
        assert_eq!(json["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }
}
