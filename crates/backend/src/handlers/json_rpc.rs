use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::shared::json_rpc::{
    is_notification, JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};
use serde_json::Value;
use std::sync::Arc;

use crate::procedures::{ProcedureContext, Registry};

/// Состояние JSON-RPC эндпоинта
pub struct RpcState {
    pub registry: Registry,
    pub ctx: ProcedureContext,
}

/// POST /json-rpc
///
/// Тело читается как строка: ошибка разбора JSON должна вернуться
/// ответом -32700, а не отказом экстрактора.
pub async fn handle(State(state): State<Arc<RpcState>>, body: String) -> Response {
    let payload: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("JSON-RPC parse error: {}", e);
            return Json(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::parse_error(e.to_string()),
            ))
            .into_response();
        }
    };

    match payload {
        Value::Array(items) if items.is_empty() => Json(JsonRpcResponse::failure(
            Value::Null,
            JsonRpcError::invalid_request("empty batch"),
        ))
        .into_response(),
        Value::Array(items) => {
            let mut responses = Vec::with_capacity(items.len());
            for item in items {
                if let Some(response) = process_one(&state, item).await {
                    responses.push(response);
                }
            }
            if responses.is_empty() {
                StatusCode::NO_CONTENT.into_response()
            } else {
                Json(responses).into_response()
            }
        }
        single => match process_one(&state, single).await {
            Some(response) => Json(response).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
    }
}

/// Выполнить один запрос; для уведомлений ответа нет
async fn process_one(state: &RpcState, item: Value) -> Option<JsonRpcResponse> {
    let notification = is_notification(&item);
    let id_hint = item.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(item) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::failure(
                id_hint,
                JsonRpcError::invalid_request(e.to_string()),
            ))
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(JsonRpcResponse::failure(
            id_hint,
            JsonRpcError::invalid_request(format!(
                "unsupported jsonrpc version {:?}",
                request.jsonrpc
            )),
        ));
    }

    let result = state
        .registry
        .dispatch(&state.ctx, &request.method, request.params)
        .await;

    if let Err(e) = &result {
        tracing::warn!("JSON-RPC {} failed: {}", request.method, e);
    }
    if notification {
        return None;
    }
    Some(match result {
        Ok(value) => JsonRpcResponse::success(id_hint, value),
        Err(e) => JsonRpcResponse::failure(id_hint, e.to_rpc_error()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedures::registry::tests::test_context;
    use crate::procedures::{ProcedureError, ProcedureGroup};
    use async_trait::async_trait;
    use contracts::shared::json_rpc::{INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use serde_json::json;

    struct MathProcedures;

    #[async_trait]
    impl ProcedureGroup for MathProcedures {
        fn methods(&self) -> &'static [&'static str] {
            &["math.sum"]
        }

        async fn call(
            &self,
            _ctx: &ProcedureContext,
            _method: &str,
            params: Value,
        ) -> Result<Value, ProcedureError> {
            let values: Vec<i64> = crate::procedures::params::parse(params)?;
            Ok(json!(values.iter().sum::<i64>()))
        }
    }

    async fn spawn_server() -> String {
        let mut registry = Registry::new();
        registry.register(MathProcedures);
        let state = Arc::new(RpcState {
            registry,
            ctx: test_context(),
        });
        let app = crate::routes::configure_routes(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post(url: &str, body: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/json-rpc", url))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_single_call() {
        let url = spawn_server().await;
        let resp: Value = post(&url, r#"{"jsonrpc":"2.0","method":"math.sum","params":[1,2,3],"id":7}"#)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(resp, json!({"jsonrpc": "2.0", "result": 6, "id": 7}));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let url = spawn_server().await;

        let resp: Value = post(&url, "{not json").await.json().await.unwrap();
        assert_eq!(resp["error"]["code"], PARSE_ERROR);
        assert_eq!(resp["id"], Value::Null);

        let resp: Value = post(&url, r#"{"jsonrpc":"1.0","method":"math.sum","id":1}"#)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(resp["error"]["code"], INVALID_REQUEST);
        assert_eq!(resp["id"], 1);

        let resp: Value = post(&url, r#"{"jsonrpc":"2.0","method":"nope","id":"a"}"#)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(resp["error"]["code"], METHOD_NOT_FOUND);

        let resp: Value = post(&url, "[]").await.json().await.unwrap();
        assert_eq!(resp["error"]["code"], INVALID_REQUEST);

        let resp: Value = post(&url, r#"{"jsonrpc":"2.0","method":"math.sum","params":[2],"id":null}"#)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(resp["result"], 2);
        assert_eq!(resp["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_batch_skips_notifications() {
        let url = spawn_server().await;
        let body = r#"[
            {"jsonrpc":"2.0","method":"math.sum","params":[1,1],"id":1},
            {"jsonrpc":"2.0","method":"math.sum","params":[5]},
            {"jsonrpc":"2.0","method":"math.sum","params":"bad","id":2}
        ]"#;
        let resp: Vec<Value> = post(&url, body).await.json().await.unwrap();
        assert_eq!(resp.len(), 2);
        assert_eq!(resp[0]["result"], 2);
        assert_eq!(resp[1]["error"]["code"], -32602);

        let only_notifications = r#"[{"jsonrpc":"2.0","method":"math.sum","params":[1]}]"#;
        assert_eq!(post(&url, only_notifications).await.status(), 204);
    }

    #[tokio::test]
    async fn test_health() {
        let url = spawn_server().await;
        let body = reqwest::get(format!("{}/health", url))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
