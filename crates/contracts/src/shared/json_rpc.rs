//! JSON-RPC 2.0 envelope used by the procedure endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// Ошибка, пришедшая из JD или из бизнес-логики
pub const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// Отсутствует у уведомлений
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// Уведомление это запрос без поля `id`; `"id": null` ждет ответа.
/// Проверяется по сырому JSON: после разбора в `Option` эти случаи неразличимы.
pub fn is_notification(raw: &Value) -> bool {
    raw.as_object().is_some_and(|o| !o.contains_key("id"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, "Parse error").with_data(Value::String(detail.into()))
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request").with_data(Value::String(detail.into()))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, "Invalid params").with_data(Value::String(detail.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_detection() {
        let raw = json!({"jsonrpc": "2.0", "method": "jd.sku.list"});
        assert!(is_notification(&raw));
        let req: JsonRpcRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.params, Value::Null);
    }

    #[test]
    fn test_null_id_is_not_notification() {
        let raw = json!({"jsonrpc": "2.0", "method": "jd.sku.list", "id": null});
        assert!(!is_notification(&raw));
        assert!(!is_notification(&json!({"jsonrpc": "2.0", "method": "x", "id": 7})));
    }

    #[test]
    fn test_failure_omits_result() {
        let resp = JsonRpcResponse::failure(json!(1), JsonRpcError::method_not_found("x"));
        let value = serde_json::to_value(resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
    }
}
