use chrono::{DateTime, Utc};
use contracts::domain::a001_jd_account::aggregate::JdAccount;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::JdError;
use super::sign;
use crate::shared::config::JdConfig;

/// Ключи приложения и токен, которыми подписывается вызов
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_id: String,
    pub app_key: String,
    pub app_secret: String,
    pub access_token: Option<String>,
}

impl Credentials {
    /// Учетные данные аккаунта; без действующего токена `Unauthorized`
    pub fn from_account(account: &JdAccount, now: DateTime<Utc>) -> Result<Self, JdError> {
        let token = account
            .usable_access_token(now)
            .ok_or_else(|| JdError::Unauthorized {
                account: account.to_string_id(),
            })?;
        Ok(Self {
            account_id: account.to_string_id(),
            app_key: account.app_key.clone(),
            app_secret: account.app_secret.clone(),
            access_token: Some(token.to_string()),
        })
    }
}

/// HTTP-клиент JD router API
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    api_version: String,
}

impl Client {
    pub fn new(config: &JdConfig) -> Result<Self, JdError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_version: config.api_version.clone(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Системные параметры + подпись
    pub fn build_params(
        &self,
        credentials: &Credentials,
        method: &str,
        business_params: &Value,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, String>, JdError> {
        let mut params = BTreeMap::new();
        params.insert("method".to_string(), method.to_string());
        params.insert("app_key".to_string(), credentials.app_key.clone());
        if let Some(token) = &credentials.access_token {
            params.insert("access_token".to_string(), token.clone());
        }
        params.insert("timestamp".to_string(), sign::timestamp(now));
        params.insert("format".to_string(), "json".to_string());
        params.insert("v".to_string(), self.api_version.clone());
        params.insert("sign_method".to_string(), "md5".to_string());
        let business_json = match business_params {
            Value::Null => "{}".to_string(),
            other => serde_json::to_string(other)?,
        };
        params.insert("360buy_param_json".to_string(), business_json);

        let signature = sign::sign(&credentials.app_secret, &params);
        params.insert("sign".to_string(), signature);
        Ok(params)
    }

    /// Вызвать метод и вернуть полезную нагрузку ответа
    pub async fn execute(
        &self,
        credentials: &Credentials,
        method: &str,
        business_params: &Value,
    ) -> Result<Value, JdError> {
        let params = self.build_params(credentials, method, business_params, Utc::now())?;

        tracing::debug!(
            "JD call {} (account {}) params={}",
            method,
            credentials.account_id,
            params.get("360buy_param_json").map(String::as_str).unwrap_or("")
        );

        let response = self.http.post(&self.api_url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("JD call {} returned HTTP {}: {}", method, status, body);
            return Err(JdError::Api {
                code: status.as_u16().to_string(),
                message: truncate(&body, 500),
            });
        }

        parse_response(method, &body)
    }

    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        method: &str,
        business_params: &Value,
    ) -> Result<T, JdError> {
        let value = self.execute(credentials, method, business_params).await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| value_as_string(obj.get(*k)))
}

/// Разобрать ответ router API.
///
/// ```text
/// {"error_response": {"code": "19", "zh_desc": "...", "en_desc": "..."}}
/// {"jingdong_x_y_responce": {"code": "0", "result": {"success": true, "data": {...}}}}
/// ```
pub fn parse_response(method: &str, body: &str) -> Result<Value, JdError> {
    let root: Value = serde_json::from_str(body)?;

    if let Some(err) = root.get("error_response") {
        return Err(JdError::Api {
            code: first_string(err, &["code"]).unwrap_or_default(),
            message: first_string(err, &["zh_desc", "en_desc", "msg"])
                .unwrap_or_else(|| err.to_string()),
        });
    }

    let key_base = method.replace('.', "_");
    let envelope = [format!("{}_responce", key_base), format!("{}_response", key_base)]
        .iter()
        .find_map(|k| root.get(k))
        .or_else(|| {
            root.as_object().and_then(|obj| {
                obj.iter()
                    .find(|(k, _)| k.ends_with("_responce") || k.ends_with("_response"))
                    .map(|(_, v)| v)
            })
        })
        .ok_or_else(|| JdError::MissingResponse {
            method: method.to_string(),
        })?;

    if let Some(code) = value_as_string(envelope.get("code")) {
        if code != "0" {
            return Err(JdError::Api {
                code,
                message: first_string(envelope, &["zh_desc", "en_desc", "msg"])
                    .unwrap_or_default(),
            });
        }
    }

    let result = match envelope.get("result").or_else(|| envelope.get("returnType")) {
        Some(Value::String(s)) => serde_json::from_str(s)?,
        Some(other) => other.clone(),
        None => {
            let mut obj = envelope.clone();
            if let Some(map) = obj.as_object_mut() {
                map.remove("code");
            }
            obj
        }
    };

    if result.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(JdError::Business {
            code: first_string(&result, &["errCode", "resultCode", "code"]).unwrap_or_default(),
            message: first_string(&result, &["errMsg", "resultMessage", "message"])
                .unwrap_or_default(),
        });
    }

    Ok(match result.get("data") {
        Some(data) => data.clone(),
        None => result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Form, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn credentials() -> Credentials {
        Credentials {
            account_id: "acc-1".into(),
            app_key: "KEY".into(),
            app_secret: "SECRET".into(),
            access_token: Some("TOKEN".into()),
        }
    }

    fn client(url: &str) -> Client {
        Client::new(&JdConfig::default()).unwrap().with_api_url(url)
    }

    #[test]
    fn test_parse_unwraps_result_data() {
        let body = r#"{"jingdong_ctp_ware_price_getSkuPriceInfoList_responce":
            {"code":"0","result":{"success":true,"errCode":0,"data":[{"skuId":1,"jdPrice":9.9}]}}}"#;
        let value = parse_response("jingdong.ctp.ware.price.getSkuPriceInfoList", body).unwrap();
        assert_eq!(value, json!([{"skuId": 1, "jdPrice": 9.9}]));
    }

    #[test]
    fn test_parse_string_result() {
        let body = r#"{"jingdong_a_b_response":{"code":"0","result":"{\"success\":true,\"data\":{\"x\":1}}"}}"#;
        assert_eq!(parse_response("jingdong.a.b", body).unwrap(), json!({"x": 1}));
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"error_response":{"code":"19","zh_desc":"token无效","en_desc":"Invalid access_token"}}"#;
        match parse_response("jingdong.a.b", body) {
            Err(JdError::Api { code, message }) => {
                assert_eq!(code, "19");
                assert_eq!(message, "token无效");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_business_failure() {
        let body = r#"{"jingdong_a_b_responce":{"code":"0","result":{"success":false,"errCode":3008,"errMsg":"sku not found"}}}"#;
        match parse_response("jingdong.a.b", body) {
            Err(JdError::Business { code, message }) => {
                assert_eq!(code, "3008");
                assert_eq!(message, "sku not found");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_envelope() {
        assert!(matches!(
            parse_response("jingdong.a.b", r#"{"other":{}}"#),
            Err(JdError::MissingResponse { .. })
        ));
    }

    #[test]
    fn test_build_params_signs_all_system_params() {
        let c = client("http://unused");
        let params = c
            .build_params(&credentials(), "jingdong.a.b", &json!({"skuId": 5}), Utc::now())
            .unwrap();
        assert_eq!(params["360buy_param_json"], r#"{"skuId":5}"#);
        assert_eq!(params["sign_method"], "md5");

        let mut unsigned = params.clone();
        let signature = unsigned.remove("sign").unwrap();
        assert_eq!(signature, sign::sign("SECRET", &unsigned));
    }

    /// Фейковый router: проверяет подпись и отвечает конвертом JOS
    async fn fake_router(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
        let mut params: BTreeMap<String, String> = form.into_iter().collect();
        let received = params.remove("sign").unwrap_or_default();
        if received != sign::sign("SECRET", &params) {
            return Json(json!({"error_response": {"code": "25", "zh_desc": "签名无效"}}));
        }
        let method = params["method"].replace('.', "_");
        let payload: Value = serde_json::from_str(&params["360buy_param_json"]).unwrap();
        let mut root = serde_json::Map::new();
        root.insert(
            format!("{}_responce", method),
            json!({
                "code": "0",
                "result": {"success": true, "data": {"echo": payload}}
            }),
        );
        Json(Value::Object(root))
    }

    async fn spawn_fake_router() -> String {
        let app = Router::new().route("/routerjson", post(fake_router));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/routerjson", addr)
    }

    #[tokio::test]
    async fn test_execute_against_fake_router() {
        let url = spawn_fake_router().await;
        let value = client(&url)
            .execute(&credentials(), "jingdong.ctp.test.echo", &json!({"pageNo": 2}))
            .await
            .unwrap();
        assert_eq!(value, json!({"echo": {"pageNo": 2}}));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let url = spawn_fake_router().await;
        let mut creds = credentials();
        creds.app_secret = "WRONG".into();
        let err = client(&url)
            .execute(&creds, "jingdong.ctp.test.echo", &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, JdError::Api { ref code, .. } if code == "25"));
    }
}
