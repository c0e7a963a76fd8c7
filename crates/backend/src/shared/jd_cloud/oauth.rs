use contracts::domain::a001_jd_account::aggregate::TokenGrant;
use serde::Deserialize;
use std::time::Duration;

use super::error::JdError;
use crate::shared::config::JdConfig;

/// Коды OAuth-сервера, означающие, что refresh token больше не действует
const INVALID_REFRESH_CODES: &[&str] = &["403", "405", "406"];

/// Ответ `/oauth2/access_token` и `/oauth2/refresh_token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub open_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Время выдачи, мс
    #[serde(default)]
    pub time: Option<i64>,
}

impl TokenResponse {
    fn code_string(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        }
    }

    pub fn into_grant(self) -> Result<TokenGrant, JdError> {
        let code = self.code_string();
        let access_token = match self.access_token {
            Some(token) if code == "0" && !token.is_empty() => token,
            _ => {
                return Err(JdError::OAuth {
                    code,
                    message: self.msg.unwrap_or_else(|| "access_token missing".into()),
                })
            }
        };
        Ok(TokenGrant {
            access_token,
            expires_in: self.expires_in.unwrap_or(86_400),
            refresh_token: self.refresh_token,
            refresh_expires_in: self.refresh_expires_in,
            scope: self.scope,
            open_id: self.open_id,
            uid: self.uid,
        })
    }
}

impl JdError {
    pub fn is_refresh_token_invalid(&self) -> bool {
        matches!(self, Self::OAuth { code, .. } if INVALID_REFRESH_CODES.contains(&code.as_str()))
    }
}

/// Клиент OAuth-сервера JD (авторизация кода и обновление токенов)
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    oauth_url: String,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn new(config: &JdConfig) -> Result<Self, JdError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            oauth_url: config.oauth_url.trim_end_matches('/').to_string(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    pub fn with_oauth_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL страницы согласия, куда отправляется владелец магазина
    pub fn authorize_url(&self, app_key: &str, state: &str) -> String {
        format!(
            "{}/oauth2/to_login?app_key={}&response_type=code&redirect_uri={}&state={}&scope=snsapi_base",
            self.oauth_url,
            urlencoding::encode(app_key),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
        )
    }

    pub async fn exchange_code(
        &self,
        app_key: &str,
        app_secret: &str,
        code: &str,
    ) -> Result<TokenGrant, JdError> {
        let url = format!("{}/oauth2/access_token", self.oauth_url);
        let query = [
            ("app_key", app_key),
            ("app_secret", app_secret),
            ("grant_type", "authorization_code"),
            ("code", code),
        ];
        self.request_token(&url, &query).await
    }

    pub async fn refresh(
        &self,
        app_key: &str,
        app_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, JdError> {
        let url = format!("{}/oauth2/refresh_token", self.oauth_url);
        let query = [
            ("app_key", app_key),
            ("app_secret", app_secret),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_token(&url, &query).await
    }

    async fn request_token(&self, url: &str, query: &[(&str, &str)]) -> Result<TokenGrant, JdError> {
        let body = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .text()
            .await?;
        let response: TokenResponse = serde_json::from_str(&body)?;
        response.into_grant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn oauth(url: &str) -> OAuthClient {
        let config = JdConfig {
            redirect_uri: "https://shop.example.com/jd/callback".into(),
            ..JdConfig::default()
        };
        OAuthClient::new(&config).unwrap().with_oauth_url(url)
    }

    #[test]
    fn test_authorize_url_is_encoded() {
        let url = oauth("https://open-oauth.jd.com/").authorize_url("KEY", "acc 1");
        assert_eq!(
            url,
            "https://open-oauth.jd.com/oauth2/to_login?app_key=KEY&response_type=code\
             &redirect_uri=https%3A%2F%2Fshop.example.com%2Fjd%2Fcallback&state=acc%201&scope=snsapi_base"
        );
    }

    #[test]
    fn test_error_response_becomes_oauth_error() {
        let resp: TokenResponse =
            serde_json::from_value(json!({"code": 405, "msg": "refresh_token expired"})).unwrap();
        let err = resp.into_grant().unwrap_err();
        assert!(err.is_refresh_token_invalid());
        assert_eq!(err.to_string(), "JD OAuth error 405: refresh_token expired");
    }

    async fn fake_token(Query(q): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        match q.get("grant_type").map(String::as_str) {
            Some("authorization_code") if q.get("code").map(String::as_str) == Some("good") => {
                Json(json!({
                    "code": 0,
                    "access_token": "AT-1",
                    "expires_in": 86399,
                    "refresh_token": "RT-1",
                    "scope": "snsapi_base",
                    "open_id": "OPEN",
                    "uid": "UID",
                    "token_type": "bearer",
                    "time": 1700000000000i64
                }))
            }
            Some("refresh_token") => Json(json!({"code": 405, "msg": "refresh_token invalid"})),
            _ => Json(json!({"code": 402, "msg": "invalid code"})),
        }
    }

    async fn spawn_fake_oauth() -> String {
        let app = Router::new()
            .route("/oauth2/access_token", get(fake_token))
            .route("/oauth2/refresh_token", get(fake_token));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let url = spawn_fake_oauth().await;
        let grant = oauth(&url).exchange_code("KEY", "SECRET", "good").await.unwrap();
        assert_eq!(grant.access_token, "AT-1");
        assert_eq!(grant.expires_in, 86399);
        assert_eq!(grant.refresh_token.as_deref(), Some("RT-1"));

        let err = oauth(&url).exchange_code("KEY", "SECRET", "bad").await.unwrap_err();
        assert!(matches!(err, JdError::OAuth { .. }));
        assert!(!err.is_refresh_token_invalid());
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let url = spawn_fake_oauth().await;
        let err = oauth(&url).refresh("KEY", "SECRET", "RT-1").await.unwrap_err();
        assert!(err.is_refresh_token_invalid());
    }
}
