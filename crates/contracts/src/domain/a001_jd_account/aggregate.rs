use crate::domain::common::{AggregateId, BaseAggregate};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdAccountId);

// ============================================================================
// Aggregate Root
// ============================================================================

/// Учетная запись JD Cloud Trade: ключи приложения и OAuth-токены
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdAccount {
    #[serde(flatten)]
    pub base: BaseAggregate<JdAccountId>,

    pub app_key: String,

    /// Секрет приложения никогда не отдается наружу
    #[serde(skip_serializing, default)]
    pub app_secret: String,

    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,

    pub scope: Option<String>,
    pub open_id: Option<String>,
    pub uid: Option<String>,

    /// Аккаунт участвует в синхронизации и обслуживает процедуры
    pub is_valid: bool,
}

impl JdAccount {
    pub fn new_for_insert(
        code: String,
        description: String,
        app_key: String,
        app_secret: String,
    ) -> Self {
        Self {
            base: BaseAggregate::new(JdAccountId::new_v4(), code, description),
            app_key,
            app_secret,
            access_token: None,
            access_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            scope: None,
            open_id: None,
            uid: None,
            is_valid: true,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn update(&mut self, dto: &JdAccountDto) {
        if let Some(code) = &dto.code {
            self.base.code = code.clone();
        }
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        self.app_key = dto.app_key.clone();
        // Пустой секрет в DTO означает "не менять"
        if let Some(secret) = dto.app_secret.as_ref().filter(|s| !s.is_empty()) {
            self.app_secret = secret.clone();
        }
        self.is_valid = dto.is_valid;
    }

    /// Применить результат обмена/обновления OAuth-токена
    pub fn apply_token(&mut self, token: &TokenGrant, now: DateTime<Utc>) {
        self.access_token = Some(token.access_token.clone());
        self.access_token_expires_at = Some(now + Duration::seconds(token.expires_in));
        if let Some(refresh) = token.refresh_token.as_ref().filter(|s| !s.is_empty()) {
            self.refresh_token = Some(refresh.clone());
            self.refresh_token_expires_at = token
                .refresh_expires_in
                .map(|secs| now + Duration::seconds(secs));
        }
        if token.scope.is_some() {
            self.scope = token.scope.clone();
        }
        if token.open_id.is_some() {
            self.open_id = token.open_id.clone();
        }
        if token.uid.is_some() {
            self.uid = token.uid.clone();
        }
        self.is_valid = true;
    }

    /// Действующий access token (не истек на момент `now`)
    pub fn usable_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        match self.access_token_expires_at {
            Some(expires_at) if expires_at <= now => None,
            _ => Some(token),
        }
    }

    /// Токен истекает в ближайшие `hours` часов (или уже истек / отсутствует)
    pub fn access_token_expires_within(&self, now: DateTime<Utc>, hours: i64) -> bool {
        match (&self.access_token, self.access_token_expires_at) {
            (Some(_), Some(expires_at)) => expires_at <= now + Duration::hours(hours),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        let has_token = self
            .refresh_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        let not_expired = self
            .refresh_token_expires_at
            .map(|at| at > now)
            .unwrap_or(true);
        has_token && not_expired
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Description must not be empty".into());
        }
        if self.app_key.trim().is_empty() {
            return Err("AppKey is required".into());
        }
        if self.app_secret.trim().is_empty() {
            return Err("AppSecret is required".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

/// Выданный JD токен, в форме, не зависящей от транспорта
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Время жизни access token в секундах
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub refresh_expires_in: Option<i64>,
    pub scope: Option<String>,
    pub open_id: Option<String>,
    pub uid: Option<String>,
}

// ============================================================================
// DTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdAccountDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub description: String,
    pub comment: Option<String>,
    pub app_key: String,
    pub app_secret: Option<String>,
    #[serde(default = "default_true")]
    pub is_valid: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> JdAccount {
        JdAccount::new_for_insert(
            "JD-1".into(),
            "Main shop".into(),
            "APPKEY".into(),
            "SECRET".into(),
        )
    }

    fn grant(expires_in: i64) -> TokenGrant {
        TokenGrant {
            access_token: "token-1".into(),
            expires_in,
            refresh_token: Some("refresh-1".into()),
            refresh_expires_in: Some(3600 * 24 * 30),
            scope: Some("snsapi_base".into()),
            open_id: Some("open-1".into()),
            uid: None,
        }
    }

    #[test]
    fn test_apply_token_sets_expiry() {
        let now = Utc::now();
        let mut acc = account();
        acc.apply_token(&grant(3600), now);

        assert_eq!(acc.usable_access_token(now), Some("token-1"));
        assert_eq!(acc.access_token_expires_at, Some(now + Duration::seconds(3600)));
        assert!(acc.can_refresh(now));
        assert_eq!(acc.open_id.as_deref(), Some("open-1"));
    }

    #[test]
    fn test_expired_token_is_not_usable() {
        let now = Utc::now();
        let mut acc = account();
        acc.apply_token(&grant(60), now - Duration::hours(1));

        assert_eq!(acc.usable_access_token(now), None);
        assert!(acc.access_token_expires_within(now, 2));
    }

    #[test]
    fn test_expires_within_window() {
        let now = Utc::now();
        let mut acc = account();
        assert!(acc.access_token_expires_within(now, 2));

        acc.apply_token(&grant(3600 * 24), now);
        assert!(!acc.access_token_expires_within(now, 2));
        assert!(acc.access_token_expires_within(now, 25));
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_value(account()).unwrap();
        assert!(json.get("appSecret").is_none());
        assert_eq!(json["appKey"], "APPKEY");
    }

    #[test]
    fn test_validate_requires_keys() {
        let mut acc = account();
        assert!(acc.validate().is_ok());
        acc.app_secret.clear();
        assert_eq!(acc.validate().unwrap_err(), "AppSecret is required");
    }
}
