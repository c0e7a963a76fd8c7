use crate::domain::a001_jd_account;
use crate::shared::jd_cloud::OAuthClient;
use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a001_jd_account::aggregate::JdAccount;
use contracts::usecases::u502_refresh_tokens::RefreshTokensReport;

/// Нужно ли обновлять access token аккаунта
pub fn needs_refresh(account: &JdAccount, now: DateTime<Utc>, hours: i64, force: bool) -> bool {
    force || account.access_token_expires_within(now, hours)
}

/// Обновление OAuth-токенов всех валидных аккаунтов
pub struct RefreshTokensExecutor {
    oauth: OAuthClient,
    refresh_before_hours: i64,
}

impl RefreshTokensExecutor {
    pub fn new(oauth: OAuthClient, refresh_before_hours: i64) -> Self {
        Self {
            oauth,
            refresh_before_hours,
        }
    }

    pub async fn run(&self, force: bool) -> Result<RefreshTokensReport> {
        let accounts = a001_jd_account::service::list_valid().await?;
        Ok(self.refresh_accounts(accounts, force).await)
    }

    /// Ошибка одного аккаунта (JD или БД) попадает в отчет, остальные обрабатываются
    async fn refresh_accounts(&self, accounts: Vec<JdAccount>, force: bool) -> RefreshTokensReport {
        let mut report = RefreshTokensReport {
            accounts_total: accounts.len(),
            ..Default::default()
        };
        let now = Utc::now();

        for mut account in accounts {
            let name = account.base.description.clone();

            if !needs_refresh(&account, now, self.refresh_before_hours, force) {
                report.skipped += 1;
                continue;
            }
            if !account.can_refresh(now) {
                tracing::warn!("Account {} has no usable refresh token", name);
                report.skipped += 1;
                report
                    .errors
                    .push(format!("{}: refresh token missing or expired, re-authorize", name));
                continue;
            }

            let refresh_token = account.refresh_token.clone().unwrap_or_default();
            match self
                .oauth
                .refresh(&account.app_key, &account.app_secret, &refresh_token)
                .await
            {
                Ok(grant) => {
                    match a001_jd_account::service::apply_token(&mut account, &grant, Utc::now())
                        .await
                    {
                        Ok(()) => report.refreshed += 1,
                        Err(e) => {
                            tracing::error!("Failed to store token of account {}: {}", name, e);
                            report.failed += 1;
                            report.errors.push(format!("{}: {}", name, e));
                        }
                    }
                }
                Err(e) if e.is_refresh_token_invalid() => {
                    tracing::error!("Refresh token of account {} revoked: {}", name, e);
                    report.errors.push(format!("{}: {}", name, e));
                    match a001_jd_account::service::mark_invalid(&mut account).await {
                        Ok(()) => report.invalidated += 1,
                        Err(e) => {
                            tracing::error!("Failed to invalidate account {}: {}", name, e);
                            report.failed += 1;
                            report.errors.push(format!("{}: {}", name, e));
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Token refresh failed for account {}: {}", name, e);
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", name, e));
                }
            }
        }

        tracing::info!(
            "Token refresh done: {} refreshed, {} skipped, {} failed, {} invalidated",
            report.refreshed,
            report.skipped,
            report.failed,
            report.invalidated
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::JdConfig;
    use crate::shared::data::db::init_test_database;
    use axum::{routing::get, Json, Router};
    use chrono::Duration;
    use serde_json::json;

    fn account(expires_in_hours: Option<i64>) -> JdAccount {
        let now = Utc::now();
        let mut account = JdAccount::new_for_insert(
            "JD-test".into(),
            "Test shop".into(),
            "KEY".into(),
            "SECRET".into(),
        );
        if let Some(hours) = expires_in_hours {
            account.access_token = Some("AT".into());
            account.access_token_expires_at = Some(now + Duration::hours(hours));
        }
        account
    }

    #[test]
    fn test_needs_refresh() {
        let now = Utc::now();
        assert!(needs_refresh(&account(None), now, 2, false));
        assert!(needs_refresh(&account(Some(1)), now, 2, false));
        assert!(!needs_refresh(&account(Some(20)), now, 2, false));
        assert!(needs_refresh(&account(Some(20)), now, 2, true));
    }

    async fn spawn_token_server() -> String {
        let app = Router::new().route(
            "/oauth2/refresh_token",
            get(|| async {
                Json(json!({
                    "code": 0,
                    "access_token": "AT-NEW",
                    "expires_in": 86399,
                    "refresh_token": "RT-NEW",
                    "refresh_expires_in": 2592000
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_other_accounts() {
        init_test_database().await;
        let url = spawn_token_server().await;
        let oauth = OAuthClient::new(&JdConfig::default())
            .unwrap()
            .with_oauth_url(url);
        let executor = RefreshTokensExecutor::new(oauth, 2);

        // Аккаунт, которого нет в БД: сохранить токен не получится
        let mut missing = account(Some(1));
        missing.refresh_token = Some("RT".into());
        let stored = a001_jd_account::service::insert_test_account(1).await;
        let stored_id = stored.base.id.value();

        let report = executor.refresh_accounts(vec![missing, stored], false).await;

        assert_eq!(report.accounts_total, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.errors.len(), 1);
        let reloaded = a001_jd_account::service::get_by_id(stored_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.access_token.as_deref(), Some("AT-NEW"));
    }
}
