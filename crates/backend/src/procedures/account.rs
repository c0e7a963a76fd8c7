use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::domain::a001_jd_account::aggregate::{JdAccount, JdAccountDto};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::params::{parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a001_jd_account::service;

/// Аккаунт без секретов и токенов
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub code: String,
    pub description: String,
    pub app_key: String,
    pub is_valid: bool,
    pub has_access_token: bool,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub has_refresh_token: bool,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl From<&JdAccount> for AccountView {
    fn from(a: &JdAccount) -> Self {
        Self {
            id: a.to_string_id(),
            code: a.base.code.clone(),
            description: a.base.description.clone(),
            app_key: a.app_key.clone(),
            is_valid: a.is_valid,
            has_access_token: a.access_token.is_some(),
            access_token_expires_at: a.access_token_expires_at,
            has_refresh_token: a.refresh_token.is_some(),
            refresh_token_expires_at: a.refresh_token_expires_at,
            scope: a.scope.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    valid_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountParams {
    account_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeCodeParams {
    account_id: String,
    code: String,
}

pub struct AccountProcedures;

#[async_trait]
impl ProcedureGroup for AccountProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &[
            "jd.account.list",
            "jd.account.save",
            "jd.account.authorizeUrl",
            "jd.account.exchangeCode",
            "jd.account.refreshToken",
        ]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.account.list" => {
                let p: ListParams = parse(params)?;
                let accounts = if p.valid_only {
                    service::list_valid().await?
                } else {
                    service::list_all().await?
                };
                let views: Vec<AccountView> = accounts.iter().map(AccountView::from).collect();
                to_value(&views)
            }
            "jd.account.save" => {
                let dto: JdAccountDto = parse(params)?;
                let id = service::save(dto).await?.to_string();
                ctx.invalidate(&id);
                Ok(json!({"id": id}))
            }
            "jd.account.authorizeUrl" => {
                let p: AccountParams = parse(params)?;
                let account = ctx.account(&p.account_id).await?;
                // state возвращается в callback и связывает код с аккаунтом
                let url = ctx
                    .oauth
                    .authorize_url(&account.app_key, &account.to_string_id());
                Ok(json!({"url": url}))
            }
            "jd.account.exchangeCode" => {
                let p: ExchangeCodeParams = parse(params)?;
                let mut account = ctx.account(&p.account_id).await?;
                let grant = ctx
                    .oauth
                    .exchange_code(&account.app_key, &account.app_secret, &p.code)
                    .await?;
                service::apply_token(&mut account, &grant, Utc::now()).await?;
                ctx.invalidate(&p.account_id);
                to_value(&AccountView::from(&account))
            }
            "jd.account.refreshToken" => {
                let p: AccountParams = parse(params)?;
                let mut account = ctx.account(&p.account_id).await?;
                if !account.can_refresh(Utc::now()) {
                    return Err(ProcedureError::InvalidParams(
                        "account has no usable refresh token, authorize again".into(),
                    ));
                }
                let refresh_token = account.refresh_token.clone().unwrap_or_default();
                match ctx
                    .oauth
                    .refresh(&account.app_key, &account.app_secret, &refresh_token)
                    .await
                {
                    Ok(grant) => {
                        service::apply_token(&mut account, &grant, Utc::now()).await?;
                        ctx.invalidate(&p.account_id);
                        to_value(&AccountView::from(&account))
                    }
                    Err(e) => {
                        if e.is_refresh_token_invalid() {
                            service::mark_invalid(&mut account).await?;
                        }
                        Err(e.into())
                    }
                }
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_hides_secrets() {
        let mut account = JdAccount::new_for_insert(
            "JD-1".into(),
            "Main shop".into(),
            "KEY".into(),
            "SECRET".into(),
        );
        account.access_token = Some("AT".into());
        let value = serde_json::to_value(AccountView::from(&account)).unwrap();

        assert_eq!(value["appKey"], "KEY");
        assert_eq!(value["hasAccessToken"], true);
        assert!(!value.to_string().contains("SECRET"));
        assert!(!value.to_string().contains("\"AT\""));
    }
}
