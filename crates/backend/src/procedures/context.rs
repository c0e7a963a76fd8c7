use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_jd_account::aggregate::JdAccount;
use contracts::domain::a005_jd_order::aggregate::JdOrder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::registry::ProcedureError;
use crate::domain::{a001_jd_account, a005_jd_order};
use crate::shared::config::{Config, SyncConfig};
use crate::shared::jd_cloud::{Client, Credentials, JdError, OAuthClient, ResponseCache};

/// Общие зависимости процедур
pub struct ProcedureContext {
    pub client: Arc<Client>,
    pub oauth: OAuthClient,
    pub cache: ResponseCache,
    pub sync: SyncConfig,
}

impl ProcedureContext {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Arc::new(Client::new(&config.jd)?),
            oauth: OAuthClient::new(&config.jd)?,
            cache: ResponseCache::new(Duration::from_secs(config.jd.cache_ttl_secs)),
            sync: config.sync.clone(),
        })
    }

    pub async fn account(&self, account_id: &str) -> Result<JdAccount, ProcedureError> {
        a001_jd_account::service::get_required(account_id)
            .await
            .map_err(|e| ProcedureError::InvalidParams(e.to_string()))
    }

    /// Аккаунт и подписанные учетные данные для вызова JD
    pub async fn credentials(
        &self,
        account_id: &str,
    ) -> Result<(JdAccount, Credentials), ProcedureError> {
        let account = self.account(account_id).await?;
        let creds = Credentials::from_account(&account, Utc::now())?;
        Ok((account, creds))
    }

    /// Вызов JD через кэш ответов
    pub async fn cached_call(
        &self,
        creds: &Credentials,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        let key = ResponseCache::key(&creds.account_id, method, &params);
        let client = self.client.clone();
        let value = self
            .cache
            .get_or_fetch(key, || async move { client.execute(creds, method, &params).await })
            .await?;
        Ok(value)
    }

    pub async fn cached_call_as<T: DeserializeOwned>(
        &self,
        creds: &Credentials,
        method: &str,
        params: Value,
    ) -> Result<T, ProcedureError> {
        let value = self.cached_call(creds, method, params).await?;
        serde_json::from_value(value).map_err(|e| ProcedureError::Jd(JdError::Parse(e)))
    }

    /// Локальный заказ аккаунта по номеру JD
    pub async fn order_for(
        &self,
        account_id: &str,
        jd_order_id: i64,
    ) -> Result<JdOrder, ProcedureError> {
        a005_jd_order::service::get_by_jd_order_id(jd_order_id)
            .await?
            .filter(|o| o.account_ref == account_id)
            .ok_or_else(|| {
                ProcedureError::InvalidParams(format!("Order {} not found", jd_order_id))
            })
    }

    /// Сбросить кэш после изменяющего вызова
    pub fn invalidate(&self, account_id: &str) {
        self.cache.invalidate_account(account_id);
    }
}
