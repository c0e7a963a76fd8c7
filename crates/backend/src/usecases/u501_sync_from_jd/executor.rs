use super::freshness::select_stale;
use super::processors::{category, detail, order, price, sku, stock, StepStats};
use crate::domain::{a001_jd_account, a003_jd_sku};
use crate::shared::config::SyncConfig;
use crate::shared::jd_cloud::{Client, Credentials};
use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_jd_account::aggregate::JdAccount;
use contracts::domain::a003_jd_sku::aggregate::SkuFreshnessField;
use contracts::usecases::u501_sync_from_jd::{
    report::SyncReport,
    request::{SyncRequest, SyncTarget},
};
use std::sync::Arc;

/// Executor для UseCase синхронизации данных из JD
pub struct SyncExecutor {
    client: Arc<Client>,
    config: SyncConfig,
}

impl SyncExecutor {
    pub fn new(client: Arc<Client>, config: SyncConfig) -> Self {
        Self { client, config }
    }

    /// Окно свежести для цели синхронизации (часы)
    pub fn fresh_hours(&self, request: &SyncRequest) -> i64 {
        request.fresh_hours.unwrap_or(match request.target {
            SyncTarget::Details => self.config.detail_fresh_hours,
            SyncTarget::Prices => self.config.price_fresh_hours,
            SyncTarget::Stocks => self.config.stock_fresh_hours,
            _ => 0,
        })
    }

    /// Выполнить синхронизацию; ошибки отдельных аккаунтов попадают в отчет
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncReport> {
        let accounts = self.accounts(request).await?;
        Ok(self.run_for_accounts(&accounts, request).await)
    }

    async fn run_for_accounts(&self, accounts: &[JdAccount], request: &SyncRequest) -> SyncReport {
        let mut report = SyncReport::new(request.target);

        tracing::info!(
            "Starting JD sync '{}' for {} account(s)",
            request.target,
            accounts.len()
        );

        for account in accounts {
            let account_id = account.to_string_id();
            report.accounts_total += 1;
            match self.run_for_account(account, request).await {
                Ok(stats) => {
                    tracing::info!(
                        "Account {} synced: fetched={}, inserted={}, updated={}, skipped={}, failed={}",
                        account_id,
                        stats.fetched,
                        stats.inserted,
                        stats.updated,
                        stats.skipped,
                        stats.failed
                    );
                    stats.add_to(&mut report, &account_id);
                    // Дерево категорий общее: хватает первого успешного аккаунта
                    if request.target == SyncTarget::Categories {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Sync '{}' failed for account {}: {}", request.target, account_id, e);
                    report.accounts_failed += 1;
                    report.add_error(Some(account_id), e.to_string());
                }
            }
        }

        report.complete();
        tracing::info!(
            "JD sync '{}' finished: {} of {} account(s) failed, {} error(s)",
            request.target,
            report.accounts_failed,
            report.accounts_total,
            report.errors.len()
        );
        report
    }

    async fn accounts(&self, request: &SyncRequest) -> Result<Vec<JdAccount>> {
        match &request.account_id {
            Some(id) => {
                let account = a001_jd_account::service::get_required(id).await?;
                if !account.is_valid {
                    anyhow::bail!("Account {} is marked invalid, re-authorize it first", id);
                }
                Ok(vec![account])
            }
            None => a001_jd_account::service::list_valid().await,
        }
    }

    async fn run_for_account(&self, account: &JdAccount, request: &SyncRequest) -> Result<StepStats> {
        let now = Utc::now();
        let creds = Credentials::from_account(account, now)?;
        let client = self.client.as_ref();
        let hours = self.fresh_hours(request);

        match request.target {
            SyncTarget::Skus => sku::sync_skus(client, &creds, self.config.sku_page_size).await,
            SyncTarget::Categories => category::sync_categories(client, &creds).await,
            SyncTarget::Orders => order::sync_orders(client, &creds, now).await,
            SyncTarget::Details => {
                let (stale, fresh) =
                    self.stale_skus(&creds, SkuFreshnessField::Detail, hours, request.force).await?;
                let mut stats =
                    detail::sync_details(client, &creds, stale, self.config.detail_batch_size, now)
                        .await?;
                stats.skipped += fresh;
                Ok(stats)
            }
            SyncTarget::Prices => {
                let (stale, fresh) =
                    self.stale_skus(&creds, SkuFreshnessField::Price, hours, request.force).await?;
                let mut stats =
                    price::sync_prices(client, &creds, stale, self.config.price_batch_size, now)
                        .await?;
                stats.skipped += fresh;
                Ok(stats)
            }
            SyncTarget::Stocks => {
                let (stale, fresh) =
                    self.stale_skus(&creds, SkuFreshnessField::Stock, hours, request.force).await?;
                let area = stock::resolve_area(&creds.account_id, self.config.default_area).await?;
                let mut stats = stock::sync_stocks(
                    client,
                    &creds,
                    stale,
                    area,
                    self.config.stock_batch_size,
                    now,
                )
                .await?;
                stats.skipped += fresh;
                Ok(stats)
            }
        }
    }

    async fn stale_skus(
        &self,
        creds: &Credentials,
        field: SkuFreshnessField,
        hours: i64,
        force: bool,
    ) -> Result<(Vec<contracts::domain::a003_jd_sku::aggregate::JdSku>, usize)> {
        let skus = a003_jd_sku::service::list_by_account(&creds.account_id).await?;
        let (stale, fresh) = select_stale(skus, field, Utc::now(), hours, force);
        tracing::info!(
            "{:?}: {} stale SKU(s), {} fresh for account {}",
            field,
            stale.len(),
            fresh,
            creds.account_id
        );
        Ok((stale, fresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_jd_account::service::insert_test_account;
    use crate::domain::a002_jd_category;
    use crate::shared::config::JdConfig;
    use crate::shared::data::db::init_test_database;
    use crate::shared::jd_cloud::api::ware;
    use axum::{routing::post, Form, Json, Router};
    use contracts::domain::a003_jd_sku::aggregate::SkuPrice;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn executor() -> SyncExecutor {
        let client = Client::new(&JdConfig::default()).unwrap();
        SyncExecutor::new(Arc::new(client), SyncConfig::default())
    }

    fn executor_for(url: &str) -> SyncExecutor {
        let client = Client::new(&JdConfig::default()).unwrap().with_api_url(url);
        SyncExecutor::new(Arc::new(client), SyncConfig::default())
    }

    fn request(target: SyncTarget, account: &JdAccount) -> SyncRequest {
        SyncRequest {
            account_id: Some(account.to_string_id()),
            ..SyncRequest::new(target)
        }
    }

    fn sku_entry(sku_id: i64) -> Value {
        json!({"skuId": sku_id, "skuName": format!("SKU {}", sku_id), "skuStatus": 1, "ownerType": 1})
    }

    /// JD router с каталогом из трех SKU на двух страницах и деревом категорий глубже трех уровней
    fn answer(method: &str, params: &Value) -> Value {
        match method {
            ware::METHOD_SKU_LIST => match params["skuListParam"]["pageNo"].as_i64() {
                Some(1) => json!({"entries": [sku_entry(101), sku_entry(102)], "totalPage": 2}),
                Some(2) => json!({"entries": [sku_entry(103)], "totalPage": 2}),
                _ => json!({"entries": [], "totalPage": 2}),
            },
            ware::METHOD_SKU_PRICE => {
                let prices: Vec<Value> = params["skuPriceInfoParam"]["skuIdSet"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|id| json!({"skuId": id, "jdPrice": "9.90", "marketPrice": 12.5}))
                    .collect();
                Value::Array(prices)
            }
            ware::METHOD_CATEGORY_LIST => {
                let parent = params["categoryParam"]["parentId"].as_i64().unwrap_or(0);
                let child = if parent == 0 { 9_100_001 } else { parent + 1 };
                json!([{"categoryId": child, "parentId": parent, "categoryName": format!("Cat {}", child)}])
            }
            other => panic!("unexpected method {}", other),
        }
    }

    async fn fake_jd(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
        let method = form["method"].clone();
        let params: Value = serde_json::from_str(&form["360buy_param_json"]).unwrap();
        let mut root = serde_json::Map::new();
        root.insert(
            format!("{}_responce", method.replace('.', "_")),
            json!({"code": "0", "result": {"success": true, "data": answer(&method, &params)}}),
        );
        Json(Value::Object(root))
    }

    async fn spawn_fake_jd() -> String {
        let app = Router::new().route("/routerjson", post(fake_jd));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/routerjson", addr)
    }

    #[test]
    fn test_fresh_hours_per_target() {
        let ex = executor();
        assert_eq!(ex.fresh_hours(&SyncRequest::new(SyncTarget::Details)), 24);
        assert_eq!(ex.fresh_hours(&SyncRequest::new(SyncTarget::Prices)), 6);
        assert_eq!(ex.fresh_hours(&SyncRequest::new(SyncTarget::Stocks)), 1);

        let mut req = SyncRequest::new(SyncTarget::Prices);
        req.fresh_hours = Some(48);
        assert_eq!(ex.fresh_hours(&req), 48);
    }

    #[tokio::test]
    async fn test_sku_sync_walks_all_pages_then_reports_unchanged() {
        init_test_database().await;
        let account = insert_test_account(24).await;
        let ex = executor_for(&spawn_fake_jd().await);
        let req = request(SyncTarget::Skus, &account);

        let first = ex.run(&req).await.unwrap();
        assert_eq!(first.accounts_total, 1);
        assert_eq!(first.fetched, 3);
        assert_eq!(first.inserted, 3);
        assert!(!first.has_errors());
        assert!(first.completed_at.is_some());

        let second = ex.run(&req).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 3);

        let stored = a003_jd_sku::service::list_by_account(&account.to_string_id())
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_price_sync_skips_fresh_skus() {
        init_test_database().await;
        let account = insert_test_account(24).await;
        let ex = executor_for(&spawn_fake_jd().await);
        ex.run(&request(SyncTarget::Skus, &account)).await.unwrap();

        let account_id = account.to_string_id();
        let mut fresh = a003_jd_sku::service::list_by_account(&account_id)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.sku_id == 101)
            .unwrap();
        fresh.apply_price(
            SkuPrice {
                jd_price: Some(1.0),
                market_price: None,
            },
            Utc::now(),
        );
        a003_jd_sku::service::save_existing(&mut fresh).await.unwrap();

        let report = ex.run(&request(SyncTarget::Prices, &account)).await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);

        let skus = a003_jd_sku::service::list_by_account(&account_id).await.unwrap();
        let price_of = |id: i64| skus.iter().find(|s| s.sku_id == id).unwrap().price.jd_price;
        assert_eq!(price_of(101), Some(1.0));
        assert_eq!(price_of(102), Some(9.9));
        assert_eq!(price_of(103), Some(9.9));
    }

    #[tokio::test]
    async fn test_account_without_token_does_not_stop_others() {
        init_test_database().await;
        let expired = insert_test_account(-1).await;
        let valid = insert_test_account(24).await;
        let ex = executor_for(&spawn_fake_jd().await);

        let report = ex
            .run_for_accounts(&[expired.clone(), valid], &SyncRequest::new(SyncTarget::Skus))
            .await;
        assert_eq!(report.accounts_total, 2);
        assert_eq!(report.accounts_failed, 1);
        assert_eq!(report.inserted, 3);
        assert_eq!(
            report.errors[0].account_id.as_deref(),
            Some(expired.to_string_id().as_str())
        );
    }

    #[tokio::test]
    async fn test_categories_fall_back_to_next_account() {
        init_test_database().await;
        let expired = insert_test_account(-1).await;
        let first_valid = insert_test_account(24).await;
        let second_valid = insert_test_account(24).await;
        let ex = executor_for(&spawn_fake_jd().await);

        let report = ex
            .run_for_accounts(
                &[expired, first_valid, second_valid],
                &SyncRequest::new(SyncTarget::Categories),
            )
            .await;
        assert_eq!(report.accounts_total, 2);
        assert_eq!(report.accounts_failed, 1);
        // обход останавливается на третьем уровне
        assert_eq!(report.fetched, 3);

        let level3 = a002_jd_category::service::list_by_parent(9_100_002).await.unwrap();
        assert_eq!(level3.len(), 1);
        assert_eq!(level3[0].level, 3);
        assert!(a002_jd_category::service::list_by_parent(9_100_003)
            .await
            .unwrap()
            .is_empty());
    }
}
