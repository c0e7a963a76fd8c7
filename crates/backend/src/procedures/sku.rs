use async_trait::async_trait;
use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::{check_sku_ids, parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a003_jd_sku::service;
use crate::shared::jd_cloud::api::ware;
use crate::usecases::u501_sync_from_jd::processors::stock::resolve_area;

const MAX_LIST_LIMIT: u64 = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    account_id: String,
    search: Option<String>,
    #[serde(default = "default_limit")]
    limit: u64,
    #[serde(default)]
    offset: u64,
}

fn default_limit() -> u64 {
    50
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkuIdsParams {
    account_id: String,
    sku_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockParams {
    account_id: String,
    sku_ids: Vec<i64>,
    /// Не указана: адрес по умолчанию или area из конфигурации
    area: Option<JdArea>,
}

pub struct SkuProcedures;

#[async_trait]
impl ProcedureGroup for SkuProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &["jd.sku.list", "jd.sku.detail", "jd.sku.price", "jd.sku.stock"]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.sku.list" => {
                let p: ListParams = parse(params)?;
                let limit = p.limit.clamp(1, MAX_LIST_LIMIT);
                let (items, total) =
                    service::list_paginated(&p.account_id, p.search.as_deref(), limit, p.offset)
                        .await?;
                Ok(json!({"items": to_value(&items)?, "total": total}))
            }
            "jd.sku.detail" => {
                let p: SkuIdsParams = parse(params)?;
                check_sku_ids(&p.sku_ids)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                ctx.cached_call(&creds, ware::METHOD_SKU_DETAIL, ware::sku_detail_params(&p.sku_ids))
                    .await
            }
            "jd.sku.price" => {
                let p: SkuIdsParams = parse(params)?;
                check_sku_ids(&p.sku_ids)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let prices: Vec<ware::SkuPriceEntry> = ctx
                    .cached_call_as(&creds, ware::METHOD_SKU_PRICE, ware::sku_price_params(&p.sku_ids))
                    .await?;
                to_value(&prices)
            }
            "jd.sku.stock" => {
                let p: StockParams = parse(params)?;
                check_sku_ids(&p.sku_ids)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let area = match p.area {
                    Some(area) => area,
                    None => resolve_area(&p.account_id, ctx.sync.default_area).await?,
                };
                let stocks: Vec<ware::StockEntry> = ctx
                    .cached_call_as(
                        &creds,
                        ware::METHOD_AREA_STOCK,
                        ware::area_stock_params(&p.sku_ids, &area),
                    )
                    .await?;
                Ok(json!({"area": area.as_key(), "stocks": to_value(&stocks)?}))
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
