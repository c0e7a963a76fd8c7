use async_trait::async_trait;
use contracts::domain::a009_jd_after_sales::aggregate::{
    AfterSalesState, AfterSalesType, JdAfterSales,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::{default_page_no, parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a009_jd_after_sales::service;
use crate::shared::jd_cloud::api::after_sales as afs_api;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyParams {
    account_id: String,
    jd_order_id: i64,
    sku_id: i64,
    service_type: AfterSalesType,
    quantity: i32,
    reason: String,
    #[serde(default)]
    image_urls: Vec<String>,
    /// 4 = курьер JD забирает товар
    #[serde(default = "default_pickware_type")]
    pickware_type: i32,
}

fn default_pickware_type() -> i32 {
    4
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    account_id: String,
    jd_order_id: i64,
    #[serde(default = "default_page_no")]
    page_no: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelParams {
    account_id: String,
    afs_service_id: i64,
    #[serde(default)]
    reason: String,
}

pub struct AfterSalesProcedures;

#[async_trait]
impl ProcedureGroup for AfterSalesProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &[
            "jd.afterSales.apply",
            "jd.afterSales.list",
            "jd.afterSales.cancel",
        ]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.afterSales.apply" => {
                let p: ApplyParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let order = ctx.order_for(&p.account_id, p.jd_order_id).await?;
                if !order.items.iter().any(|i| i.sku_id == p.sku_id) {
                    return Err(ProcedureError::InvalidParams(format!(
                        "SKU {} is not part of order {}",
                        p.sku_id, p.jd_order_id
                    )));
                }

                let mut item = JdAfterSales::new_application(
                    order.to_string_id(),
                    p.jd_order_id,
                    p.sku_id,
                    p.service_type,
                    p.quantity,
                    p.reason,
                    p.image_urls,
                    p.pickware_type,
                );
                item.validate().map_err(ProcedureError::InvalidParams)?;

                let result = afs_api::apply(&ctx.client, &creds, &item).await?;
                ctx.invalidate(&p.account_id);
                item.afs_service_id = result.afs_service_id;
                service::create(&mut item).await?;
                to_value(&item)
            }
            "jd.afterSales.list" => {
                let p: ListParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let page: afs_api::AfsServicePage = ctx
                    .cached_call_as(
                        &creds,
                        afs_api::METHOD_AFS_LIST,
                        afs_api::list_params(p.jd_order_id, p.page_no, p.page_size),
                    )
                    .await?;
                for entry in &page.service_list {
                    service::apply_remote_state(entry.afs_service_id, entry.state()).await?;
                }
                to_value(&page)
            }
            "jd.afterSales.cancel" => {
                let p: CancelParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let result =
                    afs_api::cancel(&ctx.client, &creds, p.afs_service_id, &p.reason).await?;
                ctx.invalidate(&p.account_id);
                let updated =
                    service::apply_remote_state(p.afs_service_id, AfterSalesState::Cancelled)
                        .await?;
                Ok(json!({"result": result, "localUpdated": updated}))
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
