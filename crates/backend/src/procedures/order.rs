use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;
use contracts::domain::a005_jd_order::aggregate::{JdOrderAddress, JdOrderItem, JdOrderState};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::params::{parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::{a004_jd_delivery_address, a005_jd_order, a006_jd_payment};
use crate::shared::jd_cloud::api::order as order_api;
use crate::usecases::u501_sync_from_jd::processors::stock::resolve_area;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreightParams {
    account_id: String,
    items: Vec<order_api::SkuQuantity>,
    area: Option<JdArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitParams {
    account_id: String,
    third_order_id: String,
    items: Vec<JdOrderItem>,
    address_id: String,
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderParams {
    account_id: String,
    jd_order_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelParams {
    account_id: String,
    jd_order_id: i64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayParams {
    account_id: String,
    jd_order_id: i64,
    #[serde(default = "default_pay_type")]
    pay_type: i32,
}

fn default_pay_type() -> i32 {
    order_api::PAY_TYPE_BALANCE
}

/// Снимок адреса доставки для заказа
async fn address_snapshot(account_id: &str, address_id: &str) -> Result<JdOrderAddress, ProcedureError> {
    let id = Uuid::parse_str(address_id)
        .map_err(|_| ProcedureError::InvalidParams(format!("Invalid address id: {}", address_id)))?;
    let address = a004_jd_delivery_address::service::get_by_id(id)
        .await?
        .filter(|a| a.account_ref == account_id && !a.base.metadata.is_deleted)
        .ok_or_else(|| ProcedureError::InvalidParams(format!("Address {} not found", address_id)))?;
    Ok(JdOrderAddress {
        receiver_name: address.receiver_name.clone(),
        mobile: address.mobile.clone(),
        area: address.area,
        full_address: address.full_address(),
    })
}

pub struct OrderProcedures;

#[async_trait]
impl ProcedureGroup for OrderProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &[
            "jd.order.freight",
            "jd.order.submit",
            "jd.order.detail",
            "jd.order.cancel",
            "jd.order.confirm",
            "jd.order.pay",
        ]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.order.freight" => {
                let p: FreightParams = parse(params)?;
                if p.items.is_empty() {
                    return Err(ProcedureError::InvalidParams("items must not be empty".into()));
                }
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let area = match p.area {
                    Some(area) => area,
                    None => resolve_area(&p.account_id, ctx.sync.default_area).await?,
                };
                let freight: order_api::FreightResult = ctx
                    .cached_call_as(
                        &creds,
                        order_api::METHOD_FREIGHT,
                        order_api::freight_params(&p.items, &area),
                    )
                    .await?;
                to_value(&freight)
            }
            "jd.order.submit" => {
                let p: SubmitParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let address = address_snapshot(&p.account_id, &p.address_id).await?;
                let mut order = a005_jd_order::service::create_draft(
                    &p.account_id,
                    &p.third_order_id,
                    p.items,
                    address,
                    p.remark,
                )
                .await
                .map_err(|e| ProcedureError::InvalidParams(e.to_string()))?;

                let submitted = order_api::submit(&ctx.client, &creds, &order).await;
                ctx.invalidate(&p.account_id);
                match submitted {
                    Ok(result) => {
                        order.mark_submitted(
                            result.jd_order_id,
                            result.freight.unwrap_or(0.0),
                            result.order_price,
                            Utc::now(),
                        );
                        a005_jd_order::service::save(&mut order).await?;
                        tracing::info!(
                            "Order {} submitted to JD as {}",
                            order.third_order_id,
                            result.jd_order_id
                        );
                        to_value(&order)
                    }
                    Err(e) => {
                        tracing::error!("Order {} rejected by JD: {}", order.third_order_id, e);
                        order.mark_failed(e.to_string());
                        a005_jd_order::service::save(&mut order).await?;
                        Err(e.into())
                    }
                }
            }
            "jd.order.detail" => {
                let p: OrderParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let detail: order_api::OrderDetail = ctx
                    .cached_call_as(
                        &creds,
                        order_api::METHOD_DETAIL,
                        order_api::detail_params(p.jd_order_id),
                    )
                    .await?;
                let state = detail.state();
                if let Ok(mut order) = ctx.order_for(&p.account_id, p.jd_order_id).await {
                    if order.apply_remote_state(state, Utc::now()) {
                        a005_jd_order::service::save(&mut order).await?;
                    }
                }
                Ok(json!({"detail": to_value(&detail)?, "state": state}))
            }
            "jd.order.cancel" => {
                let p: CancelParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let result = order_api::cancel(&ctx.client, &creds, p.jd_order_id, &p.reason).await?;
                ctx.invalidate(&p.account_id);
                self.set_local_state(ctx, &p.account_id, p.jd_order_id, JdOrderState::Cancelled)
                    .await?;
                Ok(result)
            }
            "jd.order.confirm" => {
                let p: OrderParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let result = order_api::confirm_received(&ctx.client, &creds, p.jd_order_id).await?;
                ctx.invalidate(&p.account_id);
                self.set_local_state(ctx, &p.account_id, p.jd_order_id, JdOrderState::Completed)
                    .await?;
                Ok(result)
            }
            "jd.order.pay" => {
                let p: PayParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let mut order = ctx.order_for(&p.account_id, p.jd_order_id).await?;
                let order_ref = order.to_string_id();
                if a006_jd_payment::service::is_paid(&order_ref).await? {
                    return Err(ProcedureError::InvalidParams(format!(
                        "Order {} is already paid",
                        p.jd_order_id
                    )));
                }

                let mut payment = a006_jd_payment::service::start(
                    &order_ref,
                    p.jd_order_id,
                    p.pay_type,
                    order.total_amount,
                )
                .await?;
                let paid = order_api::pay(&ctx.client, &creds, p.jd_order_id, p.pay_type).await;
                ctx.invalidate(&p.account_id);
                match paid {
                    Ok(result) => {
                        let now = Utc::now();
                        payment.mark_paid(result.pay_id, now);
                        a006_jd_payment::service::save(&mut payment).await?;
                        if order.apply_remote_state(JdOrderState::Paid, now) {
                            a005_jd_order::service::save(&mut order).await?;
                        }
                        to_value(&payment)
                    }
                    Err(e) => {
                        payment.mark_failed(e.to_string());
                        a006_jd_payment::service::save(&mut payment).await?;
                        Err(e.into())
                    }
                }
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}

impl OrderProcedures {
    /// Локальный заказ может отсутствовать (создан вне этой системы)
    async fn set_local_state(
        &self,
        ctx: &ProcedureContext,
        account_id: &str,
        jd_order_id: i64,
        state: JdOrderState,
    ) -> Result<(), ProcedureError> {
        if let Ok(mut order) = ctx.order_for(account_id, jd_order_id).await {
            if order.apply_remote_state(state, Utc::now()) {
                a005_jd_order::service::save(&mut order).await?;
            }
        }
        Ok(())
    }
}
