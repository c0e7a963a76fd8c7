use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::parse;
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a007_jd_logistics;
use crate::shared::jd_cloud::api::order as order_api;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackParams {
    account_id: String,
    jd_order_id: i64,
}

pub struct LogisticsProcedures;

#[async_trait]
impl ProcedureGroup for LogisticsProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &["jd.logistics.track"]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.logistics.track" => {
                let p: TrackParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let result: order_api::LogisticsResult = ctx
                    .cached_call_as(
                        &creds,
                        order_api::METHOD_LOGISTICS,
                        order_api::logistics_params(p.jd_order_id),
                    )
                    .await?;
                let traces = result.traces();

                // трек сохраняется, только если заказ размещался через нас
                let mut new_traces = 0;
                if let Ok(order) = ctx.order_for(&p.account_id, p.jd_order_id).await {
                    let (_, added) = a007_jd_logistics::service::apply_traces(
                        &order.to_string_id(),
                        p.jd_order_id,
                        result.logistics_company.clone(),
                        result.waybill_code.clone(),
                        traces.clone(),
                        Utc::now(),
                    )
                    .await?;
                    new_traces = added;
                }

                Ok(json!({
                    "carrier": result.logistics_company,
                    "waybillCode": result.waybill_code,
                    "traces": traces,
                    "newTraces": new_traces,
                }))
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
