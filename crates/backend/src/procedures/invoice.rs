use async_trait::async_trait;
use contracts::domain::a008_jd_invoice::aggregate::{InvoiceTitleType, InvoiceType, JdInvoice};
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::{parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a008_jd_invoice::service;
use crate::shared::jd_cloud::api::invoice as invoice_api;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyParams {
    account_id: String,
    jd_order_id: i64,
    invoice_type: InvoiceType,
    title_type: InvoiceTitleType,
    title: String,
    tax_no: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams {
    account_id: String,
    jd_order_id: i64,
}

pub struct InvoiceProcedures;

#[async_trait]
impl ProcedureGroup for InvoiceProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &["jd.invoice.apply", "jd.invoice.query"]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.invoice.apply" => {
                let p: ApplyParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let order = ctx.order_for(&p.account_id, p.jd_order_id).await?;

                let mut invoice = JdInvoice::new_application(
                    order.to_string_id(),
                    p.jd_order_id,
                    p.invoice_type,
                    p.title_type,
                    p.title,
                    p.tax_no,
                );
                invoice.validate().map_err(ProcedureError::InvalidParams)?;

                invoice_api::apply(&ctx.client, &creds, &invoice).await?;
                ctx.invalidate(&p.account_id);
                service::create(&mut invoice).await?;
                to_value(&invoice)
            }
            "jd.invoice.query" => {
                let p: QueryParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let value = ctx
                    .cached_call(
                        &creds,
                        invoice_api::METHOD_INVOICE_QUERY,
                        invoice_api::query_params(p.jd_order_id),
                    )
                    .await?;
                let entries = invoice_api::decode_entries(value)?;

                // последняя заявка получает данные выставленного счета
                if let (Some(entry), Ok(order)) =
                    (entries.first(), ctx.order_for(&p.account_id, p.jd_order_id).await)
                {
                    if let Some(mut invoice) =
                        service::latest_for_order(&order.to_string_id()).await?
                    {
                        entry.apply_to(&mut invoice);
                        service::save(&mut invoice).await?;
                    }
                }

                Ok(json!({"invoices": to_value(&entries)?}))
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
