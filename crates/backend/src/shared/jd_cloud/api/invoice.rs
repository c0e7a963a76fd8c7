use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use contracts::domain::a008_jd_invoice::aggregate::{InvoiceState, JdInvoice};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::lenient;
use crate::shared::jd_cloud::{Client, Credentials, JdError};

pub const METHOD_INVOICE_APPLY: &str = "jingdong.ctp.finance.invoice.applyInvoice";
pub const METHOD_INVOICE_QUERY: &str = "jingdong.ctp.finance.invoice.queryInvoice";

pub fn apply_params(invoice: &JdInvoice) -> Value {
    json!({"invoiceApplyParam": {
        "jdOrderIds": [invoice.jd_order_id],
        "invoiceType": invoice.invoice_type.jd_code(),
        "titleType": invoice.title_type.jd_code(),
        "title": invoice.title,
        "taxNo": invoice.tax_no.clone().unwrap_or_default(),
    }})
}

pub async fn apply(
    client: &Client,
    creds: &Credentials,
    invoice: &JdInvoice,
) -> Result<Value, JdError> {
    client
        .execute(creds, METHOD_INVOICE_APPLY, &apply_params(invoice))
        .await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceEntry {
    pub invoice_code: Option<String>,
    pub invoice_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub invoice_amount: Option<f64>,
    pub file_url: Option<String>,
    /// 1 = выставлен, 2 = отклонен, иначе в работе
    #[serde(default)]
    pub invoice_state: i32,
    pub issue_time: Option<String>,
}

impl InvoiceEntry {
    pub fn state(&self) -> InvoiceState {
        match self.invoice_state {
            1 => InvoiceState::Issued,
            2 => InvoiceState::Rejected,
            _ => InvoiceState::Applied,
        }
    }

    /// Время выставления (пекинское) в UTC
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.issue_time.as_deref()?;
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()?;
        let beijing = chrono::FixedOffset::east_opt(8 * 3600)?;
        beijing
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Перенести данные выставленного счета в агрегат
    pub fn apply_to(&self, invoice: &mut JdInvoice) {
        invoice.state = self.state();
        invoice.invoice_code = self.invoice_code.clone();
        invoice.invoice_no = self.invoice_no.clone();
        invoice.amount = self.invoice_amount;
        invoice.file_url = self.file_url.clone();
        invoice.issued_at = self.issued_at();
    }
}

pub fn query_params(jd_order_id: i64) -> Value {
    json!({"invoiceQueryParam": {"jdOrderId": jd_order_id}})
}

/// Ответ бывает массивом счетов или одним объектом
pub fn decode_entries(value: Value) -> Result<Vec<InvoiceEntry>, JdError> {
    Ok(match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a008_jd_invoice::aggregate::{InvoiceTitleType, InvoiceType};

    #[test]
    fn test_issued_entry_updates_invoice() {
        let mut invoice = JdInvoice::new_application(
            "order".into(),
            9001,
            InvoiceType::Electronic,
            InvoiceTitleType::Personal,
            "Li Lei".into(),
            None,
        );
        let entry: InvoiceEntry = serde_json::from_value(json!({
            "invoiceCode": "011001900111",
            "invoiceNo": "12345678",
            "invoiceAmount": "99.00",
            "invoiceState": 1,
            "issueTime": "2024-05-02 08:00:00"
        }))
        .unwrap();
        entry.apply_to(&mut invoice);

        assert_eq!(invoice.state, InvoiceState::Issued);
        assert_eq!(invoice.amount, Some(99.0));
        assert_eq!(
            invoice.issued_at.unwrap().to_rfc3339(),
            "2024-05-02T00:00:00+00:00"
        );
        assert_eq!(apply_params(&invoice)["invoiceApplyParam"]["titleType"], 4);
    }
}
