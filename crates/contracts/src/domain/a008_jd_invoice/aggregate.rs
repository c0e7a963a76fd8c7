use crate::domain::common::BaseAggregate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdInvoiceId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Обычный бумажный счет
    Normal,
    /// Специальный счет НДС
    VatSpecial,
    Electronic,
}

impl InvoiceType {
    /// Код типа счета в API JD
    pub fn jd_code(&self) -> i32 {
        match self {
            Self::Normal => 1,
            Self::VatSpecial => 2,
            Self::Electronic => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceTitleType {
    Personal,
    Company,
}

impl InvoiceTitleType {
    pub fn jd_code(&self) -> i32 {
        match self {
            Self::Personal => 4,
            Self::Company => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    Applied,
    Issued,
    Rejected,
}

/// Счет (fapiao) по заказу JD
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdInvoice {
    #[serde(flatten)]
    pub base: BaseAggregate<JdInvoiceId>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub invoice_type: InvoiceType,
    pub title_type: InvoiceTitleType,
    pub title: String,
    pub tax_no: Option<String>,
    pub state: InvoiceState,
    pub invoice_code: Option<String>,
    pub invoice_no: Option<String>,
    pub amount: Option<f64>,
    pub file_url: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl JdInvoice {
    pub fn new_application(
        order_ref: String,
        jd_order_id: i64,
        invoice_type: InvoiceType,
        title_type: InvoiceTitleType,
        title: String,
        tax_no: Option<String>,
    ) -> Self {
        Self {
            base: BaseAggregate::new(
                JdInvoiceId::new_v4(),
                format!("INV-{}", jd_order_id),
                title.clone(),
            ),
            order_ref,
            jd_order_id,
            invoice_type,
            title_type,
            title,
            tax_no,
            state: InvoiceState::Applied,
            invoice_code: None,
            invoice_no: None,
            amount: None,
            file_url: None,
            issued_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Invoice title is required".into());
        }
        let needs_tax_no = self.title_type == InvoiceTitleType::Company
            || self.invoice_type == InvoiceType::VatSpecial;
        if needs_tax_no && self.tax_no.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err("Tax number is required for company invoices".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_invoice_requires_tax_no() {
        let mut invoice = JdInvoice::new_application(
            "o".into(),
            1,
            InvoiceType::Electronic,
            InvoiceTitleType::Company,
            "ACME Ltd".into(),
            None,
        );
        assert!(invoice.validate().is_err());
        invoice.tax_no = Some("91110000000000000X".into());
        assert!(invoice.validate().is_ok());
    }

    #[test]
    fn test_personal_invoice_without_tax_no() {
        let invoice = JdInvoice::new_application(
            "o".into(),
            1,
            InvoiceType::Normal,
            InvoiceTitleType::Personal,
            "个人".into(),
            None,
        );
        assert!(invoice.validate().is_ok());
    }
}
