use crate::domain::common::BaseAggregate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdPaymentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JdPaymentState {
    Pending,
    Paid,
    Failed,
}

impl JdPaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => Self::Paid,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Оплата заказа JD (предоплата с баланса / онлайн)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdPayment {
    #[serde(flatten)]
    pub base: BaseAggregate<JdPaymentId>,
    pub order_ref: String,
    pub jd_order_id: i64,
    /// 4 = оплата с баланса, 5 = банковский перевод (коды JD)
    pub pay_type: i32,
    pub amount: f64,
    pub state: JdPaymentState,
    pub jd_pay_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JdPayment {
    pub fn new_pending(order_ref: String, jd_order_id: i64, pay_type: i32, amount: f64) -> Self {
        Self {
            base: BaseAggregate::new(
                JdPaymentId::new_v4(),
                format!("PAY-{}", jd_order_id),
                format!("Payment for JD order {}", jd_order_id),
            ),
            order_ref,
            jd_order_id,
            pay_type,
            amount,
            state: JdPaymentState::Pending,
            jd_pay_id: None,
            paid_at: None,
            error: None,
        }
    }

    pub fn mark_paid(&mut self, jd_pay_id: Option<String>, now: DateTime<Utc>) {
        self.state = JdPaymentState::Paid;
        self.jd_pay_id = jd_pay_id;
        self.paid_at = Some(now);
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = JdPaymentState::Failed;
        self.error = Some(error);
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}
