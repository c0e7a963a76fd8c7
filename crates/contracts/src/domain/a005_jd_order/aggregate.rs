use crate::domain::a004_jd_delivery_address::aggregate::JdArea;
use crate::domain::common::{AggregateId, BaseAggregate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdOrderId);

/// Статус заказа JD в локальной нормализации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JdOrderState {
    /// Черновик, еще не отправлен в JD
    Created,
    Submitted,
    Paid,
    Shipped,
    Completed,
    Cancelled,
    Failed,
}

impl JdOrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Submitted => "submitted",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "submitted" => Some(Self::Submitted),
            "paid" => Some(Self::Paid),
            "shipped" => Some(Self::Shipped),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Финальные статусы больше не синхронизируются
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Порядок продвижения заказа; отмена и ошибка вне шкалы
    fn progress(&self) -> Option<u8> {
        match self {
            Self::Created => Some(0),
            Self::Submitted => Some(1),
            Self::Paid => Some(2),
            Self::Shipped => Some(3),
            Self::Completed => Some(4),
            Self::Cancelled | Self::Failed => None,
        }
    }

    /// Можно ли перейти из self в next: только вперед по шкале,
    /// отмена и ошибка допустимы из любого нефинального статуса
    pub fn can_advance_to(&self, next: Self) -> bool {
        if self.is_final() || *self == next {
            return false;
        }
        match (self.progress(), next.progress()) {
            (Some(current), Some(next)) => next > current,
            _ => true,
        }
    }

    /// Сопоставление статусов JD:
    /// orderState 0 = отменен, 1 = действует;
    /// jdOrderState: 1..=10 ожидание/подтверждение, 11..=15 отгрузка, 16..=18 доставлен,
    /// 19 завершен; payState 1 = не оплачен, 2 = оплачен.
    pub fn from_jd(order_state: i32, jd_order_state: i32, pay_state: Option<i32>) -> Self {
        if order_state == 0 {
            return Self::Cancelled;
        }
        match jd_order_state {
            19 => Self::Completed,
            16..=18 => Self::Completed,
            11..=15 => Self::Shipped,
            _ if pay_state == Some(2) => Self::Paid,
            _ => Self::Submitted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdOrderItem {
    pub sku_id: i64,
    pub name: String,
    pub quantity: i32,
    /// Цена за единицу на момент заказа
    pub price: f64,
}

impl JdOrderItem {
    pub fn amount(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Снимок адреса доставки на момент отправки заказа
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdOrderAddress {
    pub receiver_name: String,
    pub mobile: String,
    pub area: JdArea,
    pub full_address: String,
}

/// Заказ, размещаемый через JD Cloud Trade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdOrder {
    #[serde(flatten)]
    pub base: BaseAggregate<JdOrderId>,
    pub account_ref: String,
    /// Номер заказа в нашей системе (thirdOrderId для JD)
    pub third_order_id: String,
    pub jd_order_id: Option<i64>,
    pub state: JdOrderState,
    pub items: Vec<JdOrderItem>,
    pub address: JdOrderAddress,
    pub freight: f64,
    pub total_amount: f64,
    pub remark: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Последняя ошибка при отправке / синхронизации
    pub last_error: Option<String>,
}

impl JdOrder {
    pub fn new_draft(
        account_ref: String,
        third_order_id: String,
        items: Vec<JdOrderItem>,
        address: JdOrderAddress,
        remark: Option<String>,
    ) -> Self {
        let base = BaseAggregate::new(
            JdOrderId::new_v4(),
            third_order_id.clone(),
            format!("JD order {}", third_order_id),
        );
        let mut order = Self {
            base,
            account_ref,
            third_order_id,
            jd_order_id: None,
            state: JdOrderState::Created,
            items,
            address,
            freight: 0.0,
            total_amount: 0.0,
            remark,
            submitted_at: None,
            last_synced_at: None,
            last_error: None,
        };
        order.recalculate_total();
        order
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn items_amount(&self) -> f64 {
        self.items.iter().map(JdOrderItem::amount).sum()
    }

    pub fn recalculate_total(&mut self) {
        self.total_amount = self.items_amount() + self.freight;
    }

    pub fn mark_submitted(
        &mut self,
        jd_order_id: i64,
        freight: f64,
        order_price: Option<f64>,
        now: DateTime<Utc>,
    ) {
        self.jd_order_id = Some(jd_order_id);
        self.freight = freight;
        self.recalculate_total();
        if let Some(price) = order_price {
            self.total_amount = price + freight;
        }
        self.state = JdOrderState::Submitted;
        self.submitted_at = Some(now);
        self.last_error = None;
        self.base.metadata.is_posted = true;
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = JdOrderState::Failed;
        self.last_error = Some(error);
    }

    /// Применить статус из JD; возвращает true при смене статуса.
    /// Статус, отстающий от локального, игнорируется: деталь JD без payState
    /// не откатывает оплаченный заказ.
    pub fn apply_remote_state(&mut self, state: JdOrderState, now: DateTime<Utc>) -> bool {
        self.last_synced_at = Some(now);
        if !self.state.can_advance_to(state) {
            return false;
        }
        self.state = state;
        true
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.third_order_id.trim().is_empty() {
            return Err("Third order id is required".into());
        }
        if self.items.is_empty() {
            return Err("Order must contain at least one item".into());
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(format!("Invalid quantity for sku {}", item.sku_id));
        }
        if self.address.receiver_name.trim().is_empty() {
            return Err("Receiver is required".into());
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

    fn order() -> JdOrder {
        JdOrder::new_draft(
            "acc".into(),
            "T-1001".into(),
            vec![
                JdOrderItem {
                    sku_id: 1,
                    name: "A".into(),
                    quantity: 2,
                    price: 10.5,
                },
                JdOrderItem {
                    sku_id: 2,
                    name: "B".into(),
                    quantity: 1,
                    price: 4.0,
                },
            ],
            JdOrderAddress {
                receiver_name: "Li Si".into(),
                ..Default::default()
            },
            None,
        )
    }

    #[test]
    fn test_total_includes_freight() {
        let mut o = order();
        assert_eq!(o.total_amount, 25.0);
        o.mark_submitted(900001, 6.0, None, Utc::now());
        assert_eq!(o.total_amount, 31.0);
        assert_eq!(o.state, JdOrderState::Submitted);
        assert!(o.base.metadata.is_posted);
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(JdOrderState::from_jd(0, 19, Some(2)), JdOrderState::Cancelled);
        assert_eq!(JdOrderState::from_jd(1, 19, Some(2)), JdOrderState::Completed);
        assert_eq!(JdOrderState::from_jd(1, 12, Some(2)), JdOrderState::Shipped);
        assert_eq!(JdOrderState::from_jd(1, 1, Some(2)), JdOrderState::Paid);
        assert_eq!(JdOrderState::from_jd(1, 1, Some(1)), JdOrderState::Submitted);
    }

    #[test]
    fn test_state_string_roundtrip() {
        for state in [
            JdOrderState::Created,
            JdOrderState::Submitted,
            JdOrderState::Paid,
            JdOrderState::Shipped,
            JdOrderState::Completed,
            JdOrderState::Cancelled,
            JdOrderState::Failed,
        ] {
            assert_eq!(JdOrderState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut o = order();
        o.items[1].quantity = 0;
        assert_eq!(o.validate().unwrap_err(), "Invalid quantity for sku 2");
    }

    #[test]
    fn test_apply_remote_state_reports_change() {
        let mut o = order();
        let now = Utc::now();
        assert!(o.apply_remote_state(JdOrderState::Paid, now));
        assert!(!o.apply_remote_state(JdOrderState::Paid, now));
        assert_eq!(o.last_synced_at, Some(now));
    }

    #[test]
    fn test_paid_order_not_reverted_by_detail_without_pay_state() {
        let mut o = order();
        let now = Utc::now();
        o.mark_submitted(900001, 0.0, None, now);
        assert!(o.apply_remote_state(JdOrderState::Paid, now));

        let remote = JdOrderState::from_jd(1, 2, None);
        assert_eq!(remote, JdOrderState::Submitted);
        assert!(!o.apply_remote_state(remote, now));
        assert_eq!(o.state, JdOrderState::Paid);

        assert!(o.apply_remote_state(JdOrderState::from_jd(1, 12, None), now));
        assert_eq!(o.state, JdOrderState::Shipped);
    }

    #[test]
    fn test_cancel_overrides_and_final_states_stick() {
        let mut o = order();
        let now = Utc::now();
        o.mark_submitted(900001, 0.0, None, now);
        o.apply_remote_state(JdOrderState::Shipped, now);
        assert!(o.apply_remote_state(JdOrderState::Cancelled, now));
        assert!(!o.apply_remote_state(JdOrderState::Completed, now));
        assert_eq!(o.state, JdOrderState::Cancelled);

        assert!(!JdOrderState::Completed.can_advance_to(JdOrderState::Shipped));
        assert!(JdOrderState::Submitted.can_advance_to(JdOrderState::Failed));
    }
}
