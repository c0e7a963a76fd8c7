use crate::domain::common::BaseAggregate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdLogisticsId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsTrace {
    /// Время события в формате JD ("2024-05-01 10:00:00")
    pub time: String,
    pub content: String,
    pub operator: Option<String>,
}

/// Доставка заказа: перевозчик, трек-номер, история движения
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdLogistics {
    #[serde(flatten)]
    pub base: BaseAggregate<JdLogisticsId>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub carrier: Option<String>,
    pub waybill_code: Option<String>,
    pub traces: Vec<LogisticsTrace>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl JdLogistics {
    pub fn new_for_order(order_ref: String, jd_order_id: i64) -> Self {
        Self {
            base: BaseAggregate::new(
                JdLogisticsId::new_v4(),
                format!("LOG-{}", jd_order_id),
                format!("Logistics for JD order {}", jd_order_id),
            ),
            order_ref,
            jd_order_id,
            carrier: None,
            waybill_code: None,
            traces: Vec::new(),
            last_synced_at: None,
        }
    }

    /// Заменить историю; возвращает количество новых событий
    pub fn apply_traces(
        &mut self,
        carrier: Option<String>,
        waybill_code: Option<String>,
        mut traces: Vec<LogisticsTrace>,
        now: DateTime<Utc>,
    ) -> usize {
        traces.sort_by(|a, b| a.time.cmp(&b.time));
        let added = traces.len().saturating_sub(self.traces.len());
        if carrier.is_some() {
            self.carrier = carrier;
        }
        if waybill_code.is_some() {
            self.waybill_code = waybill_code;
        }
        self.traces = traces;
        self.last_synced_at = Some(now);
        added
    }

    pub fn latest(&self) -> Option<&LogisticsTrace> {
        self.traces.last()
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(time: &str, content: &str) -> LogisticsTrace {
        LogisticsTrace {
            time: time.into(),
            content: content.into(),
            operator: None,
        }
    }

    #[test]
    fn test_apply_traces_orders_and_counts() {
        let mut logistics = JdLogistics::new_for_order("o".into(), 42);
        let added = logistics.apply_traces(
            Some("JD Logistics".into()),
            Some("JDV001".into()),
            vec![
                trace("2024-05-02 09:00:00", "Out for delivery"),
                trace("2024-05-01 10:00:00", "Picked up"),
            ],
            Utc::now(),
        );
        assert_eq!(added, 2);
        assert_eq!(logistics.latest().unwrap().content, "Out for delivery");

        let added = logistics.apply_traces(None, None, logistics.traces.clone(), Utc::now());
        assert_eq!(added, 0);
        assert_eq!(logistics.waybill_code.as_deref(), Some("JDV001"));
    }
}
