use super::repository;
use chrono::{DateTime, Utc};
use contracts::domain::a007_jd_logistics::aggregate::{JdLogistics, LogisticsTrace};

/// Обновить трек заказа; возвращает запись и число новых событий
pub async fn apply_traces(
    order_ref: &str,
    jd_order_id: i64,
    carrier: Option<String>,
    waybill_code: Option<String>,
    traces: Vec<LogisticsTrace>,
    now: DateTime<Utc>,
) -> anyhow::Result<(JdLogistics, usize)> {
    let mut logistics = repository::get_by_order(order_ref)
        .await?
        .unwrap_or_else(|| JdLogistics::new_for_order(order_ref.to_string(), jd_order_id));
    let added = logistics.apply_traces(carrier, waybill_code, traces, now);
    logistics.before_write();
    repository::upsert(&logistics).await?;
    if added > 0 {
        tracing::debug!("{} new trace events for JD order {}", added, jd_order_id);
    }
    Ok((logistics, added))
}
