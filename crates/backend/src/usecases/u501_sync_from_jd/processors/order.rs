use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a005_jd_order::aggregate::{JdOrder, JdOrderState};

use super::StepStats;
use crate::domain::{a005_jd_order, a007_jd_logistics};
use crate::shared::jd_cloud::api::order as order_api;
use crate::shared::jd_cloud::{Client, Credentials};

/// Статусы, для которых имеет смысл запрашивать трек
pub fn tracks_logistics(state: JdOrderState) -> bool {
    matches!(state, JdOrderState::Shipped | JdOrderState::Completed)
}

/// Обновить статусы незавершенных заказов аккаунта и их доставку
pub async fn sync_orders(
    client: &Client,
    creds: &Credentials,
    now: DateTime<Utc>,
) -> Result<StepStats> {
    let mut stats = StepStats::default();
    let orders = a005_jd_order::service::list_open(&creds.account_id).await?;
    tracing::info!(
        "{} open orders for account {}",
        orders.len(),
        creds.account_id
    );

    for mut order in orders {
        if let Err(e) = sync_one(client, creds, &mut order, now, &mut stats).await {
            stats.warn(format!("Order {}: {}", order.third_order_id, e));
        }
    }

    Ok(stats)
}

async fn sync_one(
    client: &Client,
    creds: &Credentials,
    order: &mut JdOrder,
    now: DateTime<Utc>,
    stats: &mut StepStats,
) -> Result<()> {
    let Some(jd_order_id) = order.jd_order_id else {
        return Ok(());
    };

    let detail = order_api::fetch_detail(client, creds, jd_order_id).await?;
    stats.fetched += 1;

    let state = detail.state();
    if order.apply_remote_state(state, now) {
        tracing::info!(
            "Order {} (JD {}) is now {}",
            order.third_order_id,
            jd_order_id,
            state.as_str()
        );
        stats.updated += 1;
    } else {
        stats.skipped += 1;
    }
    a005_jd_order::service::save(order).await?;

    if tracks_logistics(state) {
        let logistics = order_api::fetch_logistics(client, creds, jd_order_id).await?;
        let (record, added) = a007_jd_logistics::service::apply_traces(
            &order.to_string_id(),
            jd_order_id,
            logistics.logistics_company.clone(),
            logistics.waybill_code.clone(),
            logistics.traces(),
            now,
        )
        .await?;
        if added > 0 {
            if let Some(last) = record.latest() {
                tracing::info!("JD order {}: {} {}", jd_order_id, last.time, last.content);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistics_only_after_shipment() {
        assert!(!tracks_logistics(JdOrderState::Submitted));
        assert!(!tracks_logistics(JdOrderState::Paid));
        assert!(tracks_logistics(JdOrderState::Shipped));
        assert!(tracks_logistics(JdOrderState::Completed));
    }
}
