use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a003_jd_sku::aggregate::JdSku;
use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;
use std::collections::HashMap;

use super::StepStats;
use crate::domain::{a003_jd_sku, a004_jd_delivery_address};
use crate::shared::config::AreaConfig;
use crate::shared::jd_cloud::api::ware;
use crate::shared::jd_cloud::{Client, Credentials};

impl From<AreaConfig> for JdArea {
    fn from(c: AreaConfig) -> Self {
        JdArea {
            province_id: c.province_id,
            city_id: c.city_id,
            county_id: c.county_id,
            town_id: c.town_id,
        }
    }
}

/// Территория для запроса остатков: адрес по умолчанию или из конфигурации
pub async fn resolve_area(account_ref: &str, fallback: AreaConfig) -> Result<JdArea> {
    Ok(a004_jd_delivery_address::service::get_default(account_ref)
        .await?
        .map(|a| a.area)
        .unwrap_or_else(|| fallback.into()))
}

pub async fn sync_stocks(
    client: &Client,
    creds: &Credentials,
    skus: Vec<JdSku>,
    area: JdArea,
    batch_size: usize,
    now: DateTime<Utc>,
) -> Result<StepStats> {
    let mut stats = StepStats::default();
    tracing::info!(
        "Stock sync for account {} in area {}",
        creds.account_id,
        area.as_key()
    );

    for batch in skus.chunks(batch_size) {
        let ids: Vec<i64> = batch.iter().map(|s| s.sku_id).collect();
        let stocks = ware::fetch_area_stock(client, creds, &ids, &area).await?;
        stats.fetched += stocks.len();
        let by_id: HashMap<i64, _> = stocks.into_iter().map(|s| (s.sku_id, s)).collect();

        for sku in batch {
            let Some(stock) = by_id.get(&sku.sku_id) else {
                stats.warn(format!("SKU {} missing in stock response", sku.sku_id));
                continue;
            };
            let mut sku = sku.clone();
            sku.apply_stock(stock.to_stock(&area), now);
            match a003_jd_sku::service::save_existing(&mut sku).await {
                Ok(()) => stats.updated += 1,
                Err(e) => stats.warn(format!("SKU {}: {}", sku.sku_id, e)),
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_from_config() {
        let area: JdArea = AreaConfig {
            province_id: 2,
            city_id: 2830,
            county_id: 51800,
            town_id: 0,
        }
        .into();
        assert_eq!(area.as_key(), "2_2830_51800_0");
    }
}
