use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a003_jd_sku::aggregate::JdSku;
use std::collections::HashMap;

use super::StepStats;
use crate::domain::a003_jd_sku::service;
use crate::shared::jd_cloud::api::ware;
use crate::shared::jd_cloud::{Client, Credentials};

pub async fn sync_prices(
    client: &Client,
    creds: &Credentials,
    skus: Vec<JdSku>,
    batch_size: usize,
    now: DateTime<Utc>,
) -> Result<StepStats> {
    let mut stats = StepStats::default();

    for batch in skus.chunks(batch_size) {
        let ids: Vec<i64> = batch.iter().map(|s| s.sku_id).collect();
        let prices = ware::fetch_prices(client, creds, &ids).await?;
        stats.fetched += prices.len();
        let by_id: HashMap<i64, _> = prices.into_iter().map(|p| (p.sku_id, p)).collect();

        for sku in batch {
            let Some(price) = by_id.get(&sku.sku_id) else {
                stats.warn(format!("SKU {} missing in price response", sku.sku_id));
                continue;
            };
            let mut sku = sku.clone();
            sku.apply_price(price.to_price(), now);
            match service::save_existing(&mut sku).await {
                Ok(()) => stats.updated += 1,
                Err(e) => stats.warn(format!("SKU {}: {}", sku.sku_id, e)),
            }
        }
    }

    Ok(stats)
}
