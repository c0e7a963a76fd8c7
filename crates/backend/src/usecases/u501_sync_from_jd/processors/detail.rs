use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a003_jd_sku::aggregate::JdSku;
use std::collections::HashMap;

use super::StepStats;
use crate::domain::a003_jd_sku::service;
use crate::shared::data::raw_storage;
use crate::shared::jd_cloud::api::ware;
use crate::shared::jd_cloud::{Client, Credentials};

/// Загрузить детали для устаревших SKU пакетами
pub async fn sync_details(
    client: &Client,
    creds: &Credentials,
    skus: Vec<JdSku>,
    batch_size: usize,
    now: DateTime<Utc>,
) -> Result<StepStats> {
    let mut stats = StepStats::default();

    for batch in skus.chunks(batch_size) {
        let ids: Vec<i64> = batch.iter().map(|s| s.sku_id).collect();
        let details = ware::fetch_sku_details(client, creds, &ids).await?;
        stats.fetched += details.len();

        let by_id: HashMap<i64, _> = details.into_iter().map(|d| (d.0.sku_id, d)).collect();

        for sku in batch {
            let Some((entry, raw)) = by_id.get(&sku.sku_id) else {
                stats.warn(format!("SKU {} missing in detail response", sku.sku_id));
                continue;
            };

            if let Err(e) = raw_storage::save_raw_json(
                &creds.account_id,
                ware::METHOD_SKU_DETAIL,
                &sku.sku_id.to_string(),
                &raw.to_string(),
                now,
            )
            .await
            {
                tracing::warn!("Cannot store raw detail for SKU {}: {}", sku.sku_id, e);
            }

            let mut sku = sku.clone();
            if let Some(base) = &entry.sku_base_info {
                sku.apply_base_info(base.to_base_info());
            }
            sku.apply_detail(
                entry.image_info(),
                entry.specification(),
                entry.big_field(),
                entry.book_info(),
                now,
            );
            match service::save_existing(&mut sku).await {
                Ok(()) => stats.updated += 1,
                Err(e) => stats.warn(format!("SKU {}: {}", sku.sku_id, e)),
            }
        }
    }

    Ok(stats)
}
