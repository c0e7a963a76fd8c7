use anyhow::Result;
use contracts::domain::a002_jd_category::aggregate::MAX_CATEGORY_LEVEL;
use std::collections::VecDeque;

use super::StepStats;
use crate::domain::a002_jd_category::service;
use crate::shared::jd_cloud::api::ware;
use crate::shared::jd_cloud::{Client, Credentials};

/// Обход дерева категорий в ширину от корня (parent 0) до третьего уровня
pub async fn sync_categories(client: &Client, creds: &Credentials) -> Result<StepStats> {
    let mut stats = StepStats::default();
    let mut queue: VecDeque<(i64, i32)> = VecDeque::from([(0, 1)]);

    while let Some((parent_id, level)) = queue.pop_front() {
        let children = ware::fetch_categories(client, creds, parent_id).await?;
        stats.fetched += children.len();

        for child in children {
            match service::upsert_from_jd(
                child.category_id,
                parent_id,
                level,
                child.category_name.clone(),
                child.state,
            )
            .await
            {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.updated += 1,
                Err(e) => {
                    stats.warn(format!("Category {}: {}", child.category_id, e));
                    continue;
                }
            }
            if level < MAX_CATEGORY_LEVEL {
                queue.push_back((child.category_id, level + 1));
            }
        }
    }

    tracing::info!(
        "Categories synced: {} fetched, {} new",
        stats.fetched,
        stats.inserted
    );
    Ok(stats)
}
