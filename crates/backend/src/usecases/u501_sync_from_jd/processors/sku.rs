use anyhow::Result;

use super::StepStats;
use crate::domain::a003_jd_sku::service::{self, UpsertOutcome};
use crate::shared::jd_cloud::api::ware::{self, SkuListPage};
use crate::shared::jd_cloud::{Client, Credentials};

/// Есть ли следующая страница списка SKU
pub fn has_next_page(page: &SkuListPage, page_no: u32, page_size: u32) -> bool {
    if page.entries.is_empty() {
        return false;
    }
    match page.total_page {
        Some(total) => (page_no as i64) < total,
        None => page.entries.len() as u32 >= page_size,
    }
}

/// Постранично выгрузить каталог SKU аккаунта и сохранить базовую информацию
pub async fn sync_skus(
    client: &Client,
    creds: &Credentials,
    page_size: u32,
) -> Result<StepStats> {
    let mut stats = StepStats::default();
    let mut page_no = 1u32;

    loop {
        let page = ware::fetch_sku_page(client, creds, page_no, page_size).await?;
        tracing::info!(
            "SKU page {}/{} for account {}: {} entries",
            page_no,
            page.total_page.unwrap_or(0),
            creds.account_id,
            page.entries.len()
        );
        stats.fetched += page.entries.len();

        for entry in &page.entries {
            match service::upsert_base_info(&creds.account_id, entry.sku_id, entry.to_base_info())
                .await
            {
                Ok(UpsertOutcome::Inserted) => stats.inserted += 1,
                Ok(UpsertOutcome::Updated) => stats.updated += 1,
                Ok(UpsertOutcome::Unchanged) => stats.skipped += 1,
                Err(e) => stats.warn(format!("SKU {}: {}", entry.sku_id, e)),
            }
        }

        if !has_next_page(&page, page_no, page_size) {
            break;
        }
        page_no += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::jd_cloud::api::ware::SkuListEntry;

    fn page(entries: usize, total_page: Option<i64>) -> SkuListPage {
        SkuListPage {
            entries: (0..entries)
                .map(|i| SkuListEntry {
                    sku_id: i as i64 + 1,
                    ..Default::default()
                })
                .collect(),
            page_no: None,
            total_page,
            total_count: None,
        }
    }

    #[test]
    fn test_paging_stops_on_total_page() {
        assert!(has_next_page(&page(100, Some(3)), 2, 100));
        assert!(!has_next_page(&page(100, Some(3)), 3, 100));
    }

    #[test]
    fn test_paging_without_total_uses_page_size() {
        assert!(has_next_page(&page(100, None), 1, 100));
        assert!(!has_next_page(&page(40, None), 1, 100));
        assert!(!has_next_page(&page(0, Some(10)), 1, 100));
    }
}
