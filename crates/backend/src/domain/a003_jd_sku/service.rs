use super::repository;
use contracts::domain::a003_jd_sku::aggregate::{JdSku, SkuBaseInfo};

/// Результат upsert базовой информации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Вставить SKU или обновить базовую информацию существующего
pub async fn upsert_base_info(
    account_ref: &str,
    sku_id: i64,
    base_info: SkuBaseInfo,
) -> anyhow::Result<UpsertOutcome> {
    match repository::get_by_sku(account_ref, sku_id).await? {
        Some(mut sku) => {
            if !sku.apply_base_info(base_info) {
                return Ok(UpsertOutcome::Unchanged);
            }
            save_existing(&mut sku).await?;
            tracing::debug!("Updated JD SKU {} for account {}", sku_id, account_ref);
            Ok(UpsertOutcome::Updated)
        }
        None => {
            let mut sku = JdSku::new_for_insert(account_ref.to_string(), sku_id, base_info);
            sku.validate()
                .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
            sku.before_write();
            repository::insert(&sku).await?;
            tracing::debug!("Inserted JD SKU {} for account {}", sku_id, account_ref);
            Ok(UpsertOutcome::Inserted)
        }
    }
}

/// Сохранить изменения уже загруженного SKU
pub async fn save_existing(sku: &mut JdSku) -> anyhow::Result<()> {
    sku.validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    sku.before_write();
    sku.base.metadata.increment_version();
    repository::update(sku).await
}

pub async fn list_by_account(account_ref: &str) -> anyhow::Result<Vec<JdSku>> {
    repository::list_by_account(account_ref).await
}

pub async fn list_paginated(
    account_ref: &str,
    search: Option<&str>,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<JdSku>, u64)> {
    repository::list_paginated(account_ref, search, limit, offset).await
}
