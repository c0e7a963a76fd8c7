use super::repository;
use contracts::domain::a009_jd_after_sales::aggregate::{AfterSalesState, JdAfterSales};

/// Проверить и сохранить заявку на послепродажное обслуживание
pub async fn create(item: &mut JdAfterSales) -> anyhow::Result<()> {
    item.validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    item.before_write();
    repository::insert(item).await?;
    Ok(())
}

pub async fn save(item: &mut JdAfterSales) -> anyhow::Result<()> {
    item.before_write();
    item.base.metadata.increment_version();
    repository::update(item).await
}

/// Обновить статус заявки по данным JD; false, если заявка неизвестна или статус тот же
pub async fn apply_remote_state(afs_service_id: i64, state: AfterSalesState) -> anyhow::Result<bool> {
    let Some(mut item) = repository::get_by_afs_service_id(afs_service_id).await? else {
        return Ok(false);
    };
    if item.state == state {
        return Ok(false);
    }
    item.state = state;
    save(&mut item).await?;
    Ok(true)
}
