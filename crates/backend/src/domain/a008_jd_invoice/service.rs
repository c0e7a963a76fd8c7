use super::repository;
use contracts::domain::a008_jd_invoice::aggregate::JdInvoice;

/// Проверить и сохранить заявку на счет
pub async fn create(invoice: &mut JdInvoice) -> anyhow::Result<()> {
    invoice
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    invoice.before_write();
    repository::insert(invoice).await?;
    Ok(())
}

pub async fn save(invoice: &mut JdInvoice) -> anyhow::Result<()> {
    invoice.before_write();
    invoice.base.metadata.increment_version();
    repository::update(invoice).await
}

/// Последняя заявка по заказу
pub async fn latest_for_order(order_ref: &str) -> anyhow::Result<Option<JdInvoice>> {
    Ok(repository::list_by_order(order_ref).await?.into_iter().next())
}
