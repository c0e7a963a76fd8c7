use super::repository;
use contracts::domain::a005_jd_order::aggregate::{JdOrder, JdOrderAddress, JdOrderItem};
use uuid::Uuid;

/// Создать черновик заказа; повторный thirdOrderId отклоняется
pub async fn create_draft(
    account_ref: &str,
    third_order_id: &str,
    items: Vec<JdOrderItem>,
    address: JdOrderAddress,
    remark: Option<String>,
) -> anyhow::Result<JdOrder> {
    if repository::get_by_third_order_id(third_order_id)
        .await?
        .is_some()
    {
        anyhow::bail!("Order {} already exists", third_order_id);
    }

    let mut order = JdOrder::new_draft(
        account_ref.to_string(),
        third_order_id.to_string(),
        items,
        address,
        remark,
    );
    order
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    order.before_write();
    repository::insert(&order).await?;
    Ok(order)
}

/// Сохранить изменения заказа (отправка, статус, ошибка)
pub async fn save(order: &mut JdOrder) -> anyhow::Result<()> {
    order.before_write();
    order.base.metadata.increment_version();
    repository::update(order).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<JdOrder>> {
    repository::get_by_id(id).await
}

pub async fn get_by_jd_order_id(jd_order_id: i64) -> anyhow::Result<Option<JdOrder>> {
    repository::get_by_jd_order_id(jd_order_id).await
}

pub async fn list_open(account_ref: &str) -> anyhow::Result<Vec<JdOrder>> {
    repository::list_open(account_ref).await
}
