use super::repository;
use contracts::domain::a002_jd_category::aggregate::JdCategory;

/// Сохранить категорию, полученную из JD; true = новая
pub async fn upsert_from_jd(
    category_id: i64,
    parent_id: i64,
    level: i32,
    name: String,
    state: i32,
) -> anyhow::Result<bool> {
    let mut category = JdCategory::new_for_insert(category_id, parent_id, level, name, state);
    category
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    category.before_write();
    repository::upsert(&category).await
}

pub async fn list_by_parent(parent_id: i64) -> anyhow::Result<Vec<JdCategory>> {
    repository::list_by_parent(parent_id).await
}
