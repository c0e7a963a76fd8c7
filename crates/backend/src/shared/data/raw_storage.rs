use anyhow::Result;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::db::get_connection;

/// Последний сырой ответ JD по объекту (SKU, заказ) для разбора инцидентов
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jd_raw_payload")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_ref: String,
    pub method: String,
    pub object_key: String,
    pub raw_json: String,
    pub fetched_at: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Сохранить (заменить) сырой ответ по ключу (account, method, object_key)
/// Возвращает id записи
pub async fn save_raw_json(
    account_ref: &str,
    method: &str,
    object_key: &str,
    raw_json: &str,
    fetched_at: chrono::DateTime<Utc>,
) -> Result<String> {
    if let Some(existing) = get_by_key(account_ref, method, object_key).await? {
        let id = existing.id.clone();
        let mut active: ActiveModel = existing.into();
        active.raw_json = Set(raw_json.to_string());
        active.fetched_at = Set(fetched_at.to_rfc3339());
        active.update(conn()).await?;
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    let active = ActiveModel {
        id: Set(id.clone()),
        account_ref: Set(account_ref.to_string()),
        method: Set(method.to_string()),
        object_key: Set(object_key.to_string()),
        raw_json: Set(raw_json.to_string()),
        fetched_at: Set(fetched_at.to_rfc3339()),
        created_at: Set(Utc::now().to_rfc3339()),
    };
    active.insert(conn()).await?;

    tracing::debug!(
        "Saved raw JSON: account={}, method={}, key={}, id={}",
        account_ref,
        method,
        object_key,
        id
    );

    Ok(id)
}

pub async fn get_by_key(account_ref: &str, method: &str, object_key: &str) -> Result<Option<Model>> {
    let result = Entity::find()
        .filter(Column::AccountRef.eq(account_ref))
        .filter(Column::Method.eq(method))
        .filter(Column::ObjectKey.eq(object_key))
        .one(conn())
        .await?;
    Ok(result)
}
