use anyhow::Result;
use chrono::Utc;
use contracts::domain::a002_jd_category::aggregate::{JdCategory, JdCategoryId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_jd_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub category_id: i64,
    pub parent_id: i64,
    pub level: i32,
    pub name: String,
    pub state: i32,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdCategory {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdCategory {
            base: BaseAggregate::with_metadata(
                JdCategoryId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            category_id: m.category_id,
            parent_id: m.parent_id,
            level: m.level,
            name: m.name,
            state: m.state,
        }
    }
}

pub async fn list_by_parent(parent_id: i64) -> Result<Vec<JdCategory>> {
    let db = get_connection();
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::ParentId.eq(parent_id))
        .order_by_asc(Column::CategoryId)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Upsert категории по JD category id; true = вставлена новая
pub async fn upsert(item: &JdCategory) -> Result<bool> {
    let db = get_connection();

    if let Some(existing) = Entity::find()
        .filter(Column::CategoryId.eq(item.category_id))
        .one(db)
        .await?
    {
        let version = existing.version;
        let mut active: ActiveModel = existing.into();
        active.description = Set(item.base.description.clone());
        active.parent_id = Set(item.parent_id);
        active.level = Set(item.level);
        active.name = Set(item.name.clone());
        active.state = Set(item.state);
        active.is_deleted = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        active.update(db).await?;
        Ok(false)
    } else {
        let active = ActiveModel {
            id: Set(item.base.id.value().to_string()),
            code: Set(item.base.code.clone()),
            description: Set(item.base.description.clone()),
            comment: Set(item.base.comment.clone()),
            category_id: Set(item.category_id),
            parent_id: Set(item.parent_id),
            level: Set(item.level),
            name: Set(item.name.clone()),
            state: Set(item.state),
            is_deleted: Set(false),
            is_posted: Set(false),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            version: Set(1),
        };
        active.insert(db).await?;
        Ok(true)
    }
}
