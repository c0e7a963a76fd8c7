use anyhow::Result;
use chrono::Utc;
use contracts::domain::a010_jd_comment::aggregate::{JdComment, JdCommentId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::codec::{from_json_text, to_json_text};
use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a010_jd_comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub sku_id: i64,
    pub jd_comment_id: i64,
    pub score: i32,
    pub content: String,
    pub nickname: Option<String>,
    pub images_json: String,
    pub commented_at: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdComment {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdComment {
            base: BaseAggregate::with_metadata(
                JdCommentId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            sku_id: m.sku_id,
            jd_comment_id: m.jd_comment_id,
            score: m.score,
            content: m.content,
            nickname: m.nickname,
            images: from_json_text(&m.images_json, "images_json"),
            commented_at: m.commented_at,
        }
    }
}

/// Upsert по JD comment id; true = вставлен
pub async fn upsert(item: &JdComment) -> Result<bool> {
    let db = get_connection();
    let images_json = to_json_text(&item.images)?;

    if let Some(existing) = Entity::find()
        .filter(Column::JdCommentId.eq(item.jd_comment_id))
        .one(db)
        .await?
    {
        let version = existing.version;
        let mut active: ActiveModel = existing.into();
        active.score = Set(item.score);
        active.content = Set(item.content.clone());
        active.nickname = Set(item.nickname.clone());
        active.images_json = Set(images_json);
        active.commented_at = Set(item.commented_at.clone());
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
            sku_id: Set(item.sku_id),
            jd_comment_id: Set(item.jd_comment_id),
            score: Set(item.score),
            content: Set(item.content.clone()),
            nickname: Set(item.nickname.clone()),
            images_json: Set(images_json),
            commented_at: Set(item.commented_at.clone()),
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
