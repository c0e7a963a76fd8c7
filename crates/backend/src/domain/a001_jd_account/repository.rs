use chrono::Utc;
use contracts::domain::a001_jd_account::aggregate::{JdAccount, JdAccountId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_jd_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub app_key: String,
    pub app_secret: String,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub scope: Option<String>,
    pub open_id: Option<String>,
    pub uid: Option<String>,
    pub is_valid: bool,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdAccount {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdAccount {
            base: BaseAggregate::with_metadata(
                JdAccountId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            app_key: m.app_key,
            app_secret: m.app_secret,
            access_token: m.access_token,
            access_token_expires_at: m.access_token_expires_at,
            refresh_token: m.refresh_token,
            refresh_token_expires_at: m.refresh_token_expires_at,
            scope: m.scope,
            open_id: m.open_id,
            uid: m.uid,
            is_valid: m.is_valid,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn active_model(aggregate: &JdAccount) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        app_key: Set(aggregate.app_key.clone()),
        app_secret: Set(aggregate.app_secret.clone()),
        access_token: Set(aggregate.access_token.clone()),
        access_token_expires_at: Set(aggregate.access_token_expires_at),
        refresh_token: Set(aggregate.refresh_token.clone()),
        refresh_token_expires_at: Set(aggregate.refresh_token_expires_at),
        scope: Set(aggregate.scope.clone()),
        open_id: Set(aggregate.open_id.clone()),
        uid: Set(aggregate.uid.clone()),
        is_valid: Set(aggregate.is_valid),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

pub async fn list_all() -> anyhow::Result<Vec<JdAccount>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Description)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Аккаунты, участвующие в синхронизации
pub async fn list_valid() -> anyhow::Result<Vec<JdAccount>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::IsValid.eq(true))
        .order_by_asc(Column::Description)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<JdAccount>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn get_by_app_key(app_key: &str) -> anyhow::Result<Option<JdAccount>> {
    let result = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::AppKey.eq(app_key))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &JdAccount) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    active_model(aggregate).insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &JdAccount) -> anyhow::Result<()> {
    let mut active = active_model(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}
