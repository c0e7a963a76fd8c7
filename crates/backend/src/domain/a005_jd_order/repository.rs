use anyhow::Result;
use chrono::Utc;
use contracts::domain::a005_jd_order::aggregate::{JdOrder, JdOrderId, JdOrderState};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::codec::{from_json_text, to_json_text};
use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a005_jd_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub account_ref: String,
    pub third_order_id: String,
    pub jd_order_id: Option<i64>,
    pub state: String,
    pub items_json: String,
    pub address_json: String,
    pub freight: f64,
    pub total_amount: f64,
    pub remark: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdOrder {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        let state = JdOrderState::parse(&m.state).unwrap_or_else(|| {
            tracing::warn!("Unknown order state '{}' for order {}", m.state, m.id);
            JdOrderState::Submitted
        });

        JdOrder {
            base: BaseAggregate::with_metadata(
                JdOrderId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            account_ref: m.account_ref,
            third_order_id: m.third_order_id,
            jd_order_id: m.jd_order_id,
            state,
            items: from_json_text(&m.items_json, "items_json"),
            address: from_json_text(&m.address_json, "address_json"),
            freight: m.freight,
            total_amount: m.total_amount,
            remark: m.remark,
            submitted_at: m.submitted_at,
            last_synced_at: m.last_synced_at,
            last_error: m.last_error,
        }
    }
}

fn active_model(order: &JdOrder) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(order.base.id.value().to_string()),
        code: Set(order.base.code.clone()),
        description: Set(order.base.description.clone()),
        comment: Set(order.base.comment.clone()),
        account_ref: Set(order.account_ref.clone()),
        third_order_id: Set(order.third_order_id.clone()),
        jd_order_id: Set(order.jd_order_id),
        state: Set(order.state.as_str().to_string()),
        items_json: Set(to_json_text(&order.items)?),
        address_json: Set(to_json_text(&order.address)?),
        freight: Set(order.freight),
        total_amount: Set(order.total_amount),
        remark: Set(order.remark.clone()),
        submitted_at: Set(order.submitted_at),
        last_synced_at: Set(order.last_synced_at),
        last_error: Set(order.last_error.clone()),
        is_deleted: Set(order.base.metadata.is_deleted),
        is_posted: Set(order.base.metadata.is_posted),
        created_at: Set(Some(order.base.metadata.created_at)),
        updated_at: Set(Some(order.base.metadata.updated_at)),
        version: Set(order.base.metadata.version),
    })
}

pub async fn get_by_id(id: Uuid) -> Result<Option<JdOrder>> {
    let db = get_connection();
    let model = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(model.map(Into::into))
}

pub async fn get_by_third_order_id(third_order_id: &str) -> Result<Option<JdOrder>> {
    let db = get_connection();
    let model = Entity::find()
        .filter(Column::ThirdOrderId.eq(third_order_id))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

pub async fn get_by_jd_order_id(jd_order_id: i64) -> Result<Option<JdOrder>> {
    let db = get_connection();
    let model = Entity::find()
        .filter(Column::JdOrderId.eq(jd_order_id))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

/// Заказы, отправленные в JD и еще не завершенные
pub async fn list_open(account_ref: &str) -> Result<Vec<JdOrder>> {
    let db = get_connection();
    let final_states: Vec<&str> = [
        JdOrderState::Completed,
        JdOrderState::Cancelled,
        JdOrderState::Failed,
    ]
    .iter()
    .map(JdOrderState::as_str)
    .collect();

    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::AccountRef.eq(account_ref))
        .filter(Column::JdOrderId.is_not_null())
        .filter(Column::State.is_not_in(final_states))
        .order_by_asc(Column::SubmittedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert(order: &JdOrder) -> Result<Uuid> {
    let db = get_connection();
    active_model(order)?.insert(db).await?;
    Ok(order.base.id.value())
}

pub async fn update(order: &JdOrder) -> Result<()> {
    let db = get_connection();
    let mut active = active_model(order)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}
