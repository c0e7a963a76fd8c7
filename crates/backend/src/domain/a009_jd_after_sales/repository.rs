use anyhow::Result;
use chrono::Utc;
use contracts::domain::a009_jd_after_sales::aggregate::{
    AfterSalesState, AfterSalesType, JdAfterSales, JdAfterSalesId,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::codec::{enum_from_text, enum_to_text, from_json_text, to_json_text};
use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a009_jd_after_sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub sku_id: i64,
    pub service_type: String,
    pub quantity: i32,
    pub reason: String,
    pub image_urls_json: String,
    pub pickware_type: i32,
    pub afs_service_id: Option<i64>,
    pub state: String,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdAfterSales {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdAfterSales {
            base: BaseAggregate::with_metadata(
                JdAfterSalesId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            order_ref: m.order_ref,
            jd_order_id: m.jd_order_id,
            sku_id: m.sku_id,
            service_type: enum_from_text(&m.service_type).unwrap_or(AfterSalesType::Return),
            quantity: m.quantity,
            reason: m.reason,
            image_urls: from_json_text(&m.image_urls_json, "image_urls_json"),
            pickware_type: m.pickware_type,
            afs_service_id: m.afs_service_id,
            state: enum_from_text(&m.state).unwrap_or(AfterSalesState::Processing),
            applied_at: m.applied_at,
        }
    }
}

fn active_model(a: &JdAfterSales) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(a.base.id.value().to_string()),
        code: Set(a.base.code.clone()),
        description: Set(a.base.description.clone()),
        comment: Set(a.base.comment.clone()),
        order_ref: Set(a.order_ref.clone()),
        jd_order_id: Set(a.jd_order_id),
        sku_id: Set(a.sku_id),
        service_type: Set(enum_to_text(&a.service_type)),
        quantity: Set(a.quantity),
        reason: Set(a.reason.clone()),
        image_urls_json: Set(to_json_text(&a.image_urls)?),
        pickware_type: Set(a.pickware_type),
        afs_service_id: Set(a.afs_service_id),
        state: Set(enum_to_text(&a.state)),
        applied_at: Set(a.applied_at),
        is_deleted: Set(a.base.metadata.is_deleted),
        is_posted: Set(a.base.metadata.is_posted),
        created_at: Set(Some(a.base.metadata.created_at)),
        updated_at: Set(Some(a.base.metadata.updated_at)),
        version: Set(a.base.metadata.version),
    })
}

pub async fn get_by_afs_service_id(afs_service_id: i64) -> Result<Option<JdAfterSales>> {
    let db = get_connection();
    let model = Entity::find()
        .filter(Column::AfsServiceId.eq(afs_service_id))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

pub async fn insert(item: &JdAfterSales) -> Result<Uuid> {
    let db = get_connection();
    active_model(item)?.insert(db).await?;
    Ok(item.base.id.value())
}

pub async fn update(item: &JdAfterSales) -> Result<()> {
    let db = get_connection();
    let mut active = active_model(item)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}
