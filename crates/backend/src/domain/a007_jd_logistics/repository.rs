use anyhow::Result;
use chrono::Utc;
use contracts::domain::a007_jd_logistics::aggregate::{JdLogistics, JdLogisticsId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::codec::{from_json_text, to_json_text};
use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a007_jd_logistics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub carrier: Option<String>,
    pub waybill_code: Option<String>,
    pub traces_json: String,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdLogistics {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdLogistics {
            base: BaseAggregate::with_metadata(
                JdLogisticsId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            order_ref: m.order_ref,
            jd_order_id: m.jd_order_id,
            carrier: m.carrier,
            waybill_code: m.waybill_code,
            traces: from_json_text(&m.traces_json, "traces_json"),
            last_synced_at: m.last_synced_at,
        }
    }
}

pub async fn get_by_order(order_ref: &str) -> Result<Option<JdLogistics>> {
    let db = get_connection();
    let model = Entity::find()
        .filter(Column::OrderRef.eq(order_ref))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

/// Upsert по заказу (одна запись доставки на заказ); true = вставлена
pub async fn upsert(item: &JdLogistics) -> Result<bool> {
    let db = get_connection();
    let traces_json = to_json_text(&item.traces)?;

    if let Some(existing) = Entity::find()
        .filter(Column::OrderRef.eq(item.order_ref.as_str()))
        .one(db)
        .await?
    {
        let version = existing.version;
        let mut active: ActiveModel = existing.into();
        active.carrier = Set(item.carrier.clone());
        active.waybill_code = Set(item.waybill_code.clone());
        active.traces_json = Set(traces_json);
        active.last_synced_at = Set(item.last_synced_at);
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
            order_ref: Set(item.order_ref.clone()),
            jd_order_id: Set(item.jd_order_id),
            carrier: Set(item.carrier.clone()),
            waybill_code: Set(item.waybill_code.clone()),
            traces_json: Set(traces_json),
            last_synced_at: Set(item.last_synced_at),
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
