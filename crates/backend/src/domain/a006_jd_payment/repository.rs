use anyhow::Result;
use chrono::Utc;
use contracts::domain::a006_jd_payment::aggregate::{JdPayment, JdPaymentId, JdPaymentState};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a006_jd_payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub pay_type: i32,
    pub amount: f64,
    pub state: String,
    pub jd_pay_id: Option<String>,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdPayment {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdPayment {
            base: BaseAggregate::with_metadata(
                JdPaymentId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            order_ref: m.order_ref,
            jd_order_id: m.jd_order_id,
            pay_type: m.pay_type,
            amount: m.amount,
            state: JdPaymentState::parse(&m.state),
            jd_pay_id: m.jd_pay_id,
            paid_at: m.paid_at,
            error: m.error,
        }
    }
}

fn active_model(p: &JdPayment) -> ActiveModel {
    ActiveModel {
        id: Set(p.base.id.value().to_string()),
        code: Set(p.base.code.clone()),
        description: Set(p.base.description.clone()),
        comment: Set(p.base.comment.clone()),
        order_ref: Set(p.order_ref.clone()),
        jd_order_id: Set(p.jd_order_id),
        pay_type: Set(p.pay_type),
        amount: Set(p.amount),
        state: Set(p.state.as_str().to_string()),
        jd_pay_id: Set(p.jd_pay_id.clone()),
        paid_at: Set(p.paid_at),
        error: Set(p.error.clone()),
        is_deleted: Set(p.base.metadata.is_deleted),
        is_posted: Set(p.base.metadata.is_posted),
        created_at: Set(Some(p.base.metadata.created_at)),
        updated_at: Set(Some(p.base.metadata.updated_at)),
        version: Set(p.base.metadata.version),
    }
}

pub async fn list_by_order(order_ref: &str) -> Result<Vec<JdPayment>> {
    let db = get_connection();
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::OrderRef.eq(order_ref))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert(payment: &JdPayment) -> Result<Uuid> {
    let db = get_connection();
    active_model(payment).insert(db).await?;
    Ok(payment.base.id.value())
}

pub async fn update(payment: &JdPayment) -> Result<()> {
    let db = get_connection();
    let mut active = active_model(payment);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}
