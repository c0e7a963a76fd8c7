use anyhow::Result;
use chrono::Utc;
use contracts::domain::a008_jd_invoice::aggregate::{
    InvoiceState, InvoiceTitleType, InvoiceType, JdInvoice, JdInvoiceId,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::codec::{enum_from_text, enum_to_text};
use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a008_jd_invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub invoice_type: String,
    pub title_type: String,
    pub title: String,
    pub tax_no: Option<String>,
    pub state: String,
    pub invoice_code: Option<String>,
    pub invoice_no: Option<String>,
    pub amount: Option<f64>,
    pub file_url: Option<String>,
    pub issued_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdInvoice {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdInvoice {
            base: BaseAggregate::with_metadata(
                JdInvoiceId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            order_ref: m.order_ref,
            jd_order_id: m.jd_order_id,
            invoice_type: enum_from_text(&m.invoice_type).unwrap_or(InvoiceType::Normal),
            title_type: enum_from_text(&m.title_type).unwrap_or(InvoiceTitleType::Personal),
            title: m.title,
            tax_no: m.tax_no,
            state: enum_from_text(&m.state).unwrap_or(InvoiceState::Applied),
            invoice_code: m.invoice_code,
            invoice_no: m.invoice_no,
            amount: m.amount,
            file_url: m.file_url,
            issued_at: m.issued_at,
        }
    }
}

fn active_model(i: &JdInvoice) -> ActiveModel {
    ActiveModel {
        id: Set(i.base.id.value().to_string()),
        code: Set(i.base.code.clone()),
        description: Set(i.base.description.clone()),
        comment: Set(i.base.comment.clone()),
        order_ref: Set(i.order_ref.clone()),
        jd_order_id: Set(i.jd_order_id),
        invoice_type: Set(enum_to_text(&i.invoice_type)),
        title_type: Set(enum_to_text(&i.title_type)),
        title: Set(i.title.clone()),
        tax_no: Set(i.tax_no.clone()),
        state: Set(enum_to_text(&i.state)),
        invoice_code: Set(i.invoice_code.clone()),
        invoice_no: Set(i.invoice_no.clone()),
        amount: Set(i.amount),
        file_url: Set(i.file_url.clone()),
        issued_at: Set(i.issued_at),
        is_deleted: Set(i.base.metadata.is_deleted),
        is_posted: Set(i.base.metadata.is_posted),
        created_at: Set(Some(i.base.metadata.created_at)),
        updated_at: Set(Some(i.base.metadata.updated_at)),
        version: Set(i.base.metadata.version),
    }
}

pub async fn list_by_order(order_ref: &str) -> Result<Vec<JdInvoice>> {
    let db = get_connection();
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::OrderRef.eq(order_ref))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert(invoice: &JdInvoice) -> Result<Uuid> {
    let db = get_connection();
    active_model(invoice).insert(db).await?;
    Ok(invoice.base.id.value())
}

pub async fn update(invoice: &JdInvoice) -> Result<()> {
    let db = get_connection();
    let mut active = active_model(invoice);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}
