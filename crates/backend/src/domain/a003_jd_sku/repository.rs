use anyhow::Result;
use chrono::Utc;
use contracts::domain::a003_jd_sku::aggregate::{JdSku, JdSkuId, SkuPrice, SkuStock};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::codec::{from_json_text, to_json_text};
use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_jd_sku")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub account_ref: String,
    pub sku_id: i64,
    pub base_info_json: String,
    pub image_info_json: String,
    pub specification_json: String,
    pub big_field_json: String,
    pub book_info_json: Option<String>,
    pub jd_price: Option<f64>,
    pub market_price: Option<f64>,
    pub stock_json: Option<String>,
    pub detail_updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub price_updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stock_updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdSku {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdSku {
            base: BaseAggregate::with_metadata(
                JdSkuId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            account_ref: m.account_ref,
            sku_id: m.sku_id,
            base_info: from_json_text(&m.base_info_json, "base_info_json"),
            image_info: from_json_text(&m.image_info_json, "image_info_json"),
            specification: from_json_text(&m.specification_json, "specification_json"),
            big_field: from_json_text(&m.big_field_json, "big_field_json"),
            book_info: m
                .book_info_json
                .as_deref()
                .map(|t| from_json_text(t, "book_info_json")),
            price: SkuPrice {
                jd_price: m.jd_price,
                market_price: m.market_price,
            },
            stock: m
                .stock_json
                .as_deref()
                .map(|t| from_json_text::<SkuStock>(t, "stock_json")),
            detail_updated_at: m.detail_updated_at,
            price_updated_at: m.price_updated_at,
            stock_updated_at: m.stock_updated_at,
        }
    }
}

fn active_model(sku: &JdSku) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(sku.base.id.value().to_string()),
        code: Set(sku.base.code.clone()),
        description: Set(sku.base.description.clone()),
        comment: Set(sku.base.comment.clone()),
        account_ref: Set(sku.account_ref.clone()),
        sku_id: Set(sku.sku_id),
        base_info_json: Set(to_json_text(&sku.base_info)?),
        image_info_json: Set(to_json_text(&sku.image_info)?),
        specification_json: Set(to_json_text(&sku.specification)?),
        big_field_json: Set(to_json_text(&sku.big_field)?),
        book_info_json: Set(sku.book_info.as_ref().map(to_json_text).transpose()?),
        jd_price: Set(sku.price.jd_price),
        market_price: Set(sku.price.market_price),
        stock_json: Set(sku.stock.as_ref().map(to_json_text).transpose()?),
        detail_updated_at: Set(sku.detail_updated_at),
        price_updated_at: Set(sku.price_updated_at),
        stock_updated_at: Set(sku.stock_updated_at),
        is_deleted: Set(sku.base.metadata.is_deleted),
        is_posted: Set(sku.base.metadata.is_posted),
        created_at: Set(Some(sku.base.metadata.created_at)),
        updated_at: Set(Some(sku.base.metadata.updated_at)),
        version: Set(sku.base.metadata.version),
    })
}

pub async fn get_by_sku(account_ref: &str, sku_id: i64) -> Result<Option<JdSku>> {
    let db = get_connection();
    let model = Entity::find()
        .filter(Column::AccountRef.eq(account_ref))
        .filter(Column::SkuId.eq(sku_id))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

/// Все SKU аккаунта (для отбора устаревших)
pub async fn list_by_account(account_ref: &str) -> Result<Vec<JdSku>> {
    let db = get_connection();
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::AccountRef.eq(account_ref))
        .order_by_asc(Column::SkuId)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Страница локального каталога
pub async fn list_paginated(
    account_ref: &str,
    search: Option<&str>,
    limit: u64,
    offset: u64,
) -> Result<(Vec<JdSku>, u64)> {
    let db = get_connection();
    let mut query = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::AccountRef.eq(account_ref));
    if let Some(text) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(Column::Description.contains(text));
    }

    let total = query.clone().count(db).await?;
    let items = query
        .order_by_asc(Column::SkuId)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok((items, total))
}

pub async fn insert(sku: &JdSku) -> Result<Uuid> {
    let db = get_connection();
    active_model(sku)?.insert(db).await?;
    Ok(sku.base.id.value())
}

pub async fn update(sku: &JdSku) -> Result<()> {
    let db = get_connection();
    let mut active = active_model(sku)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}
