use chrono::Utc;
use contracts::domain::a004_jd_delivery_address::aggregate::{
    JdArea, JdDeliveryAddress, JdDeliveryAddressId,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_jd_delivery_address")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub account_ref: String,
    pub receiver_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub province_id: i64,
    pub city_id: i64,
    pub county_id: i64,
    pub town_id: i64,
    pub province_name: Option<String>,
    pub city_name: Option<String>,
    pub county_name: Option<String>,
    pub town_name: Option<String>,
    pub detail_address: String,
    pub zip_code: Option<String>,
    pub is_default: bool,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for JdDeliveryAddress {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        JdDeliveryAddress {
            base: BaseAggregate::with_metadata(
                JdDeliveryAddressId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            account_ref: m.account_ref,
            receiver_name: m.receiver_name,
            mobile: m.mobile,
            email: m.email,
            area: JdArea {
                province_id: m.province_id,
                city_id: m.city_id,
                county_id: m.county_id,
                town_id: m.town_id,
            },
            province_name: m.province_name,
            city_name: m.city_name,
            county_name: m.county_name,
            town_name: m.town_name,
            detail_address: m.detail_address,
            zip_code: m.zip_code,
            is_default: m.is_default,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn active_model(a: &JdDeliveryAddress) -> ActiveModel {
    ActiveModel {
        id: Set(a.base.id.value().to_string()),
        code: Set(a.base.code.clone()),
        description: Set(a.base.description.clone()),
        comment: Set(a.base.comment.clone()),
        account_ref: Set(a.account_ref.clone()),
        receiver_name: Set(a.receiver_name.clone()),
        mobile: Set(a.mobile.clone()),
        email: Set(a.email.clone()),
        province_id: Set(a.area.province_id),
        city_id: Set(a.area.city_id),
        county_id: Set(a.area.county_id),
        town_id: Set(a.area.town_id),
        province_name: Set(a.province_name.clone()),
        city_name: Set(a.city_name.clone()),
        county_name: Set(a.county_name.clone()),
        town_name: Set(a.town_name.clone()),
        detail_address: Set(a.detail_address.clone()),
        zip_code: Set(a.zip_code.clone()),
        is_default: Set(a.is_default),
        is_deleted: Set(a.base.metadata.is_deleted),
        is_posted: Set(a.base.metadata.is_posted),
        created_at: Set(Some(a.base.metadata.created_at)),
        updated_at: Set(Some(a.base.metadata.updated_at)),
        version: Set(a.base.metadata.version),
    }
}

pub async fn list_by_account(account_ref: &str) -> anyhow::Result<Vec<JdDeliveryAddress>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::AccountRef.eq(account_ref))
        .order_by_desc(Column::IsDefault)
        .order_by_asc(Column::ReceiverName)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<JdDeliveryAddress>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn get_default(account_ref: &str) -> anyhow::Result<Option<JdDeliveryAddress>> {
    let result = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::AccountRef.eq(account_ref))
        .filter(Column::IsDefault.eq(true))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &JdDeliveryAddress) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    active_model(aggregate).insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &JdDeliveryAddress) -> anyhow::Result<()> {
    let mut active = active_model(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

/// Снять признак "по умолчанию" со всех адресов аккаунта, кроме `except_id`
pub async fn clear_other_default_flags(
    account_ref: &str,
    except_id: Option<Uuid>,
) -> anyhow::Result<()> {
    use sea_orm::sea_query::Expr;
    let mut query = Entity::update_many()
        .col_expr(Column::IsDefault, Expr::value(false))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::AccountRef.eq(account_ref))
        .filter(Column::IsDefault.eq(true));
    if let Some(id) = except_id {
        query = query.filter(Column::Id.ne(id.to_string()));
    }
    query.exec(conn()).await?;
    Ok(())
}

pub async fn soft_delete(id: Uuid) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::IsDefault, Expr::value(false))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::IsDeleted.eq(false))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
