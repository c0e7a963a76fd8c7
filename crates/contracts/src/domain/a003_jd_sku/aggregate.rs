use crate::domain::common::{AggregateId, BaseAggregate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdSkuId);

// ============================================================================
// Value objects
// ============================================================================

/// Базовая информация о товаре (из списка SKU)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuBaseInfo {
    pub sku_name: String,
    pub category_id1: Option<i64>,
    pub category_id2: Option<i64>,
    pub category_id3: Option<i64>,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
    pub model: Option<String>,
    pub upc: Option<String>,
    pub unit: Option<String>,
    /// Вес, кг
    pub weight: Option<f64>,
    pub product_area: Option<String>,
    /// 1 = в продаже, 0 = снят с продажи
    pub sale_state: i32,
    pub is_self_operated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuImage {
    pub path: String,
    pub order_sort: i32,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuImageInfo {
    pub main_image: Option<String>,
    pub images: Vec<SkuImage>,
}

impl SkuImageInfo {
    /// Собрать из списка картинок: упорядочить и выбрать главную
    pub fn from_images(mut images: Vec<SkuImage>) -> Self {
        images.sort_by_key(|i| i.order_sort);
        let main_image = images
            .iter()
            .find(|i| i.is_primary)
            .or_else(|| images.first())
            .map(|i| i.path.clone());
        Self { main_image, images }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecGroup {
    pub name: String,
    pub attributes: Vec<SpecAttribute>,
}

/// Характеристики товара, сгруппированные как на карточке JD
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuSpecification {
    pub groups: Vec<SpecGroup>,
}

/// Крупные текстовые поля (HTML описания, комплектация)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuBigFieldInfo {
    pub pc_intro_html: Option<String>,
    pub mobile_intro_html: Option<String>,
    pub packing_list: Option<String>,
    pub after_sale_service: Option<String>,
}

/// Информация о книге (только для книжных SKU)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuBookInfo {
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publish_time: Option<String>,
    pub edition: Option<String>,
    pub pages: Option<i32>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPrice {
    pub jd_price: Option<f64>,
    pub market_price: Option<f64>,
}

/// Состояние остатка для конкретной территории
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuStock {
    /// 33 = в наличии, 34 = нет в наличии, 36 = под заказ, 39/40 = в пути
    pub state_id: i32,
    pub state_desc: Option<String>,
    pub remain_num: Option<i64>,
    /// "province_city_county_town"
    pub area: String,
}

impl SkuStock {
    pub fn is_available(&self) -> bool {
        matches!(self.state_id, 33 | 39 | 40)
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Товар JD, привязанный к учетной записи
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdSku {
    #[serde(flatten)]
    pub base: BaseAggregate<JdSkuId>,
    pub account_ref: String,
    pub sku_id: i64,

    pub base_info: SkuBaseInfo,
    pub image_info: SkuImageInfo,
    pub specification: SkuSpecification,
    pub big_field: SkuBigFieldInfo,
    pub book_info: Option<SkuBookInfo>,

    pub price: SkuPrice,
    pub stock: Option<SkuStock>,

    pub detail_updated_at: Option<DateTime<Utc>>,
    pub price_updated_at: Option<DateTime<Utc>>,
    pub stock_updated_at: Option<DateTime<Utc>>,
}

impl JdSku {
    pub fn new_for_insert(account_ref: String, sku_id: i64, base_info: SkuBaseInfo) -> Self {
        let base = BaseAggregate::new(
            JdSkuId::new_v4(),
            format!("JD-SKU-{}", sku_id),
            base_info.sku_name.clone(),
        );
        Self {
            base,
            account_ref,
            sku_id,
            base_info,
            image_info: SkuImageInfo::default(),
            specification: SkuSpecification::default(),
            big_field: SkuBigFieldInfo::default(),
            book_info: None,
            price: SkuPrice::default(),
            stock: None,
            detail_updated_at: None,
            price_updated_at: None,
            stock_updated_at: None,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Обновить базовую информацию; возвращает true, если что-то изменилось
    pub fn apply_base_info(&mut self, base_info: SkuBaseInfo) -> bool {
        if self.base_info == base_info {
            return false;
        }
        self.base.description = base_info.sku_name.clone();
        self.base_info = base_info;
        true
    }

    pub fn apply_detail(
        &mut self,
        image_info: SkuImageInfo,
        specification: SkuSpecification,
        big_field: SkuBigFieldInfo,
        book_info: Option<SkuBookInfo>,
        now: DateTime<Utc>,
    ) {
        self.image_info = image_info;
        self.specification = specification;
        self.big_field = big_field;
        self.book_info = book_info;
        self.detail_updated_at = Some(now);
    }

    pub fn apply_price(&mut self, price: SkuPrice, now: DateTime<Utc>) {
        self.price = price;
        self.price_updated_at = Some(now);
    }

    pub fn apply_stock(&mut self, stock: SkuStock, now: DateTime<Utc>) {
        self.stock = Some(stock);
        self.stock_updated_at = Some(now);
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sku_id <= 0 {
            return Err("SKU id must be positive".into());
        }
        if self.account_ref.trim().is_empty() {
            return Err("Account reference is required".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

/// Какая часть данных SKU синхронизируется
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuFreshnessField {
    Detail,
    Price,
    Stock,
}

impl SkuFreshnessField {
    pub fn last_update(&self, sku: &JdSku) -> Option<DateTime<Utc>> {
        match self {
            Self::Detail => sku.detail_updated_at,
            Self::Price => sku.price_updated_at,
            Self::Stock => sku.stock_updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(path: &str, order: i32, primary: bool) -> SkuImage {
        SkuImage {
            path: path.into(),
            order_sort: order,
            is_primary: primary,
        }
    }

    #[test]
    fn test_image_info_prefers_primary() {
        let info = SkuImageInfo::from_images(vec![
            image("b.jpg", 2, false),
            image("c.jpg", 3, true),
            image("a.jpg", 1, false),
        ]);
        assert_eq!(info.main_image.as_deref(), Some("c.jpg"));
        assert_eq!(info.images[0].path, "a.jpg");
    }

    #[test]
    fn test_image_info_falls_back_to_first() {
        let info = SkuImageInfo::from_images(vec![image("b.jpg", 2, false), image("a.jpg", 1, false)]);
        assert_eq!(info.main_image.as_deref(), Some("a.jpg"));
        assert_eq!(SkuImageInfo::from_images(vec![]).main_image, None);
    }

    #[test]
    fn test_apply_base_info_detects_changes() {
        let info = SkuBaseInfo {
            sku_name: "Phone".into(),
            sale_state: 1,
            ..Default::default()
        };
        let mut sku = JdSku::new_for_insert("acc".into(), 100, info.clone());
        assert!(!sku.apply_base_info(info.clone()));

        let renamed = SkuBaseInfo {
            sku_name: "Phone Pro".into(),
            ..info
        };
        assert!(sku.apply_base_info(renamed));
        assert_eq!(sku.base.description, "Phone Pro");
    }

    #[test]
    fn test_freshness_field_reads_matching_timestamp() {
        let now = Utc::now();
        let mut sku = JdSku::new_for_insert("acc".into(), 1, SkuBaseInfo::default());
        sku.apply_price(SkuPrice::default(), now);
        assert_eq!(SkuFreshnessField::Price.last_update(&sku), Some(now));
        assert_eq!(SkuFreshnessField::Stock.last_update(&sku), None);
    }

    #[test]
    fn test_stock_availability() {
        let mut stock = SkuStock {
            state_id: 33,
            ..Default::default()
        };
        assert!(stock.is_available());
        stock.state_id = 34;
        assert!(!stock.is_available());
    }
}
