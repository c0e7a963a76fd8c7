use contracts::domain::a003_jd_sku::aggregate::{
    SkuBaseInfo, SkuBigFieldInfo, SkuBookInfo, SkuImage, SkuImageInfo, SkuPrice,
    SkuSpecification, SkuStock, SpecAttribute, SpecGroup,
};
use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{area_param, lenient};
use crate::shared::jd_cloud::{Client, Credentials, JdError};

pub const METHOD_SKU_LIST: &str = "jingdong.ctp.ware.sku.getSkuList";
pub const METHOD_SKU_DETAIL: &str = "jingdong.ctp.ware.sku.getSkuDetail";
pub const METHOD_SKU_PRICE: &str = "jingdong.ctp.ware.price.getSkuPriceInfoList";
pub const METHOD_AREA_STOCK: &str = "jingdong.ctp.ware.stock.queryAreaStockState";
pub const METHOD_CATEGORY_LIST: &str = "jingdong.ctp.ware.category.getCategoryList";

// ============================================================================
// SKU list
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuListEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub sku_id: i64,
    #[serde(default)]
    pub sku_name: String,
    pub category_id1: Option<i64>,
    pub category_id2: Option<i64>,
    pub category_id3: Option<i64>,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
    pub model: Option<String>,
    pub upc: Option<String>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub weight: Option<f64>,
    pub product_area: Option<String>,
    #[serde(default)]
    pub sku_status: i32,
    /// 1 = самостоятельная торговля JD
    #[serde(default)]
    pub owner_type: i32,
}

impl SkuListEntry {
    pub fn to_base_info(&self) -> SkuBaseInfo {
        SkuBaseInfo {
            sku_name: self.sku_name.clone(),
            category_id1: self.category_id1,
            category_id2: self.category_id2,
            category_id3: self.category_id3,
            brand_id: self.brand_id,
            brand_name: self.brand_name.clone(),
            model: self.model.clone(),
            upc: self.upc.clone(),
            unit: self.unit.clone(),
            weight: self.weight,
            product_area: self.product_area.clone(),
            sale_state: self.sku_status,
            is_self_operated: self.owner_type == 1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuListPage {
    #[serde(default)]
    pub entries: Vec<SkuListEntry>,
    pub page_no: Option<i64>,
    pub total_page: Option<i64>,
    pub total_count: Option<i64>,
}

pub fn sku_list_params(page_no: u32, page_size: u32) -> Value {
    json!({"skuListParam": {"pageNo": page_no, "pageSize": page_size}})
}

pub async fn fetch_sku_page(
    client: &Client,
    creds: &Credentials,
    page_no: u32,
    page_size: u32,
) -> Result<SkuListPage, JdError> {
    client
        .execute_as(creds, METHOD_SKU_LIST, &sku_list_params(page_no, page_size))
        .await
}

// ============================================================================
// SKU detail
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub path: String,
    #[serde(default)]
    pub order_sort: i32,
    #[serde(default)]
    pub is_primary: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecAttributeEntry {
    pub att_name: String,
    #[serde(default)]
    pub val_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecGroupEntry {
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub attributes: Vec<SpecAttributeEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigFieldEntry {
    pub pc_wdis: Option<String>,
    pub mobile_wdis: Option<String>,
    #[serde(rename = "wareQD")]
    pub ware_qd: Option<String>,
    pub after_sale_service: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookEntry {
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publishers: Option<String>,
    pub publish_time: Option<String>,
    pub batch_no: Option<String>,
    pub pages: Option<i32>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuDetailEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub sku_id: i64,
    pub sku_base_info: Option<SkuListEntry>,
    #[serde(default)]
    pub image_infos: Vec<ImageEntry>,
    #[serde(default)]
    pub specifications: Vec<SpecGroupEntry>,
    pub sku_big_field_info: Option<BigFieldEntry>,
    pub book_sku_base_info: Option<BookEntry>,
}

impl SkuDetailEntry {
    pub fn image_info(&self) -> SkuImageInfo {
        SkuImageInfo::from_images(
            self.image_infos
                .iter()
                .map(|i| SkuImage {
                    path: i.path.clone(),
                    order_sort: i.order_sort,
                    is_primary: i.is_primary == 1,
                })
                .collect(),
        )
    }

    pub fn specification(&self) -> SkuSpecification {
        SkuSpecification {
            groups: self
                .specifications
                .iter()
                .map(|g| SpecGroup {
                    name: g.group_name.clone(),
                    attributes: g
                        .attributes
                        .iter()
                        .map(|a| SpecAttribute {
                            name: a.att_name.clone(),
                            value: a.val_names.join(", "),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn big_field(&self) -> SkuBigFieldInfo {
        self.sku_big_field_info
            .as_ref()
            .map(|b| SkuBigFieldInfo {
                pc_intro_html: b.pc_wdis.clone(),
                mobile_intro_html: b.mobile_wdis.clone(),
                packing_list: b.ware_qd.clone(),
                after_sale_service: b.after_sale_service.clone(),
            })
            .unwrap_or_default()
    }

    pub fn book_info(&self) -> Option<SkuBookInfo> {
        self.book_sku_base_info.as_ref().map(|b| SkuBookInfo {
            isbn: b.isbn.clone(),
            author: b.author.clone(),
            publisher: b.publishers.clone(),
            publish_time: b.publish_time.clone(),
            edition: b.batch_no.clone(),
            pages: b.pages,
            language: b.language.clone(),
        })
    }
}

pub fn sku_detail_params(sku_ids: &[i64]) -> Value {
    json!({"skuDetailParam": {"skuIdSet": sku_ids, "detailAssemblyType": 0}})
}

/// Детали SKU вместе с исходным JSON каждой записи
pub async fn fetch_sku_details(
    client: &Client,
    creds: &Credentials,
    sku_ids: &[i64],
) -> Result<Vec<(SkuDetailEntry, Value)>, JdError> {
    let value = client
        .execute(creds, METHOD_SKU_DETAIL, &sku_detail_params(sku_ids))
        .await?;
    decode_details(value)
}

pub fn decode_details(value: Value) -> Result<Vec<(SkuDetailEntry, Value)>, JdError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    let mut decoded = Vec::with_capacity(items.len());
    for raw in items {
        let entry: SkuDetailEntry = serde_json::from_value(raw.clone())?;
        decoded.push((entry, raw));
    }
    Ok(decoded)
}

// ============================================================================
// Price
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPriceEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub sku_id: i64,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub jd_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub market_price: Option<f64>,
}

impl SkuPriceEntry {
    pub fn to_price(&self) -> SkuPrice {
        SkuPrice {
            jd_price: self.jd_price,
            market_price: self.market_price,
        }
    }
}

pub fn sku_price_params(sku_ids: &[i64]) -> Value {
    json!({"skuPriceInfoParam": {"skuIdSet": sku_ids}})
}

pub async fn fetch_prices(
    client: &Client,
    creds: &Credentials,
    sku_ids: &[i64],
) -> Result<Vec<SkuPriceEntry>, JdError> {
    client
        .execute_as(creds, METHOD_SKU_PRICE, &sku_price_params(sku_ids))
        .await
}

// ============================================================================
// Stock
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub sku_id: i64,
    #[serde(default)]
    pub stock_state_id: i32,
    pub stock_state_desc: Option<String>,
    pub remain_num: Option<i64>,
}

impl StockEntry {
    pub fn to_stock(&self, area: &JdArea) -> SkuStock {
        SkuStock {
            state_id: self.stock_state_id,
            state_desc: self.stock_state_desc.clone(),
            remain_num: self.remain_num,
            area: area.as_key(),
        }
    }
}

pub fn area_stock_params(sku_ids: &[i64], area: &JdArea) -> Value {
    let sku_quantity: Vec<Value> = sku_ids
        .iter()
        .map(|id| json!({"skuId": id, "quantity": 1}))
        .collect();
    json!({"areaStockStateParam": {"skuQuantityList": sku_quantity, "address": area_param(area)}})
}

pub async fn fetch_area_stock(
    client: &Client,
    creds: &Credentials,
    sku_ids: &[i64],
    area: &JdArea,
) -> Result<Vec<StockEntry>, JdError> {
    client
        .execute_as(creds, METHOD_AREA_STOCK, &area_stock_params(sku_ids, area))
        .await
}

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub category_id: i64,
    #[serde(default)]
    pub parent_id: i64,
    #[serde(default)]
    pub category_name: String,
    #[serde(default = "default_state")]
    pub state: i32,
}

fn default_state() -> i32 {
    1
}

pub fn category_params(parent_id: i64) -> Value {
    json!({"categoryParam": {"parentId": parent_id}})
}

pub async fn fetch_categories(
    client: &Client,
    creds: &Credentials,
    parent_id: i64,
) -> Result<Vec<CategoryEntry>, JdError> {
    client
        .execute_as(creds, METHOD_CATEGORY_LIST, &category_params(parent_id))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_entry_maps_value_objects() {
        let entry: SkuDetailEntry = serde_json::from_value(json!({
            "skuId": "100",
            "imageInfos": [
                {"path": "jfs/2.jpg", "orderSort": 2, "isPrimary": 0},
                {"path": "jfs/1.jpg", "orderSort": 1, "isPrimary": 1}
            ],
            "specifications": [
                {"groupName": "主体", "attributes": [{"attName": "颜色", "valNames": ["黑", "白"]}]}
            ],
            "skuBigFieldInfo": {"pcWdis": "<p>intro</p>", "wareQD": "主机 x1"},
            "bookSkuBaseInfo": {"isbn": "9787111213826", "publishers": "机械工业出版社", "pages": 880}
        }))
        .unwrap();

        assert_eq!(entry.image_info().main_image.as_deref(), Some("jfs/1.jpg"));
        let spec = entry.specification();
        assert_eq!(spec.groups[0].attributes[0].value, "黑, 白");
        assert_eq!(entry.big_field().packing_list.as_deref(), Some("主机 x1"));
        assert_eq!(entry.big_field().pc_intro_html.as_deref(), Some("<p>intro</p>"));
        let book = entry.book_info().unwrap();
        assert_eq!(book.publisher.as_deref(), Some("机械工业出版社"));
        assert_eq!(book.pages, Some(880));
    }

    #[test]
    fn test_decode_details_keeps_raw() {
        let decoded = decode_details(json!([{"skuId": 1}, {"skuId": "2", "imageInfos": []}])).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].0.sku_id, 2);
        assert_eq!(decoded[1].1["skuId"], "2");
        assert!(decode_details(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_list_entry_base_info() {
        let entry: SkuListEntry = serde_json::from_value(json!({
            "skuId": 5, "skuName": "Kettle", "skuStatus": 1, "ownerType": 1, "weight": "1.25"
        }))
        .unwrap();
        let info = entry.to_base_info();
        assert!(info.is_self_operated);
        assert_eq!(info.sale_state, 1);
        assert_eq!(info.weight, Some(1.25));
    }

    #[test]
    fn test_stock_params_include_area() {
        let area = JdArea {
            province_id: 2,
            city_id: 2830,
            county_id: 51800,
            town_id: 0,
        };
        let params = area_stock_params(&[1, 2], &area);
        let inner = &params["areaStockStateParam"];
        assert_eq!(inner["skuQuantityList"].as_array().unwrap().len(), 2);
        assert_eq!(inner["address"]["cityId"], 2830);
    }
}
