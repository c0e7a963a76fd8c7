use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;
use contracts::domain::a005_jd_order::aggregate::{JdOrder, JdOrderState};
use contracts::domain::a007_jd_logistics::aggregate::LogisticsTrace;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{area_param, lenient};
use crate::shared::jd_cloud::{Client, Credentials, JdError};

pub const METHOD_FREIGHT: &str = "jingdong.ctp.order.getFreight";
pub const METHOD_SUBMIT: &str = "jingdong.ctp.order.submitOrder";
pub const METHOD_DETAIL: &str = "jingdong.ctp.order.getOrderDetail";
pub const METHOD_CANCEL: &str = "jingdong.ctp.order.cancelOrder";
pub const METHOD_CONFIRM: &str = "jingdong.ctp.order.confirmReceived";
pub const METHOD_PAY: &str = "jingdong.ctp.order.payOrder";
pub const METHOD_LOGISTICS: &str = "jingdong.ctp.order.getLogistics";

/// Оплата с предоплаченного баланса
pub const PAY_TYPE_BALANCE: i32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuQuantity {
    pub sku_id: i64,
    pub quantity: i32,
}

// ============================================================================
// Freight
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightResult {
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub freight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub base_freight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub remote_region_freight: Option<f64>,
}

pub fn freight_params(items: &[SkuQuantity], area: &JdArea) -> Value {
    json!({"freightParam": {"skuList": items, "address": area_param(area)}})
}

// ============================================================================
// Submit
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub jd_order_id: i64,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub order_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub freight: Option<f64>,
}

pub fn submit_params(order: &JdOrder) -> Value {
    let sku_list: Vec<Value> = order
        .items
        .iter()
        .map(|i| json!({"skuId": i.sku_id, "quantity": i.quantity, "price": i.price}))
        .collect();
    let mut address = area_param(&order.address.area);
    if let Some(obj) = address.as_object_mut() {
        obj.insert(
            "fullAddress".to_string(),
            Value::String(order.address.full_address.clone()),
        );
    }
    json!({"submitOrderParam": {
        "thirdOrderId": order.third_order_id,
        "skuList": sku_list,
        "receiver": {
            "name": order.address.receiver_name,
            "mobile": order.address.mobile,
        },
        "address": address,
        "orderPrice": order.items_amount(),
        "remark": order.remark.clone().unwrap_or_default(),
        "paymentType": PAY_TYPE_BALANCE,
    }})
}

pub async fn submit(
    client: &Client,
    creds: &Credentials,
    order: &JdOrder,
) -> Result<SubmitResult, JdError> {
    client
        .execute_as(creds, METHOD_SUBMIT, &submit_params(order))
        .await
}

// ============================================================================
// Detail / cancel / confirm / pay
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub jd_order_id: i64,
    #[serde(default = "active_order_state")]
    pub order_state: i32,
    #[serde(default)]
    pub jd_order_state: i32,
    pub pay_state: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub order_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
    pub freight: Option<f64>,
}

fn active_order_state() -> i32 {
    1
}

impl OrderDetail {
    pub fn state(&self) -> JdOrderState {
        JdOrderState::from_jd(self.order_state, self.jd_order_state, self.pay_state)
    }
}

pub fn order_id_params(wrapper: &str, jd_order_id: i64) -> Value {
    let mut root = serde_json::Map::new();
    root.insert(wrapper.to_string(), json!({"jdOrderId": jd_order_id}));
    Value::Object(root)
}

pub fn detail_params(jd_order_id: i64) -> Value {
    order_id_params("orderDetailParam", jd_order_id)
}

pub fn logistics_params(jd_order_id: i64) -> Value {
    order_id_params("logisticsParam", jd_order_id)
}

pub async fn fetch_detail(
    client: &Client,
    creds: &Credentials,
    jd_order_id: i64,
) -> Result<OrderDetail, JdError> {
    client
        .execute_as(creds, METHOD_DETAIL, &detail_params(jd_order_id))
        .await
}

pub async fn cancel(
    client: &Client,
    creds: &Credentials,
    jd_order_id: i64,
    reason: &str,
) -> Result<Value, JdError> {
    let params = json!({"cancelOrderParam": {"jdOrderId": jd_order_id, "cancelReason": reason}});
    client.execute(creds, METHOD_CANCEL, &params).await
}

pub async fn confirm_received(
    client: &Client,
    creds: &Credentials,
    jd_order_id: i64,
) -> Result<Value, JdError> {
    client
        .execute(
            creds,
            METHOD_CONFIRM,
            &order_id_params("confirmReceivedParam", jd_order_id),
        )
        .await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResult {
    pub pay_id: Option<String>,
}

pub async fn pay(
    client: &Client,
    creds: &Credentials,
    jd_order_id: i64,
    pay_type: i32,
) -> Result<PayResult, JdError> {
    let params = json!({"payOrderParam": {"jdOrderId": jd_order_id, "payType": pay_type}});
    let value = client.execute(creds, METHOD_PAY, &params).await?;
    // JD возвращает либо объект, либо просто true
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value)?,
        _ => PayResult::default(),
    })
}

// ============================================================================
// Logistics
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    #[serde(default)]
    pub msg_time: String,
    #[serde(default)]
    pub content: String,
    pub operator: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsResult {
    pub logistics_company: Option<String>,
    pub waybill_code: Option<String>,
    #[serde(default)]
    pub trace_list: Vec<TraceEntry>,
}

impl LogisticsResult {
    pub fn traces(&self) -> Vec<LogisticsTrace> {
        self.trace_list
            .iter()
            .map(|t| LogisticsTrace {
                time: t.msg_time.clone(),
                content: t.content.clone(),
                operator: t.operator.clone(),
            })
            .collect()
    }
}

pub async fn fetch_logistics(
    client: &Client,
    creds: &Credentials,
    jd_order_id: i64,
) -> Result<LogisticsResult, JdError> {
    client
        .execute_as(creds, METHOD_LOGISTICS, &logistics_params(jd_order_id))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a005_jd_order::aggregate::{JdOrderAddress, JdOrderItem};

    fn order() -> JdOrder {
        JdOrder::new_draft(
            "acc".into(),
            "T-1".into(),
            vec![JdOrderItem {
                sku_id: 100,
                name: "Kettle".into(),
                quantity: 2,
                price: 49.5,
            }],
            JdOrderAddress {
                receiver_name: "Li Lei".into(),
                mobile: "13800138000".into(),
                area: JdArea {
                    province_id: 1,
                    city_id: 72,
                    county_id: 2819,
                    town_id: 0,
                },
                full_address: "Beijing Chaoyang 1".into(),
            },
            None,
        )
    }

    #[test]
    fn test_submit_params() {
        let params = submit_params(&order());
        let p = &params["submitOrderParam"];
        assert_eq!(p["thirdOrderId"], "T-1");
        assert_eq!(p["skuList"][0]["quantity"], 2);
        assert_eq!(p["orderPrice"], 99.0);
        assert_eq!(p["address"]["fullAddress"], "Beijing Chaoyang 1");
        assert_eq!(p["receiver"]["mobile"], "13800138000");
    }

    #[test]
    fn test_detail_state_mapping() {
        let detail: OrderDetail = serde_json::from_value(json!({
            "jdOrderId": "9001", "orderState": 1, "jdOrderState": 12, "payState": 2
        }))
        .unwrap();
        assert_eq!(detail.jd_order_id, 9001);
        assert_eq!(detail.state(), JdOrderState::Shipped);

        let cancelled: OrderDetail =
            serde_json::from_value(json!({"jdOrderId": 1, "orderState": 0})).unwrap();
        assert_eq!(cancelled.state(), JdOrderState::Cancelled);
    }

    #[test]
    fn test_logistics_traces() {
        let result: LogisticsResult = serde_json::from_value(json!({
            "logisticsCompany": "京东快递",
            "waybillCode": "JD0001",
            "traceList": [{"msgTime": "2024-05-01 10:00:00", "content": "已揽收", "operator": "张三"}]
        }))
        .unwrap();
        let traces = result.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].operator.as_deref(), Some("张三"));
    }
}
