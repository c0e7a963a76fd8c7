use contracts::domain::a009_jd_after_sales::aggregate::{AfterSalesState, JdAfterSales};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::lenient;
use crate::shared::jd_cloud::{Client, Credentials, JdError};

pub const METHOD_AFS_APPLY: &str = "jingdong.ctp.afs.operate.apply.createAfsApply";
pub const METHOD_AFS_LIST: &str = "jingdong.ctp.afs.servicenbill.getAfsServiceList";
pub const METHOD_AFS_CANCEL: &str = "jingdong.ctp.afs.operate.apply.cancelAfsApply";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub afs_service_id: Option<i64>,
}

pub fn apply_params(afs: &JdAfterSales) -> Value {
    json!({"afsApplyParam": {
        "jdOrderId": afs.jd_order_id,
        "skuId": afs.sku_id,
        "quantity": afs.quantity,
        "customerExpect": afs.service_type.jd_code(),
        "questionDesc": afs.reason,
        "questionPic": afs.image_urls.join(","),
        "pickwareType": afs.pickware_type,
    }})
}

pub async fn apply(
    client: &Client,
    creds: &Credentials,
    afs: &JdAfterSales,
) -> Result<ApplyResult, JdError> {
    let value = client
        .execute(creds, METHOD_AFS_APPLY, &apply_params(afs))
        .await?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value)?,
        Value::Number(n) => ApplyResult {
            afs_service_id: n.as_i64(),
        },
        _ => ApplyResult::default(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AfsServiceEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub afs_service_id: i64,
    #[serde(default)]
    pub sku_id: i64,
    #[serde(default)]
    pub customer_expect: i32,
    #[serde(default)]
    pub afs_service_step: i32,
    pub afs_service_step_name: Option<String>,
    pub afs_apply_time: Option<String>,
}

impl AfsServiceEntry {
    pub fn state(&self) -> AfterSalesState {
        AfterSalesState::from_jd_step(self.afs_service_step)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AfsServicePage {
    #[serde(default)]
    pub service_list: Vec<AfsServiceEntry>,
    pub total_num: Option<i64>,
}

pub fn list_params(jd_order_id: i64, page_no: u32, page_size: u32) -> Value {
    json!({"afsListParam": {"jdOrderId": jd_order_id, "pageNo": page_no, "pageSize": page_size}})
}

pub async fn cancel(
    client: &Client,
    creds: &Credentials,
    afs_service_id: i64,
    reason: &str,
) -> Result<Value, JdError> {
    let params = json!({"afsCancelParam": {"afsServiceId": afs_service_id, "reason": reason}});
    client.execute(creds, METHOD_AFS_CANCEL, &params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a009_jd_after_sales::aggregate::AfterSalesType;

    #[test]
    fn test_apply_params_join_pictures() {
        let afs = JdAfterSales::new_application(
            "order".into(),
            9001,
            100,
            AfterSalesType::Exchange,
            1,
            "broken lid".into(),
            vec!["a.jpg".into(), "b.jpg".into()],
            4,
        );
        let params = apply_params(&afs);
        let p = &params["afsApplyParam"];
        assert_eq!(p["customerExpect"], 20);
        assert_eq!(p["questionPic"], "a.jpg,b.jpg");
    }

    #[test]
    fn test_list_entry_state() {
        let page: AfsServicePage = serde_json::from_value(json!({
            "serviceList": [{"afsServiceId": "77", "skuId": 100, "afsServiceStep": 50}],
            "totalNum": 1
        }))
        .unwrap();
        assert_eq!(page.service_list[0].afs_service_id, 77);
        assert_eq!(page.service_list[0].state(), AfterSalesState::Completed);
    }
}
