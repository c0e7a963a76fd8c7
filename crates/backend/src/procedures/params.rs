use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::registry::ProcedureError;

/// Максимум SKU в одном запросе к JD
pub const MAX_SKU_IDS: usize = 100;

/// Разобрать params; отсутствующие params читаются как `{}`
pub fn parse<T: DeserializeOwned>(params: Value) -> Result<T, ProcedureError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| ProcedureError::InvalidParams(e.to_string()))
}

pub fn to_value<T: Serialize>(value: &T) -> Result<Value, ProcedureError> {
    serde_json::to_value(value).map_err(|e| ProcedureError::Internal(e.into()))
}

pub fn check_sku_ids(sku_ids: &[i64]) -> Result<(), ProcedureError> {
    if sku_ids.is_empty() {
        return Err(ProcedureError::InvalidParams("skuIds must not be empty".into()));
    }
    if sku_ids.len() > MAX_SKU_IDS {
        return Err(ProcedureError::InvalidParams(format!(
            "at most {} skuIds per call, got {}",
            MAX_SKU_IDS,
            sku_ids.len()
        )));
    }
    Ok(())
}

pub(crate) fn default_page_no() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ListParams {
        #[serde(default)]
        parent_id: i64,
    }

    #[test]
    fn test_null_params_use_defaults() {
        let p: ListParams = parse(Value::Null).unwrap();
        assert_eq!(p.parent_id, 0);
        let p: ListParams = parse(json!({"parentId": 737})).unwrap();
        assert_eq!(p.parent_id, 737);
    }

    #[test]
    fn test_wrong_type_is_invalid_params() {
        let err = parse::<ListParams>(json!({"parentId": "x"})).unwrap_err();
        assert!(matches!(err, ProcedureError::InvalidParams(_)));
    }

    #[test]
    fn test_sku_id_limits() {
        assert!(check_sku_ids(&[]).is_err());
        assert!(check_sku_ids(&[1, 2, 3]).is_ok());
        let many: Vec<i64> = (1..=101).collect();
        assert!(check_sku_ids(&many).is_err());
    }
}
