//! Typed wrappers over JD Cloud Trade router methods.

pub mod after_sales;
pub mod comment;
pub mod invoice;
pub mod order;
pub mod ware;

use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;
use serde_json::{json, Value};

/// Адрес в формате параметров JD
pub fn area_param(area: &JdArea) -> Value {
    json!({
        "provinceId": area.province_id,
        "cityId": area.city_id,
        "countyId": area.county_id,
        "townId": area.town_id,
    })
}

/// JD иногда отдает числа строками ("100012043978")
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn i64_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| serde::de::Error::custom("expected integer")),
            Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "expected integer, got {}",
                other
            ))),
        }
    }

    pub fn opt_f64_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "expected number, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "lenient::i64_from_any")]
        id: i64,
        #[serde(default, deserialize_with = "lenient::opt_f64_from_any")]
        price: Option<f64>,
    }

    #[test]
    fn test_lenient_numbers() {
        let p: Row = serde_json::from_value(json!({"id": "100012043978", "price": "9.90"})).unwrap();
        assert_eq!(p.id, 100012043978);
        assert_eq!(p.price, Some(9.9));

        let p: Row = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(p.price, None);
    }

    #[test]
    fn test_area_param() {
        let area = JdArea {
            province_id: 1,
            city_id: 72,
            county_id: 2819,
            town_id: 0,
        };
        assert_eq!(area_param(&area)["countyId"], 2819);
    }
}
