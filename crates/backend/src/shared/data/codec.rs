//! Helpers for JSON text columns and enum columns.

use serde::{de::DeserializeOwned, Serialize};

/// Сериализовать value object в JSON-колонку
pub fn to_json_text<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Прочитать JSON-колонку; поврежденное значение заменяется Default с предупреждением
pub fn from_json_text<T: DeserializeOwned + Default>(text: &str, column: &str) -> T {
    match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Cannot decode column {}: {}", column, e);
            T::default()
        }
    }
}

/// Enum с `rename_all = "snake_case"` в строку без кавычек
pub fn enum_to_text<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

pub fn enum_from_text<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(text.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a009_jd_after_sales::aggregate::AfterSalesType;

    #[test]
    fn test_enum_text_roundtrip() {
        assert_eq!(enum_to_text(&AfterSalesType::Exchange), "exchange");
        assert_eq!(
            enum_from_text::<AfterSalesType>("repair"),
            Some(AfterSalesType::Repair)
        );
        assert_eq!(enum_from_text::<AfterSalesType>("bogus"), None);
    }

    #[test]
    fn test_broken_json_falls_back_to_default() {
        let v: Vec<String> = from_json_text("{not json", "images_json");
        assert!(v.is_empty());
    }
}
