use moka::future::Cache;
use serde_json::Value;
use std::time::Duration;

/// Кэш ответов JD для read-only процедур.
///
/// Ключ: аккаунт + метод + канонический JSON параметров
/// (ключи объектов отсортированы, порядок полей в запросе не важен).
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, Value>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
        }
    }

    pub fn key(account_id: &str, method: &str, params: &Value) -> String {
        let mut out = String::new();
        write_canonical(params, &mut out);
        format!("{}|{}|{}", account_id, method, out)
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, value: Value) {
        self.inner.insert(key, value).await;
    }

    /// Сбросить все записи аккаунта (после изменяющих вызовов)
    pub fn invalidate_account(&self, account_id: &str) {
        let prefix = format!("{}|", account_id);
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |k, _| k.starts_with(&prefix))
        {
            tracing::warn!("Cache invalidation failed: {}", e);
        }
    }

    /// Вернуть значение из кэша или вычислить и сохранить
    pub async fn get_or_fetch<F, Fut, E>(&self, key: String, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            tracing::debug!("JD cache hit: {}", key);
            return Ok(hit);
        }
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_key_ignores_field_order() {
        let a = ResponseCache::key("acc", "m", &json!({"b": 1, "a": 2}));
        let b = ResponseCache::key("acc", "m", &json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_get_or_fetch_calls_once() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let value = cache
                .get_or_fetch("acc|m|{}".to_string(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(json!({"price": 1}))
                })
                .await
                .unwrap();
            assert_eq!(value, json!({"price": 1}));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let first = cache
            .get_or_fetch("k".to_string(), || async { Err::<Value, _>("boom") })
            .await;
        assert!(first.is_err());
        assert!(cache.get("k").await.is_none());
    }
}
