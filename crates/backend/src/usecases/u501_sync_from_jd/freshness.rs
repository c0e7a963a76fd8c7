use chrono::{DateTime, Duration, Utc};
use contracts::domain::a003_jd_sku::aggregate::{JdSku, SkuFreshnessField};

/// Запись устарела: никогда не обновлялась или старше `hours` часов
pub fn is_stale(last: Option<DateTime<Utc>>, now: DateTime<Utc>, hours: i64, force: bool) -> bool {
    if force {
        return true;
    }
    match last {
        None => true,
        Some(at) => at < now - Duration::hours(hours),
    }
}

/// Разделить SKU на устаревшие (к обновлению) и количество свежих
pub fn select_stale(
    skus: Vec<JdSku>,
    field: SkuFreshnessField,
    now: DateTime<Utc>,
    hours: i64,
    force: bool,
) -> (Vec<JdSku>, usize) {
    let total = skus.len();
    let stale: Vec<JdSku> = skus
        .into_iter()
        .filter(|sku| is_stale(field.last_update(sku), now, hours, force))
        .collect();
    let fresh = total - stale.len();
    (stale, fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a003_jd_sku::aggregate::{SkuBaseInfo, SkuPrice};

    fn sku(id: i64, price_updated: Option<DateTime<Utc>>) -> JdSku {
        let mut sku = JdSku::new_for_insert("acc".into(), id, SkuBaseInfo::default());
        if let Some(at) = price_updated {
            sku.apply_price(SkuPrice::default(), at);
        }
        sku
    }

    #[test]
    fn test_is_stale_window() {
        let now = Utc::now();
        assert!(is_stale(None, now, 6, false));
        assert!(!is_stale(Some(now - Duration::hours(5)), now, 6, false));
        assert!(is_stale(Some(now - Duration::hours(7)), now, 6, false));
        assert!(is_stale(Some(now), now, 6, true));
    }

    #[test]
    fn test_select_stale_counts_fresh() {
        let now = Utc::now();
        let skus = vec![
            sku(1, None),
            sku(2, Some(now - Duration::hours(1))),
            sku(3, Some(now - Duration::hours(48))),
        ];
        let (stale, fresh) = select_stale(skus.clone(), SkuFreshnessField::Price, now, 6, false);
        assert_eq!(stale.iter().map(|s| s.sku_id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(fresh, 1);

        let (stale, fresh) = select_stale(skus, SkuFreshnessField::Price, now, 6, true);
        assert_eq!(stale.len(), 3);
        assert_eq!(fresh, 0);
    }
}
