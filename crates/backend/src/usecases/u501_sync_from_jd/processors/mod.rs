pub mod category;
pub mod detail;
pub mod order;
pub mod price;
pub mod sku;
pub mod stock;

use contracts::usecases::u501_sync_from_jd::report::SyncReport;

/// Счетчики одного шага синхронизации по одному аккаунту
#[derive(Debug, Default, Clone)]
pub struct StepStats {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Ошибки по отдельным записям (шаг при этом продолжается)
    pub warnings: Vec<String>,
}

impl StepStats {
    pub fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.failed += 1;
        self.warnings.push(message);
    }

    pub fn add_to(self, report: &mut SyncReport, account_id: &str) {
        report.fetched += self.fetched;
        report.inserted += self.inserted;
        report.updated += self.updated;
        report.skipped += self.skipped;
        report.failed += self.failed;
        for message in self.warnings {
            report.add_error(Some(account_id.to_string()), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::usecases::u501_sync_from_jd::request::SyncTarget;

    #[test]
    fn test_stats_accumulate_into_report() {
        let mut report = SyncReport::new(SyncTarget::Prices);
        let mut stats = StepStats {
            fetched: 10,
            updated: 8,
            ..Default::default()
        };
        stats.skipped = 1;
        stats.warn("sku 5 missing in response".into());
        stats.add_to(&mut report, "acc-1");

        assert_eq!(report.fetched, 10);
        assert_eq!(report.updated, 8);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].account_id.as_deref(), Some("acc-1"));
    }
}
