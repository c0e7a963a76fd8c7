use super::request::SyncTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub account_id: Option<String>,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Итог одного запуска синхронизации
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub target: SyncTarget,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub accounts_total: usize,
    pub accounts_failed: usize,
    /// Получено записей из JD
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Пропущено: свежие или без изменений
    pub skipped: usize,
    /// Записи, не обработанные из-за ошибки (подробности в errors)
    pub failed: usize,
    pub errors: Vec<SyncError>,
}

impl SyncReport {
    pub fn new(target: SyncTarget) -> Self {
        Self {
            target,
            started_at: Utc::now(),
            completed_at: None,
            accounts_total: 0,
            accounts_failed: 0,
            fetched: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, account_id: Option<String>, message: String) {
        self.errors.push(SyncError {
            account_id,
            message,
            occurred_at: Utc::now(),
        });
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
