use serde::{Deserialize, Serialize};

/// Итог обновления OAuth-токенов
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokensReport {
    pub accounts_total: usize,
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Аккаунты, помеченные невалидными из-за отозванного refresh token
    pub invalidated: usize,
    pub errors: Vec<String>,
}
