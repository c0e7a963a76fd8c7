use serde::{Deserialize, Serialize};

/// Что синхронизировать из JD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTarget {
    Skus,
    Details,
    Prices,
    Stocks,
    Categories,
    Orders,
}

impl SyncTarget {
    pub const ALL: [SyncTarget; 6] = [
        Self::Categories,
        Self::Skus,
        Self::Details,
        Self::Prices,
        Self::Stocks,
        Self::Orders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skus => "skus",
            Self::Details => "details",
            Self::Prices => "prices",
            Self::Stocks => "stocks",
            Self::Categories => "categories",
            Self::Orders => "orders",
        }
    }
}

impl std::fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown sync target: {}", s))
    }
}

/// Запрос на синхронизацию
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub target: SyncTarget,
    /// Только один аккаунт; иначе все валидные
    pub account_id: Option<String>,
    /// Игнорировать окно свежести
    #[serde(default)]
    pub force: bool,
    /// Переопределить окно свежести (часы)
    pub fresh_hours: Option<i64>,
}

impl SyncRequest {
    pub fn new(target: SyncTarget) -> Self {
        Self {
            target,
            account_id: None,
            force: false,
            fresh_hours: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        assert_eq!("prices".parse::<SyncTarget>(), Ok(SyncTarget::Prices));
        assert!("bogus".parse::<SyncTarget>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let req: SyncRequest = serde_json::from_str(r#"{"target":"stocks"}"#).unwrap();
        assert_eq!(req.target, SyncTarget::Stocks);
        assert!(!req.force);
        assert!(req.account_id.is_none());
    }
}
