use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub jd: JdConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// JD open platform endpoints and client settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JdConfig {
    pub api_url: String,
    pub oauth_url: String,
    pub redirect_uri: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for JdConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.jd.com/routerjson".to_string(),
            oauth_url: "https://open-oauth.jd.com".to_string(),
            redirect_uri: String::new(),
            api_version: "2.0".to_string(),
            timeout_secs: 30,
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct AreaConfig {
    pub province_id: i64,
    pub city_id: i64,
    pub county_id: i64,
    #[serde(default)]
    pub town_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub sku_page_size: u32,
    pub detail_batch_size: usize,
    pub price_batch_size: usize,
    pub stock_batch_size: usize,
    pub detail_fresh_hours: i64,
    pub price_fresh_hours: i64,
    pub stock_fresh_hours: i64,
    pub token_refresh_before_hours: i64,
    /// Used for stock queries when the account has no default address
    pub default_area: AreaConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sku_page_size: 100,
            detail_batch_size: 20,
            price_batch_size: 50,
            stock_batch_size: 50,
            detail_fresh_hours: 24,
            price_fresh_hours: 6,
            stock_fresh_hours: 1,
            token_refresh_before_hours: 2,
            // Beijing / Chaoyang
            default_area: AreaConfig {
                province_id: 1,
                city_id: 72,
                county_id: 2819,
                town_id: 0,
            },
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/jd_trade.db"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Explicit path (`--config`)
/// 2. Next to the executable (for production)
/// 3. Falls back to embedded default config
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read config {}: {}", path.display(), e))?;
        return parse_config(&contents);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.sync.sku_page_size == 0 {
        anyhow::bail!("sync.sku_page_size must be positive");
    }
    if config.sync.detail_batch_size == 0
        || config.sync.price_batch_size == 0
        || config.sync.stock_batch_size == 0
    {
        anyhow::bail!("sync batch sizes must be positive");
    }
    Ok(config)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/jd_trade.db");
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.jd.api_url, "https://api.jd.com/routerjson");
        assert_eq!(config.sync.detail_fresh_hours, 24);
        assert_eq!(config.sync.default_area.city_id, 72);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = parse_config(
            r#"
            [database]
            path = "/tmp/jd.db"

            [jd]
            api_url = "http://127.0.0.1:9999/routerjson"

            [sync]
            price_fresh_hours = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.jd.api_url, "http://127.0.0.1:9999/routerjson");
        assert_eq!(config.jd.timeout_secs, 30);
        assert_eq!(config.sync.price_fresh_hours, 12);
        assert_eq!(config.sync.stock_fresh_hours, 1);
        assert_eq!(
            get_database_path(&config).unwrap(),
            PathBuf::from("/tmp/jd.db")
        );
    }

    #[test]
    fn test_zero_batch_rejected() {
        let err = parse_config(
            r#"
            [database]
            path = "x.db"
            [sync]
            price_batch_size = 0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("batch sizes"));
    }
}
