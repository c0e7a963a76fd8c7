use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Общие колонки всех агрегатов (BaseAggregate + EntityMetadata)
const BASE_COLUMNS: &str = r#"
    id TEXT PRIMARY KEY NOT NULL,
    code TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL,
    comment TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    is_posted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT,
    updated_at TEXT,
    version INTEGER NOT NULL DEFAULT 0
"#;

/// (таблица, колонки помимо базовых)
const TABLES: &[(&str, &str)] = &[
    (
        "a001_jd_account",
        r#"
        app_key TEXT NOT NULL,
        app_secret TEXT NOT NULL,
        access_token TEXT,
        access_token_expires_at TEXT,
        refresh_token TEXT,
        refresh_token_expires_at TEXT,
        scope TEXT,
        open_id TEXT,
        uid TEXT,
        is_valid INTEGER NOT NULL DEFAULT 1
        "#,
    ),
    (
        "a002_jd_category",
        r#"
        category_id INTEGER NOT NULL,
        parent_id INTEGER NOT NULL DEFAULT 0,
        level INTEGER NOT NULL,
        name TEXT NOT NULL,
        state INTEGER NOT NULL DEFAULT 1
        "#,
    ),
    (
        "a003_jd_sku",
        r#"
        account_ref TEXT NOT NULL,
        sku_id INTEGER NOT NULL,
        base_info_json TEXT NOT NULL,
        image_info_json TEXT NOT NULL DEFAULT '{}',
        specification_json TEXT NOT NULL DEFAULT '{}',
        big_field_json TEXT NOT NULL DEFAULT '{}',
        book_info_json TEXT,
        jd_price REAL,
        market_price REAL,
        stock_json TEXT,
        detail_updated_at TEXT,
        price_updated_at TEXT,
        stock_updated_at TEXT
        "#,
    ),
    (
        "a004_jd_delivery_address",
        r#"
        account_ref TEXT NOT NULL,
        receiver_name TEXT NOT NULL,
        mobile TEXT NOT NULL,
        email TEXT,
        province_id INTEGER NOT NULL,
        city_id INTEGER NOT NULL,
        county_id INTEGER NOT NULL,
        town_id INTEGER NOT NULL DEFAULT 0,
        province_name TEXT,
        city_name TEXT,
        county_name TEXT,
        town_name TEXT,
        detail_address TEXT NOT NULL,
        zip_code TEXT,
        is_default INTEGER NOT NULL DEFAULT 0
        "#,
    ),
    (
        "a005_jd_order",
        r#"
        account_ref TEXT NOT NULL,
        third_order_id TEXT NOT NULL,
        jd_order_id INTEGER,
        state TEXT NOT NULL,
        items_json TEXT NOT NULL,
        address_json TEXT NOT NULL,
        freight REAL NOT NULL DEFAULT 0,
        total_amount REAL NOT NULL DEFAULT 0,
        remark TEXT,
        submitted_at TEXT,
        last_synced_at TEXT,
        last_error TEXT
        "#,
    ),
    (
        "a006_jd_payment",
        r#"
        order_ref TEXT NOT NULL,
        jd_order_id INTEGER NOT NULL,
        pay_type INTEGER NOT NULL,
        amount REAL NOT NULL,
        state TEXT NOT NULL,
        jd_pay_id TEXT,
        paid_at TEXT,
        error TEXT
        "#,
    ),
    (
        "a007_jd_logistics",
        r#"
        order_ref TEXT NOT NULL,
        jd_order_id INTEGER NOT NULL,
        carrier TEXT,
        waybill_code TEXT,
        traces_json TEXT NOT NULL DEFAULT '[]',
        last_synced_at TEXT
        "#,
    ),
    (
        "a008_jd_invoice",
        r#"
        order_ref TEXT NOT NULL,
        jd_order_id INTEGER NOT NULL,
        invoice_type TEXT NOT NULL,
        title_type TEXT NOT NULL,
        title TEXT NOT NULL,
        tax_no TEXT,
        state TEXT NOT NULL,
        invoice_code TEXT,
        invoice_no TEXT,
        amount REAL,
        file_url TEXT,
        issued_at TEXT
        "#,
    ),
    (
        "a009_jd_after_sales",
        r#"
        order_ref TEXT NOT NULL,
        jd_order_id INTEGER NOT NULL,
        sku_id INTEGER NOT NULL,
        service_type TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        reason TEXT NOT NULL,
        image_urls_json TEXT NOT NULL DEFAULT '[]',
        pickware_type INTEGER NOT NULL,
        afs_service_id INTEGER,
        state TEXT NOT NULL,
        applied_at TEXT NOT NULL
        "#,
    ),
    (
        "a010_jd_comment",
        r#"
        sku_id INTEGER NOT NULL,
        jd_comment_id INTEGER NOT NULL,
        score INTEGER NOT NULL,
        content TEXT NOT NULL,
        nickname TEXT,
        images_json TEXT NOT NULL DEFAULT '[]',
        commented_at TEXT
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a002_category_id ON a002_jd_category (category_id)",
    "CREATE INDEX IF NOT EXISTS idx_a002_parent_id ON a002_jd_category (parent_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a003_account_sku ON a003_jd_sku (account_ref, sku_id)",
    "CREATE INDEX IF NOT EXISTS idx_a004_account ON a004_jd_delivery_address (account_ref)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a005_third_order ON a005_jd_order (third_order_id)",
    "CREATE INDEX IF NOT EXISTS idx_a005_jd_order ON a005_jd_order (jd_order_id)",
    "CREATE INDEX IF NOT EXISTS idx_a006_order ON a006_jd_payment (order_ref)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a007_order ON a007_jd_logistics (order_ref)",
    "CREATE INDEX IF NOT EXISTS idx_a008_order ON a008_jd_invoice (order_ref)",
    "CREATE INDEX IF NOT EXISTS idx_a009_order ON a009_jd_after_sales (order_ref)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_a010_comment ON a010_jd_comment (jd_comment_id)",
    "CREATE INDEX IF NOT EXISTS idx_a010_sku ON a010_jd_comment (sku_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_raw_key ON jd_raw_payload (account_ref, method, object_key)",
];

const RAW_PAYLOAD_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS jd_raw_payload (
        id TEXT PRIMARY KEY NOT NULL,
        account_ref TEXT NOT NULL,
        method TEXT NOT NULL,
        object_key TEXT NOT NULL,
        raw_json TEXT NOT NULL,
        fetched_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
"#;

pub fn build_sqlite_url(path: &Path) -> anyhow::Result<String> {
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    Ok(format!("sqlite://{}{}?mode=rwc", prefix, normalized))
}

pub async fn initialize_database(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db_url = build_sqlite_url(db_path)?;
    tracing::info!("Opening database: {}", db_url);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Создать недостающие таблицы и индексы (идемпотентно)
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for (table, columns) in TABLES {
        let existing = conn
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
                [(*table).into()],
            ))
            .await?;
        if !existing.is_empty() {
            continue;
        }

        tracing::info!("Creating {} table", table);
        let sql = format!(
            "CREATE TABLE {} ({},{});",
            table,
            BASE_COLUMNS.trim_end(),
            columns.trim_end()
        );
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await?;
    }

    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        RAW_PAYLOAD_TABLE.to_string(),
    ))
    .await?;

    for index in INDEXES {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            index.to_string(),
        ))
        .await?;
    }

    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

/// Одна временная база на весь тестовый процесс; тесты разводят данные
/// по уникальным account_ref
#[cfg(test)]
pub(crate) async fn init_test_database() {
    if DB_CONN.get().is_some() {
        return;
    }
    let path = std::env::temp_dir().join(format!("jd-trade-test-{}.db", uuid::Uuid::new_v4()));
    let conn = Database::connect(build_sqlite_url(&path).unwrap().as_str())
        .await
        .unwrap();
    bootstrap_schema(&conn).await.unwrap();
    // параллельный тест мог успеть первым, тогда используется его база
    let _ = DB_CONN.set(conn);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_for_absolute_path() {
        let url = build_sqlite_url(Path::new("/var/lib/jd/app.db")).unwrap();
        assert_eq!(url, "sqlite:///var/lib/jd/app.db?mode=rwc");
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        bootstrap_schema(&conn).await.unwrap();
        bootstrap_schema(&conn).await.unwrap();

        let rows = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name LIKE 'a0%'".to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(rows.len(), TABLES.len());
    }
}
