// ==========================================
// RoRo 承运商规则核心 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 提供 schema 初始化与版本读取
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version（与 `migrations/v0.*.sql` 对齐）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V0_1: &str = include_str!("../migrations/v0.1_carrier_rules.sql");

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_V0_1)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先读取环境变量 RORO_CARRIER_RULES_DB_PATH，其次为用户数据目录，最后回退到当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("RORO_CARRIER_RULES_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("roro-carrier-rules");
            // 目录创建失败时交给 Connection::open 报错
            std::fs::create_dir_all(&dir).ok();
            dir.join("carrier_rules.db").to_string_lossy().to_string()
        }
        None => "./carrier_rules.db".to_string(),
    }
}

/// 打开连接：空库自动建表，schema 版本落后时告警（不做自动迁移）
pub fn open_and_check(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    match read_schema_version(&conn)? {
        Some(v) if v >= CURRENT_SCHEMA_VERSION => {}
        Some(v) => tracing::warn!(
            schema_version = v,
            expected = CURRENT_SCHEMA_VERSION,
            "数据库 schema 版本落后"
        ),
        None => {
            tracing::info!(db_path, "数据库缺少 schema_version 表，初始化 schema");
            init_schema(&conn)?;
        }
    }
    Ok(conn)
}
