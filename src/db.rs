// ==========================================
// 遊技ホール台データ分析 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/busy_timeout)
// - 建表脚本幂等,新库与旧库都可直接调用 init_schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS hall (
    hall_id INTEGER PRIMARY KEY AUTOINCREMENT,
    code INTEGER UNIQUE,
    name TEXT NOT NULL,
    memo TEXT
);

CREATE TABLE IF NOT EXISTS machine_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hall_id INTEGER NOT NULL REFERENCES hall(hall_id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    machine_number INTEGER NOT NULL,
    machine_name TEXT NOT NULL,
    game_count INTEGER NOT NULL DEFAULT 0,
    difference_count INTEGER NOT NULL DEFAULT 0,
    bb_count INTEGER NOT NULL DEFAULT 0,
    rb_count INTEGER NOT NULL DEFAULT 0,
    art_count INTEGER NOT NULL DEFAULT 0,
    date_memo TEXT,
    machine_memo TEXT,
    UNIQUE (hall_id, date, machine_number)
);

CREATE INDEX IF NOT EXISTS idx_machine_data_hall_date ON machine_data (hall_id, date);

CREATE TABLE IF NOT EXISTS hall_map (
    map_id INTEGER PRIMARY KEY AUTOINCREMENT,
    hall_id INTEGER NOT NULL REFERENCES hall(hall_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    layout_data TEXT NOT NULL DEFAULT '{}',
    color_settings TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (hall_id, name)
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启 (店铺删除级联依赖它)
/// - busy_timeout 需要“每个连接”单独配置
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

/// 建表 (幂等); 首次建库时写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    match read_schema_version(conn)? {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
            info!(version = CURRENT_SCHEMA_VERSION, "数据库初始化完成");
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            warn!(found = v, expected = CURRENT_SCHEMA_VERSION, "schema_version 不一致");
        }
        Some(_) => {}
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
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
