// ==========================================
// 人道反馈看板 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 建表语句集中在此,各仓储构造时调用（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sheet_profile (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  label TEXT NOT NULL UNIQUE,
  profile TEXT NOT NULL,
  updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS taxonomy (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  slug TEXT NOT NULL UNIQUE,
  multiplicity TEXT NOT NULL DEFAULT 'multiple',
  vocabulary TEXT NOT NULL DEFAULT 'closed'
);

CREATE TABLE IF NOT EXISTS term (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  taxonomy_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  long_name TEXT NOT NULL DEFAULT '',
  FOREIGN KEY (taxonomy_id) REFERENCES taxonomy(id) ON DELETE CASCADE,
  UNIQUE(taxonomy_id, name)
);

CREATE TABLE IF NOT EXISTS feedback_item (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  body TEXT NOT NULL,
  translation TEXT NOT NULL DEFAULT '',
  timestamp TEXT,
  network_provider TEXT NOT NULL DEFAULT '',
  location TEXT NOT NULL DEFAULT '',
  sub_location TEXT NOT NULL DEFAULT '',
  language TEXT NOT NULL DEFAULT '',
  risk TEXT NOT NULL DEFAULT '',
  gender TEXT NOT NULL DEFAULT '',
  age TEXT NOT NULL DEFAULT '',
  contributor TEXT NOT NULL DEFAULT '',
  collection_type TEXT NOT NULL DEFAULT '',
  external_id TEXT NOT NULL DEFAULT '',
  created TEXT NOT NULL,
  last_modified TEXT NOT NULL,
  UNIQUE(body, timestamp)
);

CREATE TABLE IF NOT EXISTS item_term (
  item_id INTEGER NOT NULL,
  term_id INTEGER NOT NULL,
  PRIMARY KEY (item_id, term_id),
  FOREIGN KEY (item_id) REFERENCES feedback_item(id) ON DELETE CASCADE,
  FOREIGN KEY (term_id) REFERENCES term(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_term_taxonomy ON term(taxonomy_id);
CREATE INDEX IF NOT EXISTS idx_item_term_term ON item_term(term_id);
CREATE INDEX IF NOT EXISTS idx_feedback_item_timestamp ON feedback_item(timestamp DESC);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
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

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
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
