// ==========================================
// 人道反馈看板 - 导入配置仓储
// ==========================================
// 职责: 管理 sheet_profile 表（label → 配置 JSON）
// 说明: 导入器只读；写入仅来自管理入口（内置配置安装）
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::profile::SheetProfile;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ProfileStore Trait
// ==========================================
pub trait ProfileStore {
    /// 按标签查找配置（不存在返回 None）
    fn get_profile(&self, label: &str) -> RepositoryResult<Option<SheetProfile>>;
}

// 内存配置（测试与嵌入式调用）
impl ProfileStore for HashMap<String, SheetProfile> {
    fn get_profile(&self, label: &str) -> RepositoryResult<Option<SheetProfile>> {
        Ok(self.get(label).cloned())
    }
}

// ==========================================
// SqliteProfileStore
// ==========================================
pub struct SqliteProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProfileStore {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        init_schema(&*repo.get_conn()?)?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建或更新配置（按 label）
    pub fn upsert_profile(&self, profile: &SheetProfile) -> RepositoryResult<()> {
        let json = serde_json::to_string(profile)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sheet_profile (label, profile, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(label) DO UPDATE SET
                profile = excluded.profile,
                updated_at = excluded.updated_at
            "#,
            params![profile.label, json],
        )?;

        tracing::debug!(label = %profile.label, "导入配置已保存");
        Ok(())
    }

    /// 已安装的配置标签（按字母序）
    pub fn list_labels(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT label FROM sheet_profile ORDER BY label")?;
        let labels = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(labels)
    }
}

impl ProfileStore for SqliteProfileStore {
    fn get_profile(&self, label: &str) -> RepositoryResult<Option<SheetProfile>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT profile FROM sheet_profile WHERE label = ?1",
                params![label],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => {
                let mut profile: SheetProfile = serde_json::from_str(&json)?;
                // 以表中的 label 为准
                profile.label = label.to_string();
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }
}

impl<T: ProfileStore + ?Sized> ProfileStore for &T {
    fn get_profile(&self, label: &str) -> RepositoryResult<Option<SheetProfile>> {
        (**self).get_profile(label)
    }
}

impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    fn get_profile(&self, label: &str) -> RepositoryResult<Option<SheetProfile>> {
        (**self).get_profile(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::ColumnSpec;

    fn store() -> SqliteProfileStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteProfileStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_get_profile_roundtrip() {
        let store = store();
        let profile = SheetProfile::new("test-label", "Test")
            .with_columns(vec![ColumnSpec::text("Message", "body")])
            .with_header(true)
            .with_taxonomy("item-types", "rumor");

        store.upsert_profile(&profile).unwrap();

        assert_eq!(store.get_profile("test-label").unwrap(), Some(profile));
        assert_eq!(store.get_profile("unknownlabel").unwrap(), None);
    }

    #[test]
    fn test_upsert_replaces_profile() {
        let store = store();
        store.upsert_profile(&SheetProfile::new("geopoll", "old")).unwrap();
        store.upsert_profile(&SheetProfile::new("geopoll", "new")).unwrap();
        store.upsert_profile(&SheetProfile::new("kobo", "Kobo")).unwrap();

        assert_eq!(store.list_labels().unwrap(), vec!["geopoll", "kobo"]);
        assert_eq!(store.get_profile("geopoll").unwrap().unwrap().name, "new");
    }

    #[test]
    fn test_in_memory_store() {
        let mut profiles = HashMap::new();
        profiles.insert("x".to_string(), SheetProfile::new("x", "X"));

        assert!(profiles.get_profile("x").unwrap().is_some());
        assert!(profiles.get_profile("y").unwrap().is_none());
    }
}
