// ==========================================
// 人道反馈看板 - 运行时配置
// ==========================================
// 来源: 环境变量 > 用户数据目录 > 当前目录
// ==========================================

use std::path::PathBuf;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "FEEDBACK_DASHBOARD_DB_PATH";

/// 界面语言环境变量
pub const LOCALE_ENV: &str = "FEEDBACK_DASHBOARD_LOCALE";

pub const DEFAULT_LOCALE: &str = "en";

const DATA_DIR_NAME: &str = "feedback-dashboard";
const DB_FILE_NAME: &str = "feedback_dashboard.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
    pub locale: String,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（便于测试注入）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = non_empty(DB_PATH_ENV).unwrap_or_else(default_db_path);
        let locale = non_empty(LOCALE_ENV).unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Self { db_path, locale }
    }
}

/// 默认数据库路径
///
/// 优先使用用户数据目录,拿不到时回退到当前目录
pub fn default_db_path() -> String {
    let mut path = PathBuf::from(".").join(DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join(DATA_DIR_NAME);
        // 确保目录存在
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_explicit_values_win() {
        let env: HashMap<&str, &str> = [
            (DB_PATH_ENV, " /tmp/feedback.db "),
            (LOCALE_ENV, "zh-CN"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, "/tmp/feedback.db");
        assert_eq!(config.locale, "zh-CN");
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| Some("   ".to_string()));

        assert_eq!(config.locale, DEFAULT_LOCALE);
        assert!(config.db_path.ends_with(DB_FILE_NAME));
    }
}
