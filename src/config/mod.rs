// ==========================================
// 人道反馈看板 - 配置层
// ==========================================
// 职责: 运行时配置 + 内置导入配置/默认分类安装
// ==========================================

pub mod app_config;
pub mod builtin_profiles;

// 重导出
pub use app_config::AppConfig;
pub use builtin_profiles::{builtin_profiles, seed_builtin_profiles, seed_default_taxonomies};
