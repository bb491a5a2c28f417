// ==========================================
// 人道反馈看板 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine
// 系统定位: 一线反馈（谣言/问题/关切）表格导入与打标
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 表格导入流水线
pub mod importer;

// 配置层 - 运行时配置与内置导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CellValue, ColumnKind, ColumnSpec, FeedbackItem, FieldValue, ImportOutcome, ItemRecord,
    RawCell, SheetProfile, TermRef,
};

// 导入
pub use importer::{ImportError, ImportResult, SheetImporter};

// 仓储
pub use repository::{
    ItemStore, ProfileStore, RepositoryError, SqliteItemStore, SqliteProfileStore,
    SqliteTaxonomyRepository,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "人道反馈看板";
