// ==========================================
// 人道反馈看板 - 数据仓储层
// ==========================================
// 红线: Repository 不含导入业务逻辑
// ==========================================
// 职责: 提供导入配置、条目、分类体系的数据访问接口
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod item_repo;
pub mod profile_repo;
pub mod taxonomy_repo;

// 重导出核心仓储
pub use error::{FieldError, RepositoryError, RepositoryResult};
pub use item_repo::{ItemStore, SqliteItemStore};
pub use profile_repo::{ProfileStore, SqliteProfileStore};
pub use taxonomy_repo::SqliteTaxonomyRepository;
