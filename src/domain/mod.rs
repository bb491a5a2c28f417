// ==========================================
// 人道反馈看板 - 领域模型层
// ==========================================
// 职责: 定义导入配置、单元格值、条目记录、分类体系
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod item;
pub mod profile;
pub mod taxonomy;

// 重导出核心类型
pub use item::{
    normalize_row, CellValue, FeedbackItem, FieldValue, ImportOutcome, ImportedRow, ItemRecord,
    RawCell, SheetCell, TermRef,
};
pub use profile::{ColumnKind, ColumnSpec, SheetProfile, FORMAT_EXCEL, IGNORE_FIELD, TERMS_FIELD};
pub use taxonomy::{Multiplicity, Taxonomy, Term, TermCount, Vocabulary};
