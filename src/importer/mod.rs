// ==========================================
// 人道反馈看板 - 导入层
// ==========================================
// 职责: 上传表格 → 类型化条目 → 条目库
// 支持: Excel (.xlsx)
// ==========================================

// 模块声明
pub mod cell_converter;
pub mod column_resolver;
pub mod error;
pub mod row_processor;
pub mod sheet_importer;
pub mod workbook_reader;

// 重导出核心类型
pub use cell_converter::CellConverter;
pub use column_resolver::ColumnResolver;
pub use error::{ImportError, ImportResult};
pub use row_processor::RowProcessor;
pub use sheet_importer::SheetImporter;
