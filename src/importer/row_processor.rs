// ==========================================
// 人道反馈看板 - 行处理器
// ==========================================
// 职责: 原始行 + 有序列定义 → ItemRecord（字段值 + 单元格派生词条）
// 说明: 不处理行号,行号由批量导入器追加
// ==========================================

use crate::domain::item::{normalize_row, CellValue, ItemRecord, RawCell};
use crate::domain::profile::{ColumnKind, ColumnSpec};
use crate::importer::cell_converter::CellConverter;
use crate::importer::error::{ImportError, ImportResult};

/// protection_concern 词条所属分类
pub const PROTECTION_CONCERN_TAXONOMY: &str = "tags";

pub struct RowProcessor {
    converter: CellConverter,
}

impl RowProcessor {
    pub fn new() -> Self {
        Self {
            converter: CellConverter,
        }
    }

    /// 处理一行原始单元格（先标准化再处理）
    pub fn process(&self, row: Vec<RawCell>, columns: &[ColumnSpec]) -> ImportResult<ItemRecord> {
        self.process_values(&normalize_row(row), columns)
    }

    /// 处理一行已标准化的值
    ///
    /// 值与列按位置配对,任一侧多出的部分直接丢弃
    pub fn process_values(
        &self,
        values: &[CellValue],
        columns: &[ColumnSpec],
    ) -> ImportResult<ItemRecord> {
        let mut record = ItemRecord::default();

        for (value, column) in values.iter().zip(columns) {
            match &column.kind {
                ColumnKind::Ignore => continue,
                ColumnKind::Taxonomy { taxonomy } => {
                    let slug = taxonomy
                        .as_deref()
                        .ok_or_else(|| ImportError::taxonomy_missing(&column.name))?;
                    let text = self.converter.convert(value, column)?.to_string();

                    for name in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                        record.push_term(slug, name);
                    }
                }
                ColumnKind::ProtectionConcern => {
                    let term = self.converter.convert(value, column)?.to_string();
                    if !term.is_empty() {
                        record.push_term(PROTECTION_CONCERN_TAXONOMY, term);
                    }
                }
                _ => {
                    let converted = self.converter.convert(value, column)?;
                    record.fields.insert(column.field.clone(), converted);
                }
            }
        }

        Ok(record)
    }
}

impl Default for RowProcessor {
    fn default() -> Self {
        Self::new()
    }
}
