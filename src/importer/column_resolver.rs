// ==========================================
// 人道反馈看板 - 列解析器
// ==========================================
// 职责: 配置列定义 + 可选表头行 → 数据行使用的有序列定义
// 说明: 表头允许重排/缺列/尾部多余列
// ==========================================

use crate::domain::item::CellValue;
use crate::domain::profile::ColumnSpec;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct ColumnResolver;

impl ColumnResolver {
    /// 解析列顺序
    ///
    /// # 参数
    /// - columns: 配置中声明的列（名称唯一）
    /// - header: 文件中的表头行；None 表示沿用配置顺序
    ///
    /// # 返回
    /// - Ok(Vec<ColumnSpec>): 每个命中的表头单元格对应一列,按表头顺序
    /// - Err(ImportError::Data): 表头文本与任何列名都不匹配（"Unknown column: ..."）
    pub fn resolve(
        &self,
        columns: &[ColumnSpec],
        header: Option<&[CellValue]>,
    ) -> ImportResult<Vec<ColumnSpec>> {
        let header = match header {
            Some(header) => header,
            None => return Ok(columns.to_vec()),
        };

        let lookup: HashMap<&str, &ColumnSpec> =
            columns.iter().map(|c| (c.name.trim(), c)).collect();

        let mut resolved = Vec::with_capacity(columns.len());

        // 超出声明列数的表头单元格直接丢弃
        for cell in header.iter().take(columns.len()) {
            let raw = cell.to_string();
            let label = raw.trim();
            if label.is_empty() {
                continue;
            }

            match lookup.get(label) {
                Some(column) => resolved.push((*column).clone()),
                None => {
                    tracing::warn!(label = %raw, "表头列未在配置中声明");
                    // 报告单元格原文
                    return Err(ImportError::unknown_column(&raw));
                }
            }
        }

        tracing::debug!(
            declared = columns.len(),
            resolved = resolved.len(),
            "表头列解析完成"
        );

        Ok(resolved)
    }
}
