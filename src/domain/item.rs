// ==========================================
// 人道反馈看板 - 单元格与条目领域模型
// ==========================================
// 用途: 导入层产生,仓储层消费
// 流程: RawCell → CellValue → FieldValue → ItemRecord → FeedbackItem
// ==========================================

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// CellValue - 标准化后的单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),          // 不带时区（表格原生日期）
    DateTimeTz(DateTime<FixedOffset>), // 带时区
}

impl CellValue {
    /// 空单元格或空字符串
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            // 整数值的浮点（Excel 数字单元格）不输出小数部分
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::DateTimeTz(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%:z")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

// ==========================================
// RawCell - 原始单元格
// ==========================================
// Scalar: 已是标量的输入（测试数据、CSV 风格行）
// Wrapped: 表格库产出的带坐标单元格
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Scalar(CellValue),
    Wrapped(SheetCell),
}

/// 工作表单元格（0 基坐标）
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub value: CellValue,
    pub row: u32,
    pub column: u32,
}

impl RawCell {
    /// 取出单元格的值
    pub fn normalize(self) -> CellValue {
        match self {
            RawCell::Scalar(value) => value,
            RawCell::Wrapped(cell) => cell.value,
        }
    }
}

impl From<CellValue> for RawCell {
    fn from(value: CellValue) -> Self {
        RawCell::Scalar(value)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Scalar(value.into())
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        RawCell::Scalar(value.into())
    }
}

impl From<Option<&str>> for RawCell {
    fn from(value: Option<&str>) -> Self {
        RawCell::Scalar(value.into())
    }
}

/// 标准化整行
pub fn normalize_row(row: Vec<RawCell>) -> Vec<CellValue> {
    row.into_iter().map(RawCell::normalize).collect()
}

// ==========================================
// FieldValue - 类型化字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(Decimal),
    Date(Option<DateTime<FixedOffset>>), // date 是唯一允许为空的类型
}

impl FieldValue {
    pub fn utc(dt: DateTime<Utc>) -> Self {
        FieldValue::Date(Some(dt.fixed_offset()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            FieldValue::Date(dt) => *dt,
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(d) => write!(f, "{}", d),
            FieldValue::Date(Some(dt)) => write!(f, "{}", dt.to_rfc3339()),
            FieldValue::Date(None) => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

// ==========================================
// TermRef - 分类词条引用 {taxonomy, name}
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRef {
    pub taxonomy: String, // taxonomy slug
    pub name: String,     // term 名称
}

impl TermRef {
    pub fn new(taxonomy: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            name: name.into(),
        }
    }
}

// ==========================================
// ItemRecord - 单行处理结果
// ==========================================
// fields: 非 ignore 列的目标字段 → 值
// terms: 单元格派生词条在前,配置静态分类在后
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemRecord {
    pub fields: BTreeMap<String, FieldValue>,
    pub terms: Vec<TermRef>,
}

impl ItemRecord {
    pub fn push_term(&mut self, taxonomy: impl Into<String>, name: impl Into<String>) {
        self.terms.push(TermRef::new(taxonomy, name));
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// 带源文件行号的记录（行号只用于报错,落库前剥离）
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    pub row_number: usize,
    pub record: ItemRecord,
}

// ==========================================
// FeedbackItem - 已落库的反馈条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    pub id: i64,
    pub body: String,
    pub translation: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub network_provider: String,
    pub location: String,
    pub sub_location: String,
    pub language: String,
    pub risk: String,
    pub gender: String,
    pub age: String,
    pub contributor: String,
    pub collection_type: String,
    pub external_id: String,
    pub terms: Vec<TermRef>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
// num_skipped 只统计唯一键重复,不含校验失败（校验失败整批中止）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub num_saved: usize,
    pub num_skipped: usize,
}

impl ImportOutcome {
    /// 上传成功提示
    ///
    /// # 示例
    /// - "Upload successful! 3 entries have been added."
    /// - "Upload successful! 1 entry has been added. 2 duplicate entries were skipped."
    pub fn notice(&self) -> String {
        let mut messages = vec![
            crate::i18n::t("upload.successful"),
            crate::i18n::t_plural("upload.entries_added", self.num_saved),
        ];

        if self.num_skipped > 0 {
            messages.push(crate::i18n::t_plural(
                "upload.duplicates_skipped",
                self.num_skipped,
            ));
        }

        messages.join(" ")
    }
}

impl From<ImportOutcome> for (usize, usize) {
    fn from(outcome: ImportOutcome) -> Self {
        (outcome.num_saved, outcome.num_skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_row_unwraps_cells() {
        let row = vec![
            RawCell::from(5i64),
            RawCell::from("London"),
            RawCell::Wrapped(SheetCell {
                value: CellValue::from("1.1.2015"),
                row: 0,
                column: 2,
            }),
        ];

        assert_eq!(
            normalize_row(row),
            vec![
                CellValue::Int(5),
                CellValue::Text("London".to_string()),
                CellValue::Text("1.1.2015".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_values() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::from("").is_blank());
        assert!(CellValue::from(None::<&str>).is_blank());
        assert!(!CellValue::from(" ").is_blank());
        assert!(!CellValue::Int(0).is_blank());
    }

    #[test]
    fn test_float_display_drops_integral_fraction() {
        assert_eq!(CellValue::Float(8737.0).to_string(), "8737");
        assert_eq!(CellValue::Float(10.4).to_string(), "10.4");
    }

    #[test]
    fn test_notice_without_duplicates() {
        let outcome = ImportOutcome {
            num_saved: 3,
            num_skipped: 0,
        };
        assert_eq!(
            outcome.notice(),
            "Upload successful! 3 entries have been added."
        );
    }

    #[test]
    fn test_notice_with_duplicates() {
        let outcome = ImportOutcome {
            num_saved: 1,
            num_skipped: 2,
        };
        assert_eq!(
            outcome.notice(),
            "Upload successful! 1 entry has been added. 2 duplicate entries were skipped."
        );
    }
}
