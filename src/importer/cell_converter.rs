// ==========================================
// 人道反馈看板 - 单元格转换器
// ==========================================
// 职责: 单个单元格值 → 按列类型转换后的字段值
// 红线: 纯函数,无副作用,不访问存储
// ==========================================

use crate::domain::item::{CellValue, FieldValue};
use crate::domain::profile::{ColumnKind, ColumnSpec};
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::str::FromStr;

/// protection_concern 列命中时写入的词条
pub const PROTECTION_CONCERN_TERM: &str = "Protection Concern";

// 宽松日期解析的候选格式（声明格式解析失败后依次尝试）
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d %B %Y %H:%M",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y", "%d.%m.%Y", "%d-%m-%Y", "%Y%m%d",
    "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y", "%d-%b-%Y",
];

pub struct CellConverter;

impl CellConverter {
    /// 按列类型转换单元格值
    ///
    /// # 参数
    /// - value: 标准化后的单元格值
    /// - column: 列定义
    ///
    /// # 返回
    /// - Ok(FieldValue): 转换结果（text/taxonomy 永不为空值,date 允许为空）
    /// - Err(ImportError::Data): 值无法转换 / 未知类型（调用方追加行号）
    /// - Err(ImportError::Configuration): date 列缺少 date_format 且值为字符串
    ///
    /// # 说明
    /// - ignore 列不应调用本函数（行处理器会直接跳过）
    pub fn convert(&self, value: &CellValue, column: &ColumnSpec) -> ImportResult<FieldValue> {
        let type_name = column.type_name();
        match &column.kind {
            ColumnKind::Text | ColumnKind::Taxonomy { .. } => Ok(FieldValue::Text(to_text(value))),
            ColumnKind::Integer => self.convert_integer(value).map(FieldValue::Integer),
            ColumnKind::Number => self.convert_number(value).map(FieldValue::Number),
            ColumnKind::Date { date_format } => self
                .convert_date(value, &column.field, date_format.as_deref())
                .map(FieldValue::Date),
            ColumnKind::ProtectionConcern => {
                let flagged = to_text(value).trim().eq_ignore_ascii_case("yes");
                Ok(FieldValue::Text(if flagged {
                    PROTECTION_CONCERN_TERM.to_string()
                } else {
                    String::new()
                }))
            }
            ColumnKind::Ignore | ColumnKind::Unknown(_) => {
                Err(ImportError::unknown_data_type(type_name))
            }
        }
    }

    /// integer: 整数文本、浮点（截断）、布尔
    fn convert_integer(&self, value: &CellValue) -> ImportResult<i64> {
        let fail = |error: &str| ImportError::cannot_process(error, &value.to_string(), "integer");

        match value {
            CellValue::Int(i) => Ok(*i),
            CellValue::Bool(b) => Ok(i64::from(*b)),
            CellValue::Float(f) => {
                // 向零截断
                if f.is_finite() && f.abs() < i64::MAX as f64 {
                    Ok(f.trunc() as i64)
                } else {
                    Err(fail("invalid literal for integer"))
                }
            }
            CellValue::Text(s) => s.trim().parse::<i64>().map_err(|e| fail(&e.to_string())),
            CellValue::Empty => Err(fail("missing value")),
            CellValue::DateTime(_) | CellValue::DateTimeTz(_) => {
                Err(fail("date value is not a number"))
            }
        }
    }

    /// number: 任意精度十进制（不经过二进制浮点运算）
    fn convert_number(&self, value: &CellValue) -> ImportResult<Decimal> {
        let fail = |error: &str| ImportError::cannot_process(error, &value.to_string(), "number");

        match value {
            CellValue::Int(i) => Ok(Decimal::from(*i)),
            CellValue::Bool(b) => Ok(Decimal::from(i64::from(*b))),
            // f64 的 Display 输出最短可回读表示,再按十进制解析
            CellValue::Float(f) => parse_decimal(&f.to_string()).map_err(|e| fail(&e)),
            CellValue::Text(s) => parse_decimal(s.trim()).map_err(|e| fail(&e)),
            CellValue::Empty => Err(fail("missing value")),
            CellValue::DateTime(_) | CellValue::DateTimeTz(_) => {
                Err(fail("date value is not a number"))
            }
        }
    }

    /// date: 原生日期直接使用；字符串先按声明格式,失败后宽松解析
    ///
    /// 无时区结果一律视为 UTC；自带时区的保持不变
    fn convert_date(
        &self,
        value: &CellValue,
        field: &str,
        date_format: Option<&str>,
    ) -> ImportResult<Option<DateTime<FixedOffset>>> {
        match value {
            CellValue::Empty => Ok(None),
            CellValue::Text(s) if s.is_empty() => Ok(None),
            CellValue::Text(s) => {
                let format = date_format.ok_or_else(|| ImportError::date_format_missing(field))?;
                parse_with_format(s, format)
                    .or_else(|_| parse_flexible(s).ok_or_else(|| unknown_format(s)))
                    .map(Some)
                    .map_err(|e| ImportError::cannot_process(&e, s, "date"))
            }
            CellValue::DateTime(naive) => Ok(Some(assume_utc(*naive))),
            CellValue::DateTimeTz(dt) => Ok(Some(*dt)),
            CellValue::Int(_) | CellValue::Float(_) | CellValue::Bool(_) => Err(
                ImportError::cannot_process("value is not a date", &value.to_string(), "date"),
            ),
        }
    }
}

/// 文本渲染（空值 → 空字符串）
pub fn to_text(value: &CellValue) -> String {
    value.to_string()
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| e.to_string())
}

fn unknown_format(raw: &str) -> String {
    format!("Unknown string format: {}", raw)
}

fn assume_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

/// strptime 风格格式 → chrono 格式
///
/// 仅 ".%f"（点后可变位数小数秒）需要改写为 "%.f"
fn to_chrono_format(format: &str) -> Cow<'_, str> {
    if format.contains(".%f") {
        Cow::Owned(format.replace(".%f", "%.f"))
    } else {
        Cow::Borrowed(format)
    }
}

/// 按声明格式精确解析（整串匹配）
pub fn parse_with_format(raw: &str, format: &str) -> Result<DateTime<FixedOffset>, String> {
    let format = to_chrono_format(format);

    if let Ok(dt) = DateTime::parse_from_str(raw, &format) {
        return Ok(dt);
    }

    match NaiveDateTime::parse_from_str(raw, &format) {
        Ok(naive) => Ok(assume_utc(naive)),
        Err(e) => NaiveDate::parse_from_str(raw, &format)
            .map(|date| assume_utc(date.and_time(NaiveTime::MIN)))
            .map_err(|_| e.to_string()),
    }
}

/// 宽松日期解析
pub fn parse_flexible(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }

    ZONED_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(assume_utc)
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .map(|date| assume_utc(date.and_time(NaiveTime::MIN)))
        })
}
