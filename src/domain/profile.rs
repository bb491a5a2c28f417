// ==========================================
// 人道反馈看板 - 导入配置 (Sheet Profile)
// ==========================================
// 依据: sheet_profile 表中的 JSON 配置格式
// 用途: 描述某一数据来源的表格列映射、格式、静态分类
// 红线: 导入过程中只读,仅由管理迁移创建/更新
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 当前唯一支持的文件格式
pub const FORMAT_EXCEL: &str = "excel";

/// ignore 列的目标字段哨兵值
pub const IGNORE_FIELD: &str = "ignore";

/// taxonomy 列的目标字段约定值
pub const TERMS_FIELD: &str = "terms";

// ==========================================
// SheetProfile - 导入配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetProfile {
    #[serde(default)]
    pub label: String, // 来源标识（查找键）

    #[serde(default)]
    pub name: String, // 显示名称

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>, // 文件格式（目前仅 "excel"）

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub skip_header: bool, // 首行是否为表头

    #[serde(default)]
    pub columns: Vec<ColumnSpec>, // 列定义（有序）

    #[serde(default)]
    pub taxonomies: BTreeMap<String, String>, // 静态分类: taxonomy slug → term 名称
}

impl SheetProfile {
    /// 创建空配置（format = excel）
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
            format: Some(FORMAT_EXCEL.to_string()),
            skip_header: false,
            columns: Vec::new(),
            taxonomies: BTreeMap::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_header(mut self, skip_header: bool) -> Self {
        self.skip_header = skip_header;
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: impl Into<String>, term: impl Into<String>) -> Self {
        self.taxonomies.insert(taxonomy.into(), term.into());
        self
    }

    /// 列名 → 列定义
    ///
    /// 假定列名在同一配置内唯一；重名时后者覆盖前者
    pub fn columns_by_name(&self) -> HashMap<&str, &ColumnSpec> {
        self.columns
            .iter()
            .map(|column| (column.name.as_str(), column))
            .collect()
    }

    /// 根据目标字段反查列的显示名称（用于错误报告）
    pub fn column_name_for_field(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .rev()
            .find(|column| column.field == field)
            .map(|column| column.name.as_str())
    }
}

// ==========================================
// ColumnSpec - 列定义
// ==========================================
// JSON 形态: {"name": .., "field": .., "type": .., "date_format"?: .., "taxonomy"?: ..}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawColumnSpec", into = "RawColumnSpec")]
pub struct ColumnSpec {
    pub name: String,     // 表头名称（仅表头解析时使用）
    pub field: String,    // 目标字段名
    pub kind: ColumnKind, // 列类型及类型专属参数
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, field: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, field, ColumnKind::Text)
    }

    pub fn integer(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, field, ColumnKind::Integer)
    }

    pub fn number(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, field, ColumnKind::Number)
    }

    pub fn date(
        name: impl Into<String>,
        field: impl Into<String>,
        date_format: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            field,
            ColumnKind::Date {
                date_format: Some(date_format.into()),
            },
        )
    }

    pub fn taxonomy(name: impl Into<String>, taxonomy: impl Into<String>) -> Self {
        Self::new(
            name,
            TERMS_FIELD,
            ColumnKind::Taxonomy {
                taxonomy: Some(taxonomy.into()),
            },
        )
    }

    pub fn ignore(name: impl Into<String>) -> Self {
        Self::new(name, IGNORE_FIELD, ColumnKind::Ignore)
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }
}

// ==========================================
// ColumnKind - 列类型
// ==========================================
// 类型专属参数只挂在对应变体上（date_format 仅 Date，taxonomy 仅 Taxonomy）
// 未识别的类型保留原始名称,在转换时报错而不是在加载配置时报错
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Number,
    Date { date_format: Option<String> },
    Taxonomy { taxonomy: Option<String> },
    ProtectionConcern,
    Ignore,
    Unknown(String),
}

impl ColumnKind {
    /// 配置中的类型名称
    pub fn type_name(&self) -> &str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Number => "number",
            ColumnKind::Date { .. } => "date",
            ColumnKind::Taxonomy { .. } => "taxonomy",
            ColumnKind::ProtectionConcern => "protection_concern",
            ColumnKind::Ignore => "ignore",
            ColumnKind::Unknown(name) => name.as_str(),
        }
    }

    fn from_parts(type_name: &str, date_format: Option<String>, taxonomy: Option<String>) -> Self {
        match type_name {
            "text" => ColumnKind::Text,
            "integer" => ColumnKind::Integer,
            "number" => ColumnKind::Number,
            "date" => ColumnKind::Date { date_format },
            "taxonomy" => ColumnKind::Taxonomy { taxonomy },
            "protection_concern" => ColumnKind::ProtectionConcern,
            "ignore" => ColumnKind::Ignore,
            other => ColumnKind::Unknown(other.to_string()),
        }
    }
}

// 序列化中间结构（保持与存量 JSON 配置一致的扁平形态）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawColumnSpec {
    #[serde(default)]
    name: String,
    #[serde(default)]
    field: String,
    #[serde(rename = "type", default)]
    column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    taxonomy: Option<String>,
}

impl From<RawColumnSpec> for ColumnSpec {
    fn from(raw: RawColumnSpec) -> Self {
        let kind = ColumnKind::from_parts(&raw.column_type, raw.date_format, raw.taxonomy);
        Self {
            name: raw.name,
            field: raw.field,
            kind,
        }
    }
}

impl From<ColumnSpec> for RawColumnSpec {
    fn from(spec: ColumnSpec) -> Self {
        let column_type = spec.kind.type_name().to_string();
        let (date_format, taxonomy) = match spec.kind {
            ColumnKind::Date { date_format } => (date_format, None),
            ColumnKind::Taxonomy { taxonomy } => (None, taxonomy),
            _ => (None, None),
        };
        Self {
            name: spec.name,
            field: spec.field,
            column_type,
            date_format,
            taxonomy,
        }
    }
}

/// skip_header 兼容 true/false、1/0、"1"/"" 等写法
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => false,
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        Some(Flag::Float(f)) => f != 0.0,
        Some(Flag::Text(s)) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no"
        ),
    })
}
