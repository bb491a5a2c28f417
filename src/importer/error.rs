// ==========================================
// 人道反馈看板 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: Display 即面向最终用户的完整消息,调用方原样展示
// ==========================================

use crate::i18n::t_with_args;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
///
/// 所有失败对外都是同一种错误,变体只用于区分来源与是否追加行号
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    // ===== 配置错误（不带行号）=====
    #[error("{0}")]
    Configuration(String),

    // ===== 行数据错误 =====
    /// 尚未附加行号的单元格/表头错误
    #[error("{0}")]
    Data(String),

    /// 已附加源文件行号
    #[error("{message}{}", row_suffix(.row))]
    Row { row: usize, message: String },

    // ===== 持久化错误 =====
    /// 下游存储拒绝了某条记录（消息中已含行号）
    #[error("{0}")]
    Persistence(String),

    /// 存储基础设施故障
    #[error("{0}")]
    Storage(String),
}

fn row_suffix(row: &usize) -> String {
    t_with_args("import.in_row", &[("row", &row.to_string())])
}

impl ImportError {
    pub fn profile_not_found(label: &str) -> Self {
        ImportError::Configuration(t_with_args("import.profile_not_found", &[("label", label)]))
    }

    pub fn unsupported_format(format: &str) -> Self {
        ImportError::Configuration(t_with_args(
            "import.unsupported_format",
            &[("format", format)],
        ))
    }

    pub fn expected_excel() -> Self {
        ImportError::Configuration(t_with_args("import.expected_excel", &[]))
    }

    pub fn date_format_missing(field: &str) -> Self {
        ImportError::Configuration(t_with_args("import.date_format_missing", &[("field", field)]))
    }

    pub fn taxonomy_missing(field: &str) -> Self {
        ImportError::Configuration(t_with_args("import.taxonomy_missing", &[("field", field)]))
    }

    pub fn unknown_column(label: &str) -> Self {
        ImportError::Data(t_with_args("import.unknown_column", &[("label", label)]))
    }

    pub fn unknown_data_type(type_name: &str) -> Self {
        ImportError::Data(t_with_args("import.unknown_data_type", &[("type", type_name)]))
    }

    /// 单元格值无法按声明类型转换
    pub fn cannot_process(error: &str, value: &str, type_name: &str) -> Self {
        ImportError::Data(t_with_args(
            "import.cannot_process",
            &[("error", error), ("value", value), ("type", type_name)],
        ))
    }

    /// 追加行号（仅行数据错误,配置错误原样返回）
    pub fn at_row(self, row: usize) -> Self {
        match self {
            ImportError::Data(message) => ImportError::Row { row, message },
            other => other,
        }
    }

    /// 持久化失败: "There was a problem with row N of the spreadsheet:\n..."
    pub fn row_problem(row: usize, details: &[String]) -> Self {
        ImportError::Persistence(t_with_args(
            "import.row_problem",
            &[("row", &row.to_string()), ("details", &details.join("\n"))],
        ))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ImportError::Configuration(_))
    }

    /// 出错的源文件行号
    pub fn row_number(&self) -> Option<usize> {
        match self {
            ImportError::Row { row, .. } => Some(*row),
            _ => None,
        }
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Storage(t_with_args(
            "import.storage_failure",
            &[("error", &err.to_string())],
        ))
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        tracing::debug!(error = %err, "工作簿无法解析");
        ImportError::expected_excel()
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
