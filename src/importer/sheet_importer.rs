// ==========================================
// 人道反馈看板 - 表格批量导入器
// ==========================================
// 职责: 整合导入流程,从上传文件到条目库
// 流程: 配置查找 → 打开工作簿 → 逐行解析 → 落库 → 结果统计
// 红线: 任一行解析失败即整批中止（此前的行均不落库）
// 红线: 唯一键重复不是错误,只计入 num_skipped
// ==========================================

use crate::domain::item::{normalize_row, ImportOutcome, ImportedRow, ItemRecord, RawCell};
use crate::domain::profile::SheetProfile;
use crate::i18n::t_with_args;
use crate::importer::column_resolver::ColumnResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_processor::RowProcessor;
use crate::importer::workbook_reader;
use crate::repository::{FieldError, ItemStore, ProfileStore, RepositoryError};
use std::io::Read;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// SheetImporter - 表格批量导入器
// ==========================================
pub struct SheetImporter<P, S>
where
    P: ProfileStore,
    S: ItemStore,
{
    // 导入配置来源
    profiles: P,

    // 条目存储
    items: S,

    // 导入组件
    resolver: ColumnResolver,
    processor: RowProcessor,
}

impl<P, S> SheetImporter<P, S>
where
    P: ProfileStore,
    S: ItemStore,
{
    /// 创建导入器
    ///
    /// # 参数
    /// - profiles: 导入配置存储（只读）
    /// - items: 条目存储/打标接口
    pub fn new(profiles: P, items: S) -> Self {
        Self {
            profiles,
            items,
            resolver: ColumnResolver,
            processor: RowProcessor::new(),
        }
    }

    /// 导入一个上传的表格
    ///
    /// # 参数
    /// - label: 导入配置标签（如 "geopoll"）
    /// - file: 上传内容
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 新增条数 + 重复跳过条数
    /// - Err(ImportError): 单一错误,Display 即面向用户的完整消息
    #[instrument(skip(self, file), fields(batch_id))]
    pub fn store_spreadsheet<R: Read>(&self, label: &str, file: R) -> ImportResult<ImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, label = %label, "开始导入表格");

        // === 配置查找 ===
        let profile = self.get_profile(label)?;

        // === 打开工作簿 ===
        let rows = workbook_reader::read_rows(profile.format.as_deref(), file).map_err(|e| {
            warn!(batch_id = %batch_id, error = %e, "工作簿打开失败");
            e
        })?;
        info!(batch_id = %batch_id, total_rows = rows.len(), "工作簿读取完成");

        // === 逐行解析 ===
        let records = self.process_rows(&profile, rows).map_err(|e| {
            warn!(batch_id = %batch_id, error = %e, "行解析失败,整批中止");
            e
        })?;
        info!(batch_id = %batch_id, records = records.len(), "行解析完成");

        // === 落库 ===
        let total = records.len();
        let num_saved = self.save_rows(&profile, records).map_err(|e| {
            error!(batch_id = %batch_id, error = %e, "落库失败,整批中止");
            e
        })?;

        let outcome = ImportOutcome {
            num_saved,
            num_skipped: total - num_saved,
        };

        info!(
            batch_id = %batch_id,
            num_saved = outcome.num_saved,
            num_skipped = outcome.num_skipped,
            "表格导入完成"
        );

        Ok(outcome)
    }

    /// 按标签查找导入配置
    pub fn get_profile(&self, label: &str) -> ImportResult<SheetProfile> {
        self.profiles
            .get_profile(label)?
            .ok_or_else(|| ImportError::profile_not_found(label))
    }

    /// 解析全部行
    ///
    /// # 说明
    /// - skip_header 时首行作为表头参与列解析,数据行号从 2 开始
    /// - 全空行静默跳过,行号仍按物理位置计数
    /// - 配置中的静态分类追加在单元格派生词条之后
    pub fn process_rows(
        &self,
        profile: &SheetProfile,
        rows: Vec<Vec<RawCell>>,
    ) -> ImportResult<Vec<ImportedRow>> {
        let mut rows = rows.into_iter();

        let header = if profile.skip_header {
            rows.next().map(normalize_row)
        } else {
            None
        };
        let first_row_number = if header.is_some() { 2 } else { 1 };

        // 表头错误不附加行号
        let columns = self.resolver.resolve(&profile.columns, header.as_deref())?;

        let mut records = Vec::new();

        for (row_number, row) in (first_row_number..).zip(rows) {
            let values = normalize_row(row);

            if values.iter().all(|v| v.is_blank()) {
                debug!(row_number = row_number, "跳过空行");
                continue;
            }

            let mut record = self
                .processor
                .process_values(&values, &columns)
                .map_err(|e| e.at_row(row_number))?;

            for (taxonomy, term) in &profile.taxonomies {
                record.push_term(taxonomy, term);
            }

            records.push(ImportedRow { row_number, record });
        }

        Ok(records)
    }

    /// 逐条落库
    ///
    /// # 返回
    /// - Ok(num_saved): 实际新增条数
    /// - Err: 校验/打标被拒绝（已落库的条目不回滚）
    pub fn save_rows(&self, profile: &SheetProfile, records: Vec<ImportedRow>) -> ImportResult<usize> {
        let mut num_saved = 0;

        for ImportedRow { row_number, record } in records {
            let ItemRecord { fields, terms } = record;

            let item = match self.items.create_item(&fields) {
                Ok(item) => item,
                Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                    debug!(row_number = row_number, detail = %msg, "重复条目,跳过");
                    continue;
                }
                Err(e) => return Err(self.persistence_error(profile, row_number, e)),
            };

            for term in terms {
                self.items
                    .add_terms(item.id, &term.taxonomy, &[term.name])
                    .map_err(|e| self.persistence_error(profile, row_number, e))?;
            }

            num_saved += 1;
        }

        Ok(num_saved)
    }

    /// 存储拒绝 → 带行号、列名、字段名、错误码、提交值的描述
    fn persistence_error(
        &self,
        profile: &SheetProfile,
        row_number: usize,
        err: RepositoryError,
    ) -> ImportError {
        let details = match err {
            RepositoryError::ValidationError { errors } => errors
                .iter()
                .map(|e| self.field_error_message(profile, e))
                .collect(),
            RepositoryError::TermRejected {
                detail,
                taxonomy,
                name,
            } => vec![t_with_args(
                "import.term_error",
                &[("detail", &detail), ("taxonomy", &taxonomy), ("name", &name)],
            )],
            other => return other.into(),
        };

        ImportError::row_problem(row_number, &details)
    }

    fn field_error_message(&self, profile: &SheetProfile, error: &FieldError) -> String {
        let column = profile
            .column_name_for_field(&error.field)
            .unwrap_or(&error.field);

        t_with_args(
            "import.field_error",
            &[
                ("column", column),
                ("field", &error.field),
                ("code", &error.code),
                ("message", &error.message),
                ("value", &error.value),
            ],
        )
    }
}
