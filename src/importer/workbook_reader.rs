// ==========================================
// 人道反馈看板 - 工作簿读取器
// ==========================================
// 支持: Excel (.xlsx)，仅读取第一个工作表
// 说明: 前导空行/空列补齐,保证行号与源文件一致
// ==========================================

use crate::domain::item::{CellValue, RawCell, SheetCell};
use crate::domain::profile::FORMAT_EXCEL;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};
use chrono::DateTime;
use std::io::{Cursor, Read};

/// 读取上传文件的全部行
///
/// # 参数
/// - format: 配置声明的文件格式（目前只支持 "excel"）
/// - file: 上传内容
///
/// # 返回
/// - Ok(rows): rows[i] 对应源文件第 i+1 行
/// - Err: "Unsupported file format" / "Expected excel file..."
pub fn read_rows<R: Read>(format: Option<&str>, file: R) -> ImportResult<Vec<Vec<RawCell>>> {
    match format {
        Some(FORMAT_EXCEL) => read_first_sheet(file),
        other => Err(ImportError::unsupported_format(other.unwrap_or("None"))),
    }
}

/// 读取 xlsx 第一个工作表
pub fn read_first_sheet<R: Read>(mut file: R) -> ImportResult<Vec<Vec<RawCell>>> {
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer).map_err(|e| {
        tracing::warn!(error = %e, "上传内容读取失败");
        ImportError::expected_excel()
    })?;

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(buffer))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => {
            tracing::warn!("工作簿中没有工作表");
            return Err(ImportError::expected_excel());
        }
    };

    // Range 从第一个非空单元格开始
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<RawCell>> = (0..start_row).map(|_| Vec::new()).collect();

    for (offset, cells) in range.rows().enumerate() {
        let row = start_row + offset as u32;
        let mut values: Vec<RawCell> = (0..start_col)
            .map(|_| RawCell::Scalar(CellValue::Empty))
            .collect();

        values.extend(cells.iter().enumerate().map(|(index, cell)| {
            RawCell::Wrapped(SheetCell {
                value: to_cell_value(cell),
                row,
                column: start_col + index as u32,
            })
        }));

        rows.push(values);
    }

    tracing::debug!(rows = rows.len(), "工作表读取完成");

    Ok(rows)
}

/// calamine 单元格 → CellValue
fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match cell.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(aware) => CellValue::DateTimeTz(aware),
            Err(_) => cell
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
