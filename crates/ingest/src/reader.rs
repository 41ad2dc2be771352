//! Readers for the supported tabular formats. CSV decoding tries UTF-8
//! first and falls back to windows-1252, the usual encoding of legacy
//! CRM/ERP exports.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use utoipa::ToSchema;

use coalesce_core::error::{MdmError, MdmResult};
use coalesce_core::types::FileType;

/// One parsed row: source column name -> cell text. Empty cells are
/// omitted.
pub type Row = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilePreview {
    pub columns: Vec<String>,
    pub sample_rows: Vec<HashMap<String, String>>,
    pub total_rows: u64,
}

/// Read a file of the given type into columns and rows.
pub fn read_table(path: &Path, file_type: FileType) -> MdmResult<TableData> {
    match file_type {
        FileType::Csv => {
            let bytes = std::fs::read(path)?;
            read_csv_bytes(&bytes)
        }
        FileType::Xlsx | FileType::Xls => read_excel(path),
    }
}

/// Columns plus the first `max_rows` rows.
pub fn preview(table: &TableData, max_rows: usize) -> FilePreview {
    FilePreview {
        columns: table.columns.clone(),
        sample_rows: table.rows.iter().take(max_rows).cloned().collect(),
        total_rows: table.rows.len() as u64,
    }
}

pub fn read_csv_bytes(bytes: &[u8]) -> MdmResult<TableData> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| MdmError::InvalidInput(format!("Could not read CSV header: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| MdmError::InvalidInput(format!("Could not read CSV row: {e}")))?;
        let mut row = Row::new();
        for (column, value) in columns.iter().zip(record.iter()) {
            let value = value.trim();
            if !value.is_empty() {
                row.insert(column.clone(), value.to_string());
            }
        }
        rows.push(row);
    }
    Ok(TableData { columns, rows })
}

fn read_excel(path: &Path) -> MdmResult<TableData> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| MdmError::InvalidInput(format!("Could not open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MdmError::InvalidInput("Workbook has no sheets".to_string()))?
        .map_err(|e| MdmError::InvalidInput(format!("Could not read worksheet: {e}")))?;

    let mut row_iter = range.rows();
    let columns: Vec<String> = match row_iter.next() {
        Some(header) => header.iter().map(|c| cell_text(c)).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for cells in row_iter {
        let mut row = Row::new();
        for (column, cell) in columns.iter().zip(cells.iter()) {
            let value = cell_text(cell);
            if !value.is_empty() && !column.is_empty() {
                row.insert(column.clone(), value);
            }
        }
        rows.push(row);
    }
    Ok(TableData { columns, rows })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_keyed_by_header() {
        let data = b"Company,Email\nAcme,ops@acme.com\n\"Globex, Inc.\",info@globex.com\n";
        let table = read_csv_bytes(data).unwrap();
        assert_eq!(table.columns, vec!["Company", "Email"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1]["Company"], "Globex, Inc.");
    }

    #[test]
    fn test_empty_cells_are_omitted() {
        let table = read_csv_bytes(b"a,b\n1,\n").unwrap();
        assert_eq!(table.rows[0].get("a").map(String::as_str), Some("1"));
        assert!(!table.rows[0].contains_key("b"));
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "Müller" in windows-1252: 0xFC is not valid UTF-8.
        let data = b"name\nM\xFCller\n";
        let table = read_csv_bytes(data).unwrap();
        assert_eq!(table.rows[0]["name"], "M\u{fc}ller");
    }

    #[test]
    fn test_preview_caps_rows() {
        let table = read_csv_bytes(b"a\n1\n2\n3\n4\n").unwrap();
        let preview = preview(&table, 2);
        assert_eq!(preview.sample_rows.len(), 2);
        assert_eq!(preview.total_rows, 4);
    }
}
