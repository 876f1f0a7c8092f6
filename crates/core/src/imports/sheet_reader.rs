//! Turns an uploaded file into rows of trimmed cell text.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, Terminator};

use crate::errors::{Error, Result, ValidationError};
use crate::transactions::DATE_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SheetFormat {
    /// Picks the format from the file extension.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" => Ok(SheetFormat::Xlsx),
            "xls" => Ok(SheetFormat::Xls),
            "csv" => Ok(SheetFormat::Csv),
            _ => Err(ValidationError::InvalidInput(
                "Invalid file type. Please upload an Excel file (.xlsx or .xls) or a CSV file"
                    .to_string(),
            )
            .into()),
        }
    }
}

/// Reads every row of the first worksheet (or of the CSV file).
pub fn read_rows(bytes: &[u8], format: SheetFormat) -> Result<Vec<Vec<String>>> {
    match format {
        SheetFormat::Csv => read_csv_rows(bytes),
        SheetFormat::Xlsx | SheetFormat::Xls => read_workbook_rows(bytes),
    }
}

fn read_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let content = String::from_utf8_lossy(bytes);
    let content = content.trim_start_matches('\u{feff}');

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| cell.trim_end_matches('\r').trim().to_string())
                .collect(),
        );
    }
    Ok(rows)
}

fn read_workbook_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Import("The workbook has no worksheets".to_string()))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.get(..10).unwrap_or(s).to_string(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            log::debug!("Spreadsheet cell error: {:?}", e);
            String::new()
        }
    }
}
