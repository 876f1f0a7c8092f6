//! Bulk import of transactions from spreadsheets.

mod import_model;
mod import_parser;
mod import_service;
mod sheet_reader;

pub use import_model::{ImportOutcome, ImportRowError, ImportSummary, ImportedRow};
pub use import_parser::{parse_rows, HeaderMap, ImportRow, OPTIONAL_HEADERS, REQUIRED_HEADERS};
pub use import_service::{ImportService, ImportServiceTrait};
pub use sheet_reader::{read_rows, SheetFormat};
