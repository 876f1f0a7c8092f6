//! Header matching and per-row validation of import sheets.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::import_model::ImportRowError;
use crate::categories::normalize_category;
use crate::constants::MAX_ENTRY_AMOUNT;
use crate::errors::{Result, ValidationError};
use crate::fx::{Currency, CustomRateRequest};
use crate::transactions::{parse_amount, parse_entry_date, TransactionEntry};

pub const REQUIRED_HEADERS: [&str; 8] = [
    "budget_heading",
    "outcome",
    "activity",
    "budget_line",
    "description",
    "partner",
    "date",
    "amount",
];

pub const OPTIONAL_HEADERS: [&str; 4] = ["currency", "usd_to_etb_rate", "eur_to_etb_rate", "pv_number"];

/// Column positions by lower-cased header name.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_header_row(header: &[String]) -> Result<Self> {
        let mut columns = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let key = name.trim().to_ascii_lowercase();
            if !key.is_empty() {
                columns.entry(key).or_insert(idx);
            }
        }

        let missing: Vec<&str> = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|h| !columns.contains_key(*h))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::InvalidInput(format!(
                "Missing required columns: {}",
                missing.join(", ")
            ))
            .into());
        }

        Ok(Self { columns })
    }

    fn cell<'a>(&self, cells: &'a [String], name: &str) -> Option<&'a str> {
        self.columns
            .get(name)
            .and_then(|idx| cells.get(*idx))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// One validated data row.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub row: usize,
    pub entry: TransactionEntry,
    pub currency: Currency,
    pub custom_rates: CustomRateRequest,
}

fn positive_rate(raw: Option<&str>) -> Option<Decimal> {
    raw.and_then(parse_amount).filter(|r| *r > Decimal::ZERO)
}

fn parse_row(headers: &HeaderMap, row: usize, cells: &[String]) -> std::result::Result<ImportRow, ImportRowError> {
    let required: Vec<Option<&str>> = REQUIRED_HEADERS
        .iter()
        .map(|h| headers.cell(cells, h))
        .collect();
    let &[Some(heading), Some(outcome), Some(activity), Some(budget_line), Some(description), Some(partner), Some(date), Some(amount)] =
        required.as_slice()
    else {
        return Err(ImportRowError::new(row, "Missing required fields"));
    };

    let entry_date = parse_entry_date(date)
        .ok_or_else(|| ImportRowError::new(row, "Invalid date format. Please use YYYY-MM-DD"))?;
    let amount =
        parse_amount(amount).ok_or_else(|| ImportRowError::new(row, "Amount must be a number"))?;
    if amount <= Decimal::ZERO {
        return Err(ImportRowError::new(row, "Amount must be greater than zero"));
    }
    if amount > Decimal::from(MAX_ENTRY_AMOUNT) {
        return Err(ImportRowError::new(
            row,
            format!("Amount must not exceed {}", MAX_ENTRY_AMOUNT),
        ));
    }

    let category = normalize_category(heading);
    if category.is_empty() {
        return Err(ImportRowError::new(row, "Missing required fields"));
    }

    let usd_to_etb = positive_rate(headers.cell(cells, "usd_to_etb_rate"));
    let eur_to_etb = positive_rate(headers.cell(cells, "eur_to_etb_rate"));

    Ok(ImportRow {
        row,
        entry: TransactionEntry {
            budget_heading: heading.to_string(),
            category,
            outcome: outcome.to_string(),
            activity: activity.to_string(),
            budget_line: budget_line.to_string(),
            description: description.to_string(),
            partner: partner.to_string(),
            entry_date,
            amount,
            pv_number: headers.cell(cells, "pv_number").map(String::from),
        },
        currency: Currency::parse_or(headers.cell(cells, "currency"), Currency::Usd),
        custom_rates: CustomRateRequest {
            use_custom_rate: usd_to_etb.is_some() || eur_to_etb.is_some(),
            usd_to_etb,
            eur_to_etb,
            usd_to_eur: None,
        },
    })
}

/// Splits a sheet into validated rows and row errors, in sheet order.
///
/// The first row must be the header. Entirely blank rows are dropped.
pub fn parse_rows(
    rows: &[Vec<String>],
) -> Result<Vec<std::result::Result<ImportRow, ImportRowError>>> {
    let Some((header, data)) = rows.split_first() else {
        return Err(ValidationError::InvalidInput("The file is empty".to_string()).into());
    };
    let headers = HeaderMap::from_header_row(header)?;

    let parsed: Vec<_> = data
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(idx, cells)| parse_row(&headers, idx + 2, cells))
        .collect();

    if parsed.is_empty() {
        return Err(ValidationError::InvalidInput("The file contains no data rows".to_string()).into());
    }
    Ok(parsed)
}
