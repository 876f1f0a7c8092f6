//! Field checks for form submissions.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::transactions_model::{parse_rate, TransactionEntry, TransactionSubmission};
use crate::categories::normalize_category;
use crate::constants::MAX_ENTRY_AMOUNT;
use crate::errors::{Result, ValidationError};
use crate::fx::CustomRateRequest;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(',', "");
    cleaned
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// A spend amount: greater than zero and at most [`MAX_ENTRY_AMOUNT`].
pub fn entry_amount(raw: &str) -> Option<Decimal> {
    parse_amount(raw).filter(|a| *a > Decimal::ZERO && *a <= Decimal::from(MAX_ENTRY_AMOUNT))
}

/// Checks a submission and returns its typed form.
///
/// All failing fields are collected into a single
/// [`ValidationError::InvalidFields`].
pub fn validate_submission(
    submission: &TransactionSubmission,
) -> Result<(TransactionEntry, CustomRateRequest)> {
    let mut invalid = Vec::new();

    let heading = present(&submission.budget_heading);
    let outcome = present(&submission.outcome);
    let activity = present(&submission.activity);
    let budget_line = present(&submission.budget_line);
    let description = present(&submission.description);
    let partner = present(&submission.partner);

    for (label, value) in [
        ("Budget Heading", heading),
        ("Outcome", outcome),
        ("Activity", activity),
        ("Budget Line", budget_line),
        ("Description", description),
        ("Partner", partner),
    ] {
        if value.is_none() {
            invalid.push(label.to_string());
        }
    }

    let entry_date = present(&submission.entry_date).and_then(parse_entry_date);
    if entry_date.is_none() {
        invalid.push("Date".to_string());
    }

    let amount = present(&submission.amount).and_then(entry_amount);
    if amount.is_none() {
        invalid.push("Amount".to_string());
    }

    let category = heading.map(normalize_category).filter(|c| !c.is_empty());
    if heading.is_some() && category.is_none() {
        invalid.push("Budget Heading".to_string());
    }

    match (heading, category, outcome, activity, budget_line, description, partner, entry_date, amount) {
        (
            Some(heading),
            Some(category),
            Some(outcome),
            Some(activity),
            Some(budget_line),
            Some(description),
            Some(partner),
            Some(entry_date),
            Some(amount),
        ) if invalid.is_empty() => {
            let entry = TransactionEntry {
                budget_heading: heading.to_string(),
                category,
                outcome: outcome.to_string(),
                activity: activity.to_string(),
                budget_line: budget_line.to_string(),
                description: description.to_string(),
                partner: partner.to_string(),
                entry_date,
                amount,
                pv_number: present(&submission.pv_number).map(String::from),
            };
            let rates = CustomRateRequest {
                use_custom_rate: submission.use_custom_rate,
                usd_to_etb: parse_rate(submission.usd_to_etb.as_deref()),
                eur_to_etb: parse_rate(submission.eur_to_etb.as_deref()),
                usd_to_eur: parse_rate(submission.usd_to_eur.as_deref()),
            };
            Ok((entry, rates))
        }
        _ => Err(ValidationError::InvalidFields(invalid).into()),
    }
}
