//! Budget heading labels.

use std::sync::OnceLock;

use regex::Regex;

fn numeric_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^\s*\d+\s*\.\s*").expect("Invalid regex pattern"))
}

/// Strips a leading `<digits>.` numbering from a budget heading.
///
/// "1. Administrative costs" becomes "Administrative costs"; labels without a
/// prefix are only trimmed.
pub fn normalize_category(label: &str) -> String {
    numeric_prefix().replace(label, "").trim().to_string()
}
