/// Period name of the per-category yearly rollup row
pub const ANNUAL_TOTAL_PERIOD: &str = "Annual Total";

/// Period and category name of the grand total row
pub const GRAND_TOTAL: &str = "Total";

/// Decimal places kept for variance percentages
pub const VARIANCE_DECIMAL_PRECISION: u32 = 2;

/// Decimal places kept for monetary amounts in storage
pub const AMOUNT_DECIMAL_PRECISION: u32 = 10;

/// Decimal places kept for exchange rates in storage
pub const RATE_DECIMAL_PRECISION: u32 = 8;

/// Default USD -> ETB rate when a cluster has none configured
pub const DEFAULT_USD_TO_ETB: &str = "55.0";

/// Default EUR -> ETB rate when a cluster has none configured
pub const DEFAULT_EUR_TO_ETB: &str = "60.0";

/// Upload ceiling for bulk import files
pub const DEFAULT_IMPORT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Largest amount a single entry may carry, in its own currency
pub const MAX_ENTRY_AMOUNT: i64 = 1_000_000_000_000;
