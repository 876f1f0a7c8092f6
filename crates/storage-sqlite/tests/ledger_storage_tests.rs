//! End-to-end tests of the ledger services against a real SQLite file.
//!
//! Every test gets its own temporary database with all migrations applied
//! and a running writer.

use std::sync::Arc;

use budgetledger_core::context::RequestContext;
use budgetledger_core::errors::{DatabaseError, Error, ResolutionError, ValidationError};
use budgetledger_core::fx::{ClusterCurrencyUpdate, Currency, FxService, FxServiceTrait};
use budgetledger_core::imports::{ImportService, ImportServiceTrait};
use budgetledger_core::ledger::{
    CertificationStatus, LedgerRow, LedgerScope, LedgerService, LedgerServiceTrait, NewLedgerRow,
    Period,
};
use budgetledger_core::settings::LedgerSettings;
use budgetledger_core::transactions::{
    TransactionService, TransactionServiceTrait, TransactionSource, TransactionSubmission,
};
use budgetledger_storage_sqlite::{
    create_pool, detect_capabilities, get_connection, run_migrations, spawn_writer,
    ClusterCurrencyRepository, DbPool, LedgerRepository, StorageCapabilities,
    TransactionRecordRepository,
};
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

const CLUSTER: &str = "Gambella";
const YEAR: i32 = 2024;

struct Harness {
    _dir: TempDir,
    pool: Arc<DbPool>,
    ledger: LedgerService,
    transactions: TransactionService,
    imports: ImportService,
    fx: Arc<FxService>,
}

fn open_pool() -> (TempDir, Arc<DbPool>) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("ledger.db").to_string_lossy().to_string();
    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    (dir, pool)
}

fn build(dir: TempDir, pool: Arc<DbPool>) -> Harness {
    let capabilities = detect_capabilities(&pool).expect("Failed to inspect schema");
    let writer = spawn_writer((*pool).clone());
    let settings = LedgerSettings::default();

    let ledger_repo = Arc::new(LedgerRepository::new(pool.clone(), writer.clone(), capabilities));
    let record_repo = Arc::new(TransactionRecordRepository::new(pool.clone(), capabilities));
    let fx = Arc::new(FxService::new(Arc::new(ClusterCurrencyRepository::new(
        pool.clone(),
        writer,
    ))));

    Harness {
        _dir: dir,
        pool,
        ledger: LedgerService::new(ledger_repo.clone()),
        transactions: TransactionService::new(
            ledger_repo.clone(),
            ledger_repo.clone(),
            record_repo,
            fx.clone(),
            settings,
        ),
        imports: ImportService::new(ledger_repo, fx.clone(), settings),
        fx,
    }
}

async fn harness() -> Harness {
    let (dir, pool) = open_pool();
    let h = build(dir, pool);
    h.ledger.seed_rows(seed_rows()).await.expect("Failed to seed ledger");
    h
}

fn date(m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(YEAR, m, d)
}

fn row(category: &str, period: Period, budget: Decimal, actual: Decimal, forecast: Decimal) -> NewLedgerRow {
    let (start, end) = match period {
        Period::Q1 => (date(1, 1), date(3, 31)),
        Period::Q2 => (date(4, 1), date(6, 30)),
        Period::Q3 => (date(7, 1), date(9, 30)),
        Period::Q4 => (date(10, 1), date(12, 31)),
        _ => (None, None),
    };
    NewLedgerRow {
        year: YEAR,
        category_name: category.to_string(),
        cluster: Some(CLUSTER.to_string()),
        period,
        budget,
        actual,
        forecast: Some(forecast),
        currency: Some(Currency::Etb),
        start_date: start,
        end_date: end,
    }
}

/// Travel: Q1 1000/200/800, other quarters 1000/0/1000.
/// Operational support costs: 500/0/500 per quarter.
/// Equipment: nothing budgeted.
fn seed_rows() -> Vec<NewLedgerRow> {
    let mut rows = vec![row("Travel", Period::Q1, dec!(1000), dec!(200), dec!(800))];
    for p in [Period::Q2, Period::Q3, Period::Q4] {
        rows.push(row("Travel", p, dec!(1000), dec!(0), dec!(1000)));
    }
    rows.push(row("Travel", Period::AnnualTotal, dec!(4000), dec!(200), dec!(3800)));
    for p in Period::QUARTERS {
        rows.push(row("Operational support costs", p, dec!(500), dec!(0), dec!(500)));
        rows.push(row("Equipment", p, dec!(0), dec!(0), dec!(0)));
    }
    rows.push(row("Operational support costs", Period::AnnualTotal, dec!(2000), dec!(0), dec!(2000)));
    rows.push(row("Equipment", Period::AnnualTotal, dec!(0), dec!(0), dec!(0)));
    rows.push(row("Total", Period::Total, dec!(6000), dec!(200), dec!(5800)));
    rows
}

fn ctx() -> RequestContext {
    RequestContext::new(Some("finance-officer".into()), Some(CLUSTER.into()))
}

fn scope() -> LedgerScope {
    LedgerScope::new(YEAR, Some(CLUSTER.to_string()))
}

fn submission(heading: &str, entry_date: &str, amount: &str) -> TransactionSubmission {
    TransactionSubmission {
        budget_heading: Some(heading.into()),
        outcome: Some("Outcome 1".into()),
        activity: Some("Field visit".into()),
        budget_line: Some("BL-7".into()),
        description: Some("Fuel".into()),
        partner: Some("Partner A".into()),
        entry_date: Some(entry_date.into()),
        amount: Some(amount.into()),
        pv_number: Some("PV-001".into()),
        ..Default::default()
    }
}

fn find(rows: &[LedgerRow], category: &str, period: Period) -> LedgerRow {
    rows.iter()
        .find(|r| r.category_name == category && r.period == period)
        .cloned()
        .unwrap_or_else(|| panic!("no {} {} row", category, period))
}

fn assert_rollups(rows: &[LedgerRow]) {
    let mut annual_budget = Decimal::ZERO;
    let mut annual_actual = Decimal::ZERO;
    let mut annual_forecast = Decimal::ZERO;
    for category in ["Travel", "Operational support costs", "Equipment"] {
        let quarters: Vec<_> = rows
            .iter()
            .filter(|r| r.category_name == category && r.period.is_quarter())
            .collect();
        let annual = find(rows, category, Period::AnnualTotal);
        assert_eq!(annual.figures.budget, quarters.iter().map(|r| r.figures.budget).sum::<Decimal>());
        assert_eq!(annual.figures.actual, quarters.iter().map(|r| r.figures.actual).sum::<Decimal>());
        assert_eq!(
            annual.figures.forecast,
            quarters.iter().map(|r| r.figures.forecast).sum::<Decimal>()
        );
        annual_budget += annual.figures.budget;
        annual_actual += annual.figures.actual;
        annual_forecast += annual.figures.forecast;
    }
    let total = find(rows, "Total", Period::Total);
    assert_eq!(total.figures.budget, annual_budget);
    assert_eq!(total.figures.actual, annual_actual);
    assert_eq!(total.figures.forecast, annual_forecast);
}

#[tokio::test]
async fn submission_updates_quarter_rollups_and_record() {
    let h = harness().await;
    h.ledger.certify(scope()).await.unwrap();

    let result = h
        .transactions
        .submit(&ctx(), submission("1. Travel", "2024-02-10", "300"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.quarter, Period::Q1);
    let quarter = &result.ledger_row;
    assert_eq!(quarter.figures.actual, dec!(500));
    assert_eq!(quarter.figures.forecast, dec!(500));
    assert_eq!(quarter.figures.actual_plus_forecast, dec!(1000));
    assert_eq!(quarter.figures.variance_percentage, dec!(50.00));

    let rows = h.ledger.list_rows(&scope()).unwrap();
    assert_rollups(&rows);
    let total = find(&rows, "Total", Period::Total);
    assert_eq!(total.figures.actual, dec!(500));
    assert_eq!(total.figures.variance_percentage, dec!(91.67));
    assert!(rows.iter().all(|r| r.certified == CertificationStatus::Uncertified));

    let records = h.transactions.list_records(&scope()).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, result.transaction_id);
    assert_eq!(record.budget_heading, "1. Travel");
    assert_eq!(record.category_name, "Travel");
    assert_eq!(record.source, TransactionSource::Entry);
    assert_eq!(record.period, Some(Period::Q1));
    assert_eq!(record.user_id.as_deref(), Some("finance-officer"));
    let snapshot = record.snapshot.as_ref().expect("snapshot synced");
    assert_eq!(snapshot.ledger_row_id, quarter.id);
    assert_eq!(snapshot.actual_spent, dec!(500));
    assert_eq!(snapshot.remaining_budget, dec!(500));
}

#[tokio::test]
async fn spend_on_unbudgeted_category_is_minus_one_hundred_percent() {
    let h = harness().await;
    let result = h
        .transactions
        .submit(&ctx(), submission("3. Equipment", "2024-05-02", "100"))
        .await
        .unwrap();
    assert_eq!(result.quarter, Period::Q2);
    assert_eq!(result.ledger_row.figures.actual, dec!(100));
    assert_eq!(result.ledger_row.figures.variance_percentage, dec!(-100.00));
}

#[tokio::test]
async fn unresolved_heading_writes_nothing() {
    let h = harness().await;
    let before = h.ledger.list_rows(&scope()).unwrap();

    let err = h
        .transactions
        .submit(&ctx(), submission("9. Catering", "2024-02-10", "300"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Resolution(ResolutionError::QuarterNotFound { .. })
    ));

    assert_eq!(h.ledger.list_rows(&scope()).unwrap(), before);
    assert!(h.transactions.list_records(&scope()).unwrap().is_empty());
}

#[tokio::test]
async fn storage_failure_mid_chain_rolls_back_everything() {
    let h = harness().await;
    let before = h.ledger.list_rows(&scope()).unwrap();
    {
        let mut conn = get_connection(&h.pool).unwrap();
        conn.batch_execute(
            "CREATE TRIGGER lock_certification BEFORE UPDATE OF certified ON ledger_rows
             BEGIN SELECT RAISE(ABORT, 'certification is locked'); END;",
        )
        .unwrap();
    }

    let err = h
        .transactions
        .submit(&ctx(), submission("Travel", "2024-02-10", "300"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    assert_eq!(h.ledger.list_rows(&scope()).unwrap(), before);
    assert!(h.transactions.list_records(&scope()).unwrap().is_empty());
}

#[tokio::test]
async fn custom_rate_requires_cluster_permission() {
    let (dir, pool) = open_pool();
    let h = build(dir, pool);
    let mut rows = Vec::new();
    for p in Period::QUARTERS {
        let mut r = row("Travel", p, dec!(1000), dec!(0), dec!(1000));
        r.currency = Some(Currency::Usd);
        rows.push(r);
    }
    let mut annual = row("Travel", Period::AnnualTotal, dec!(4000), dec!(0), dec!(4000));
    annual.currency = Some(Currency::Usd);
    rows.push(annual);
    h.ledger.seed_rows(rows).await.unwrap();

    let mut with_rate = submission("Travel", "2024-03-01", "600");
    with_rate.use_custom_rate = true;
    with_rate.usd_to_etb = Some("60".into());

    h.fx
        .update_cluster_config(
            CLUSTER,
            ClusterCurrencyUpdate {
                usd_to_etb: Some(dec!(55)),
                eur_to_etb: None,
                custom_currency_enabled: false,
            },
        )
        .await
        .unwrap();
    let ignored = h.transactions.submit(&ctx(), with_rate.clone()).await.unwrap();
    assert!(!ignored.custom_rate_applied);
    assert_eq!(ignored.rates_used.usd_to_etb, dec!(55));
    assert_eq!(ignored.amount_converted, dec!(600) / dec!(55));

    h.fx
        .update_cluster_config(
            CLUSTER,
            ClusterCurrencyUpdate {
                usd_to_etb: Some(dec!(55)),
                eur_to_etb: None,
                custom_currency_enabled: true,
            },
        )
        .await
        .unwrap();
    let applied = h.transactions.submit(&ctx(), with_rate).await.unwrap();
    assert!(applied.custom_rate_applied);
    assert_eq!(applied.amount_converted, dec!(10));
    assert_eq!(applied.currency, Currency::Usd);

    let records = h.transactions.list_records(&scope()).unwrap();
    let stored = records
        .iter()
        .find(|r| r.id == applied.transaction_id)
        .unwrap();
    assert!(stored.custom_rate_applied);
    assert_eq!(stored.custom_rates.usd_to_etb, Some(dec!(60)));
    assert_eq!(stored.amount, dec!(10));
    assert_eq!(stored.amount_etb, dec!(600));
}

#[tokio::test]
async fn legacy_schema_skips_rate_columns() {
    let (dir, pool) = open_pool();
    {
        let mut conn = get_connection(&pool).unwrap();
        conn.batch_execute(
            "ALTER TABLE transaction_records DROP COLUMN usd_to_eur;
             ALTER TABLE transaction_records DROP COLUMN eur_to_etb;
             ALTER TABLE transaction_records DROP COLUMN usd_to_etb;
             ALTER TABLE transaction_records DROP COLUMN use_custom_rate;",
        )
        .unwrap();
    }
    assert_eq!(
        detect_capabilities(&pool).unwrap(),
        StorageCapabilities { record_rates: false }
    );

    let h = build(dir, pool);
    h.ledger.seed_rows(seed_rows()).await.unwrap();
    h.fx
        .update_cluster_config(
            CLUSTER,
            ClusterCurrencyUpdate {
                custom_currency_enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut with_rate = submission("Travel", "2024-02-10", "300");
    with_rate.use_custom_rate = true;
    with_rate.usd_to_etb = Some("60".into());
    let result = h.transactions.submit(&ctx(), with_rate).await.unwrap();
    assert!(result.custom_rate_applied);

    let records = h.transactions.list_records(&scope()).unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].custom_rate_applied);
    assert_eq!(records[0].custom_rates.usd_to_etb, None);
}

#[tokio::test]
async fn batch_import_commits_valid_rows_and_reports_the_bad_one() {
    let h = harness().await;
    let file = "\u{feff}Budget_Heading,Outcome,Activity,Budget_Line,Description,Partner,Date,Amount,Currency\n\
        1. Travel,O,A,L,D,P,2024-01-15,100,ETB\n\
        1. Travel,O,A,L,D,P,2024-04-15,100,ETB\n\
        2. Operational support costs,O,A,L,D,P,2024-07-15,50,ETB\n\
        1. Travel,O,A,L,D,P,2024-10-15,,ETB\n\
        2. Operational support costs,O,A,L,D,P,2024-10-15,50,ETB\n\
        1. Travel,O,A,L,D,P,2024-12-31,100,ETB\n";

    let summary = h
        .imports
        .import_file(&ctx(), "transactions.csv", file.as_bytes().to_vec())
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.imported_count, 5);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].message, "Row 5: Missing required fields");

    let records = h.transactions.list_records(&scope()).unwrap();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.source == TransactionSource::Import));

    let rows = h.ledger.list_rows(&scope()).unwrap();
    assert_rollups(&rows);
    assert_eq!(find(&rows, "Travel", Period::AnnualTotal).figures.actual, dec!(500));
    assert_eq!(find(&rows, "Total", Period::Total).figures.actual, dec!(600));
}

#[tokio::test]
async fn batch_import_rolls_back_on_storage_failure() {
    let h = harness().await;
    {
        let mut conn = get_connection(&h.pool).unwrap();
        conn.batch_execute(
            "CREATE TRIGGER reject_records BEFORE INSERT ON transaction_records
             WHEN (SELECT COUNT(*) FROM transaction_records) >= 1
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();
    }
    let before = h.ledger.list_rows(&scope()).unwrap();

    let file = "budget_heading,outcome,activity,budget_line,description,partner,date,amount,currency\n\
        Travel,O,A,L,D,P,2024-01-15,100,ETB\n\
        Travel,O,A,L,D,P,2024-02-15,100,ETB\n";
    let err = h
        .imports
        .import_file(&ctx(), "transactions.csv", file.as_bytes().to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    assert_eq!(h.ledger.list_rows(&scope()).unwrap(), before);
    assert!(h.transactions.list_records(&scope()).unwrap().is_empty());
}

#[tokio::test]
async fn certify_marks_the_whole_scope() {
    let h = harness().await;
    let touched = h.ledger.certify(scope()).await.unwrap();
    assert_eq!(touched, seed_rows().len());

    let other_year = h
        .ledger
        .certify(LedgerScope::new(YEAR + 1, Some(CLUSTER.into())))
        .await
        .unwrap();
    assert_eq!(other_year, 0);

    let rows = h.ledger.list_rows(&scope()).unwrap();
    assert!(rows.iter().all(|r| r.certified == CertificationStatus::Certified));
}

#[tokio::test]
async fn seeding_the_same_period_twice_is_rejected() {
    let h = harness().await;
    let err = h
        .ledger
        .seed_rows(vec![row("Travel", Period::AnnualTotal, dec!(1), dec!(0), dec!(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Database(DatabaseError::UniqueViolation(_))));
}

#[tokio::test]
async fn seeding_a_range_that_overlaps_stored_quarters_is_rejected() {
    let h = harness().await;
    let before = h.ledger.list_rows(&scope()).unwrap();

    let fuel_q1 = row("Fuel", Period::Q1, dec!(100), dec!(0), dec!(100));
    let mut fuel_q2 = row("Fuel", Period::Q2, dec!(100), dec!(0), dec!(100));
    fuel_q2.start_date = date(3, 15);
    h.ledger.seed_rows(vec![fuel_q1]).await.unwrap();

    let err = h.ledger.seed_rows(vec![fuel_q2]).await.unwrap_err();
    assert!(
        matches!(err, Error::Validation(ValidationError::OverlappingQuarters(_))),
        "{err:?}"
    );
    assert_eq!(h.ledger.list_rows(&scope()).unwrap().len(), before.len() + 1);

    // the same range in another cluster is a separate ledger
    let mut other_cluster = row("Fuel", Period::Q2, dec!(100), dec!(0), dec!(100));
    other_cluster.start_date = date(3, 15);
    other_cluster.cluster = Some("Afar".into());
    h.ledger.seed_rows(vec![other_cluster]).await.unwrap();
}

#[tokio::test]
async fn ambiguous_stored_ranges_fail_resolution() {
    let h = harness().await;
    {
        // written past the seeding checks, as an older database could hold
        let mut conn = get_connection(&h.pool).unwrap();
        conn.batch_execute(
            "UPDATE ledger_rows SET start_date = '2024-01-01', end_date = '2024-06-30'
             WHERE category_name = 'Travel' AND period IN ('Q1', 'Q2');",
        )
        .unwrap();
    }
    let before = h.ledger.list_rows(&scope()).unwrap();

    let err = h
        .transactions
        .submit(&ctx(), submission("Travel", "2024-05-02", "100"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Resolution(ResolutionError::AmbiguousQuarter { .. })),
        "{err:?}"
    );
    assert_eq!(h.ledger.list_rows(&scope()).unwrap(), before);
    assert!(h.transactions.list_records(&scope()).unwrap().is_empty());
}

#[tokio::test]
async fn oversized_submission_does_not_stop_later_writes() {
    let h = harness().await;

    let err = h
        .transactions
        .submit(&ctx(), submission("1. Travel", "2024-02-10", "79228162514264337593543950335"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let result = h
        .transactions
        .submit(&ctx(), submission("1. Travel", "2024-02-10", "10"))
        .await
        .unwrap();
    assert_eq!(result.ledger_row.figures.actual, dec!(210));
    assert_eq!(h.ledger.certify(scope()).await.unwrap(), seed_rows().len());
}

#[tokio::test]
async fn overflowing_ledger_figures_are_rejected_and_rolled_back() {
    let h = harness().await;
    {
        let mut conn = get_connection(&h.pool).unwrap();
        conn.batch_execute(
            "UPDATE ledger_rows SET actual = '79228162514264337593543950335'
             WHERE category_name = 'Equipment' AND period = 'Q1';",
        )
        .unwrap();
    }
    let before = h.ledger.list_rows(&scope()).unwrap();

    let err = h
        .transactions
        .submit(&ctx(), submission("Equipment", "2024-02-10", "10"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Validation(ValidationError::AmountOutOfRange(_))),
        "{err:?}"
    );
    assert_eq!(h.ledger.list_rows(&scope()).unwrap(), before);
    assert!(h.transactions.list_records(&scope()).unwrap().is_empty());

    let file = "budget_heading,outcome,activity,budget_line,description,partner,date,amount,currency\n\
        Equipment,O,A,L,D,P,2024-02-15,10,ETB\n\
        Travel,O,A,L,D,P,2024-02-15,10,ETB\n";
    let summary = h
        .imports
        .import_file(&ctx(), "transactions.csv", file.as_bytes().to_vec())
        .await
        .unwrap();
    assert_eq!(summary.imported_count, 1);
    assert_eq!(summary.errors.len(), 1);
    let records = h.transactions.list_records(&scope()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category_name, "Travel");
}

#[tokio::test]
async fn budget_check_reads_without_writing() {
    let h = harness().await;
    let check = h
        .transactions
        .check_budget(
            &ctx(),
            &budgetledger_core::transactions::BudgetCheckRequest {
                budget_heading: Some("1. Travel".into()),
                entry_date: Some("2024-02-10".into()),
                amount: Some("250".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(check.quarter, Period::Q1);
    assert_eq!(check.budget_available, dec!(800));
    assert_eq!(check.entered_amount, dec!(250));

    let err = h
        .transactions
        .check_budget(
            &ctx(),
            &budgetledger_core::transactions::BudgetCheckRequest {
                budget_heading: Some("Travel".into()),
                entry_date: Some("2025-02-10".into()),
                amount: Some("250".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Resolution(ResolutionError::NoBudgetData)));
    assert!(h.transactions.list_records(&scope()).unwrap().is_empty());
}
