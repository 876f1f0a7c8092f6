//! SQLite storage implementation for the budget ledger.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository and unit-of-work traits defined in
//! `budgetledger-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations and schema capability detection
//! - The single writer that runs every ledger job in one immediate transaction
//! - Repository implementations and their Diesel model types
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//!
//! ```text
//! core (domain)      apps/server (HTTP)
//!       │                  │
//!       └────────┬─────────┘
//!                │
//!                ▼
//!        storage-sqlite (this crate)
//!                │
//!                ▼
//!            SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod fx;
pub mod ledger;
pub mod transactions;

// Re-export database utilities
pub use db::{
    create_pool, detect_capabilities, get_connection, init, run_migrations, spawn_writer,
    DbConnection, DbPool, StorageCapabilities, WriteHandle,
};

pub use fx::ClusterCurrencyRepository;
pub use ledger::LedgerRepository;
pub use transactions::TransactionRecordRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from budgetledger-core for convenience
pub use budgetledger_core::errors::{DatabaseError, Error, Result};
