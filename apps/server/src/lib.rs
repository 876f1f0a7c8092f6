//! HTTP server for the budget ledger.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
mod main_lib;

pub use main_lib::{build_state, init_tracing, AppState};
