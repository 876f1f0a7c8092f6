use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use budgetledger_core::constants::DEFAULT_IMPORT_MAX_BYTES;
use budgetledger_core::settings::{LedgerSettings, QuarterFallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    /// Put the underlying cause of a storage failure into error bodies.
    pub expose_debug: bool,
    pub quarter_fallback: QuarterFallback,
    pub import_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("BL_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid BL_LISTEN_ADDR")?;
        let db_path = env_or("BL_DB_PATH", "./db/budget_ledger.db");
        let cors_allow = env_or("BL_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_or("BL_REQUEST_TIMEOUT_MS", "30000")
            .parse()
            .unwrap_or(30000);
        let log_format = if env_or("BL_LOG_FORMAT", "text").eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        let expose_debug = matches!(
            env_or("BL_EXPOSE_DEBUG", "false").to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );
        let quarter_fallback = env_or("BL_QUARTER_FALLBACK", "none")
            .parse::<QuarterFallback>()
            .map_err(|e| anyhow::anyhow!("Invalid BL_QUARTER_FALLBACK: {}", e))?;
        let import_max_bytes = std::env::var("BL_IMPORT_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_IMPORT_MAX_BYTES);

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            log_format,
            expose_debug,
            quarter_fallback,
            import_max_bytes,
        })
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            quarter_fallback: self.quarter_fallback,
            import_max_bytes: self.import_max_bytes,
            ..LedgerSettings::default()
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
