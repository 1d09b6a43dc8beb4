// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Schema and connection handle shared by every repository in this crate, grounded on
//! `fluxion-server/src/db.rs`'s `Database::open` (one `Mutex<Connection>`, one `execute_batch`
//! DDL block, idempotent `ALTER TABLE ... ADD COLUMN` migrations that swallow duplicate-column
//! errors).

use std::path::Path;
use std::sync::Mutex;

use efl_types::EngineError;

pub struct Database {
    pub(crate) conn: Mutex<rusqlite::Connection>,
}

/// Converts a `rusqlite` error into the crate-wide cache error taxonomy (spec §3.1,
/// `EngineError::Cache`) — the only thing in `efl-types` that ever learns a SQLite error
/// occurred is its string rendering, so the types crate stays free of a persistence dependency.
pub(crate) fn cache_err(e: rusqlite::Error) -> EngineError {
    EngineError::Cache(e.to_string())
}

impl Database {
    pub fn open(path: &str) -> Result<Self, EngineError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = rusqlite::Connection::open(path).map_err(cache_err)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, EngineError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(cache_err)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init_schema(conn: &rusqlite::Connection) -> Result<(), EngineError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS house_addresses (
                id              TEXT PRIMARY KEY,
                home_id         TEXT NOT NULL UNIQUE,
                street          TEXT,
                city            TEXT,
                state           TEXT,
                zip             TEXT,
                tdsp_slug       TEXT,
                is_renter       BOOLEAN NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS offers (
                id                  TEXT PRIMARY KEY,
                home_id             TEXT NOT NULL,
                supplier            TEXT NOT NULL,
                plan_name           TEXT NOT NULL,
                term_months         INTEGER,
                efl_url             TEXT,
                disclosed_prices_json TEXT NOT NULL,
                tdsp                TEXT,
                renewable_percent   REAL,
                fetched_at          TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_offers_home ON offers(home_id, fetched_at DESC);

            CREATE TABLE IF NOT EXISTS rate_plans (
                id                      TEXT PRIMARY KEY,
                efl_pdf_sha256          TEXT NOT NULL,
                efl_url                 TEXT,
                rate_structure_json     TEXT NOT NULL,
                plan_calc_version       INTEGER NOT NULL DEFAULT 1,
                plan_calc_status        TEXT NOT NULL,
                plan_calc_reason_code   TEXT,
                required_bucket_keys_json TEXT NOT NULL DEFAULT '[]',
                supported_features_json  TEXT NOT NULL DEFAULT '{}',
                plan_calc_derived_at    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rate_plans_sha ON rate_plans(efl_pdf_sha256);

            CREATE TABLE IF NOT EXISTS offer_rate_plan_map (
                offer_id        TEXT PRIMARY KEY,
                rate_plan_id    TEXT NOT NULL,
                last_linked_at  TEXT NOT NULL,
                linked_by       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS estimate_cache (
                house_address_id TEXT NOT NULL,
                rate_plan_id     TEXT NOT NULL,
                inputs_sha256    TEXT NOT NULL,
                months_count     INTEGER NOT NULL,
                payload_json     TEXT NOT NULL,
                computed_at      TEXT NOT NULL,
                PRIMARY KEY (house_address_id, rate_plan_id, inputs_sha256, months_count)
            );

            CREATE TABLE IF NOT EXISTS materialized_estimates (
                house_address_id TEXT NOT NULL,
                rate_plan_id     TEXT NOT NULL,
                payload_json     TEXT NOT NULL,
                computed_at      TEXT NOT NULL,
                expires_at       TEXT,
                PRIMARY KEY (house_address_id, rate_plan_id)
            );

            CREATE TABLE IF NOT EXISTS pipeline_jobs (
                home_id             TEXT NOT NULL,
                run_id              TEXT NOT NULL,
                status              TEXT NOT NULL,
                reason              TEXT NOT NULL,
                calc_version        INTEGER NOT NULL,
                started_at          TEXT NOT NULL,
                finished_at         TEXT,
                cooldown_until      TEXT,
                last_calc_window_end TEXT,
                counts_json         TEXT NOT NULL DEFAULT '{}',
                last_error          TEXT,
                PRIMARY KEY (home_id, run_id)
            );

            CREATE INDEX IF NOT EXISTS idx_pipeline_jobs_home_started
                ON pipeline_jobs(home_id, started_at DESC);

            CREATE TABLE IF NOT EXISTS review_queue (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                kind            TEXT NOT NULL,
                dedupe_key      TEXT NOT NULL,
                final_status    TEXT NOT NULL,
                offer_id        TEXT,
                rate_plan_id    TEXT,
                queue_reason_json TEXT NOT NULL,
                resolved_at     TEXT,
                resolved_by     TEXT,
                UNIQUE(kind, dedupe_key)
            );

            CREATE TABLE IF NOT EXISTS home_savings_snapshots (
                home_id     TEXT NOT NULL,
                computed_at TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (home_id, computed_at)
            );",
        )
        .map_err(cache_err)?;

        // Idempotent migrations: ignore duplicate-column errors the way fluxion-server does.
        let rate_plan_columns = ["supported_features_json TEXT NOT NULL DEFAULT '{}'"];
        for col_def in rate_plan_columns {
            let sql = format!("ALTER TABLE rate_plans ADD COLUMN {col_def}");
            let _ = conn.execute_batch(&sql);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_creates_schema() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM sqlite_master WHERE type='table'", [], |r| r.get(0))
            .unwrap();
        assert!(count >= 9);
    }
}
