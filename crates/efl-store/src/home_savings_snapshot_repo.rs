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

//! Append-only dashboard snapshots of a home's best-available savings, one row per
//! `(homeId, computedAt)` (spec §6).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{HomeSavingsSnapshot, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct HomeSavingsSnapshotRepo {
    db: Arc<Database>,
}

impl HomeSavingsSnapshotRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, snapshot: &HomeSavingsSnapshot) -> Result<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO home_savings_snapshots (home_id, computed_at, payload_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(home_id, computed_at) DO UPDATE SET payload_json = excluded.payload_json",
            rusqlite::params![snapshot.home_id, snapshot.computed_at.to_rfc3339(), snapshot.payload_json],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn latest_for_home(&self, home_id: &str) -> Result<Option<HomeSavingsSnapshot>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT home_id, computed_at, payload_json FROM home_savings_snapshots
             WHERE home_id = ?1 ORDER BY computed_at DESC LIMIT 1",
            [home_id],
            |row| {
                let computed_at_raw: String = row.get(1)?;
                let computed_at = DateTime::parse_from_rfc3339(&computed_at_raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
                    })?;
                Ok(HomeSavingsSnapshot { home_id: row.get(0)?, computed_at, payload_json: row.get(2)? })
            },
        )
        .optional()
        .map_err(cache_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_latest_for_home_round_trips() {
        let repo = HomeSavingsSnapshotRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        let snapshot = HomeSavingsSnapshot {
            home_id: "home-1".into(),
            computed_at: Utc::now(),
            payload_json: r#"{"bestAnnualSavingsDollars":120.0}"#.into(),
        };
        repo.insert(&snapshot).unwrap();
        let fetched = repo.latest_for_home("home-1").unwrap().unwrap();
        assert_eq!(fetched.payload_json, snapshot.payload_json);
    }
}
