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

//! Content-addressed estimate cache keyed by `inputsSha256` (spec §4.9). A given
//! `(houseAddressId, ratePlanId, inputsSha256, monthsCount)` tuple never needs recomputing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{EstimateCacheEntry, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct EstimateCacheRepo {
    db: Arc<Database>,
}

impl EstimateCacheRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, entry: &EstimateCacheEntry) -> Result<()> {
        let payload_json = serde_json::to_string(&entry.payload)?;
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO estimate_cache (house_address_id, rate_plan_id, inputs_sha256,
                months_count, payload_json, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(house_address_id, rate_plan_id, inputs_sha256, months_count)
             DO UPDATE SET payload_json = excluded.payload_json, computed_at = excluded.computed_at",
            rusqlite::params![
                entry.house_address_id,
                entry.rate_plan_id,
                entry.inputs_sha256,
                entry.months_count,
                payload_json,
                entry.computed_at.to_rfc3339(),
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn get(
        &self,
        house_address_id: &str,
        rate_plan_id: &str,
        inputs_sha256: &str,
        months_count: u32,
    ) -> Result<Option<EstimateCacheEntry>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT house_address_id, rate_plan_id, inputs_sha256, months_count, payload_json, computed_at
             FROM estimate_cache
             WHERE house_address_id = ?1 AND rate_plan_id = ?2 AND inputs_sha256 = ?3 AND months_count = ?4",
            rusqlite::params![house_address_id, rate_plan_id, inputs_sha256, months_count],
            row_to_entry,
        )
        .optional()
        .map_err(cache_err)
    }
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<EstimateCacheEntry> {
    let payload_json: String = row.get(4)?;
    let payload = serde_json::from_str(&payload_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;
    let computed_at_raw: String = row.get(5)?;
    let computed_at = DateTime::parse_from_rfc3339(&computed_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(EstimateCacheEntry {
        house_address_id: row.get(0)?,
        rate_plan_id: row.get(1)?,
        inputs_sha256: row.get(2)?,
        months_count: row.get(3)?,
        payload,
        computed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_types::{Estimate, EstimateComponents, EstimateStatus};

    fn sample_entry() -> EstimateCacheEntry {
        EstimateCacheEntry {
            house_address_id: "ha-1".into(),
            rate_plan_id: "plan-1".into(),
            inputs_sha256: "deadbeef".into(),
            months_count: 12,
            payload: Estimate {
                status: EstimateStatus::Ok,
                annual_cost_dollars: 1320.0,
                monthly_cost_dollars: 110.0,
                effective_cents_per_kwh: 11.0,
                components: EstimateComponents::default(),
                tdsp_rates_applied: None,
                reason: None,
            },
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_cache_hit_returns_stored_payload() {
        let repo = EstimateCacheRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample_entry()).unwrap();
        let fetched = repo.get("ha-1", "plan-1", "deadbeef", 12).unwrap().unwrap();
        assert_eq!(fetched.payload.annual_cost_dollars, 1320.0);
    }

    #[test]
    fn test_cache_miss_on_different_inputs_hash() {
        let repo = EstimateCacheRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample_entry()).unwrap();
        assert!(repo.get("ha-1", "plan-1", "other-hash", 12).unwrap().is_none());
    }
}
