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

//! The "current estimate per (home, offer)" materialization the dashboard reads (spec §4.9).
//! One row per `(houseAddressId, ratePlanId)`, overwritten on every fresh computation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{MaterializedEstimate, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct MaterializedEstimateRepo {
    db: Arc<Database>,
}

impl MaterializedEstimateRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, materialized: &MaterializedEstimate) -> Result<()> {
        let payload_json = serde_json::to_string(&materialized.payload)?;
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO materialized_estimates (house_address_id, rate_plan_id, payload_json, computed_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(house_address_id, rate_plan_id) DO UPDATE SET
                payload_json = excluded.payload_json,
                computed_at = excluded.computed_at,
                expires_at = excluded.expires_at",
            rusqlite::params![
                materialized.house_address_id,
                materialized.rate_plan_id,
                payload_json,
                materialized.computed_at.to_rfc3339(),
                materialized.expires_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn get(&self, house_address_id: &str, rate_plan_id: &str) -> Result<Option<MaterializedEstimate>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT house_address_id, rate_plan_id, payload_json, computed_at, expires_at
             FROM materialized_estimates WHERE house_address_id = ?1 AND rate_plan_id = ?2",
            [house_address_id, rate_plan_id],
            row_to_materialized,
        )
        .optional()
        .map_err(cache_err)
    }

    pub fn list_by_house_address(&self, house_address_id: &str) -> Result<Vec<MaterializedEstimate>> {
        let conn = self.db.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT house_address_id, rate_plan_id, payload_json, computed_at, expires_at
                 FROM materialized_estimates WHERE house_address_id = ?1",
            )
            .map_err(cache_err)?;
        stmt.query_map([house_address_id], row_to_materialized)
            .map_err(cache_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(cache_err)
    }
}

fn row_to_materialized(row: &rusqlite::Row) -> rusqlite::Result<MaterializedEstimate> {
    let payload_json: String = row.get(2)?;
    let payload = serde_json::from_str(&payload_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;
    let computed_at_raw: String = row.get(3)?;
    let computed_at = DateTime::parse_from_rfc3339(&computed_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;
    let expires_at_raw: Option<String> = row.get(4)?;
    let expires_at = expires_at_raw
        .map(|raw| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(MaterializedEstimate {
        house_address_id: row.get(0)?,
        rate_plan_id: row.get(1)?,
        payload,
        computed_at,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_types::{Estimate, EstimateComponents, EstimateStatus};

    fn sample() -> MaterializedEstimate {
        MaterializedEstimate {
            house_address_id: "ha-1".into(),
            rate_plan_id: "plan-1".into(),
            payload: Estimate {
                status: EstimateStatus::Ok,
                annual_cost_dollars: 1200.0,
                monthly_cost_dollars: 100.0,
                effective_cents_per_kwh: 10.0,
                components: EstimateComponents::default(),
                tdsp_rates_applied: None,
                reason: None,
            },
            computed_at: Utc::now(),
            expires_at: None,
        }
    }

    #[test]
    fn test_upsert_overwrites_prior_materialization() {
        let repo = MaterializedEstimateRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let mut updated = sample();
        updated.payload.annual_cost_dollars = 1500.0;
        repo.upsert(&updated).unwrap();

        let fetched = repo.get("ha-1", "plan-1").unwrap().unwrap();
        assert_eq!(fetched.payload.annual_cost_dollars, 1500.0);
    }

    #[test]
    fn test_list_by_house_address_returns_all_offers() {
        let repo = MaterializedEstimateRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let mut other = sample();
        other.rate_plan_id = "plan-2".into();
        repo.upsert(&other).unwrap();

        let all = repo.list_by_house_address("ha-1").unwrap();
        assert_eq!(all.len(), 2);
    }
}
