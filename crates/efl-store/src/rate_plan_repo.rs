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

//! Rate plan templates plus computability bookkeeping (spec §6).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{RatePlan, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct RatePlanRepo {
    db: Arc<Database>,
}

impl RatePlanRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, plan: &RatePlan) -> Result<()> {
        let rate_structure_json = serde_json::to_string(&plan.rate_structure)?;
        let required_bucket_keys_json = serde_json::to_string(&plan.required_bucket_keys)?;
        let supported_features_json = serde_json::to_string(&plan.supported_features)?;
        let reason_code_json = match &plan.plan_calc_reason_code {
            Some(code) => Some(serde_json::to_string(code)?),
            None => None,
        };

        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO rate_plans (id, efl_pdf_sha256, efl_url, rate_structure_json,
                plan_calc_version, plan_calc_status, plan_calc_reason_code,
                required_bucket_keys_json, supported_features_json, plan_calc_derived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                efl_pdf_sha256 = excluded.efl_pdf_sha256,
                efl_url = excluded.efl_url,
                rate_structure_json = excluded.rate_structure_json,
                plan_calc_version = excluded.plan_calc_version,
                plan_calc_status = excluded.plan_calc_status,
                plan_calc_reason_code = excluded.plan_calc_reason_code,
                required_bucket_keys_json = excluded.required_bucket_keys_json,
                supported_features_json = excluded.supported_features_json,
                plan_calc_derived_at = excluded.plan_calc_derived_at",
            rusqlite::params![
                plan.id,
                plan.efl_pdf_sha256,
                plan.efl_url,
                rate_structure_json,
                plan.plan_calc_version,
                plan.plan_calc_status,
                reason_code_json,
                required_bucket_keys_json,
                supported_features_json,
                plan.plan_calc_derived_at.to_rfc3339(),
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<RatePlan>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, efl_pdf_sha256, efl_url, rate_structure_json, plan_calc_version,
                plan_calc_status, plan_calc_reason_code, required_bucket_keys_json,
                supported_features_json, plan_calc_derived_at
             FROM rate_plans WHERE id = ?1",
            [id],
            row_to_plan,
        )
        .optional()
        .map_err(cache_err)
    }

    pub fn get_by_efl_sha256(&self, sha256: &str) -> Result<Option<RatePlan>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, efl_pdf_sha256, efl_url, rate_structure_json, plan_calc_version,
                plan_calc_status, plan_calc_reason_code, required_bucket_keys_json,
                supported_features_json, plan_calc_derived_at
             FROM rate_plans WHERE efl_pdf_sha256 = ?1",
            [sha256],
            row_to_plan,
        )
        .optional()
        .map_err(cache_err)
    }
}

fn row_to_plan(row: &rusqlite::Row) -> rusqlite::Result<RatePlan> {
    let rate_structure_json: String = row.get(3)?;
    let rate_structure = serde_json::from_str(&rate_structure_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;
    let reason_code_json: Option<String> = row.get(6)?;
    let plan_calc_reason_code = reason_code_json
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?;
    let required_bucket_keys_json: String = row.get(7)?;
    let required_bucket_keys: Vec<String> = serde_json::from_str(&required_bucket_keys_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;
    let supported_features_json: String = row.get(8)?;
    let supported_features: BTreeMap<String, bool> = serde_json::from_str(&supported_features_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e)))?;
    let plan_calc_derived_at_raw: String = row.get(9)?;
    let plan_calc_derived_at = DateTime::parse_from_rfc3339(&plan_calc_derived_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(RatePlan {
        id: row.get(0)?,
        efl_pdf_sha256: row.get(1)?,
        efl_url: row.get(2)?,
        rate_structure,
        plan_calc_version: row.get(4)?,
        plan_calc_status: row.get(5)?,
        plan_calc_reason_code,
        required_bucket_keys,
        supported_features,
        plan_calc_derived_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_types::{RateStructure, RateType};

    fn sample() -> RatePlan {
        let mut structure = RateStructure::empty(RateType::Fixed);
        structure.energy_rate_cents = Some(11.5);
        RatePlan {
            id: "plan-1".into(),
            efl_pdf_sha256: "abc123".into(),
            efl_url: Some("https://example.com/efl.pdf".into()),
            rate_structure: structure,
            plan_calc_version: 1,
            plan_calc_status: "COMPUTABLE".into(),
            plan_calc_reason_code: None,
            required_bucket_keys: vec!["ALL_TOTAL".into()],
            supported_features: BTreeMap::new(),
            plan_calc_derived_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_get_by_id_round_trips() {
        let repo = RatePlanRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let fetched = repo.get_by_id("plan-1").unwrap().unwrap();
        assert_eq!(fetched.rate_structure.energy_rate_cents, Some(11.5));
    }

    #[test]
    fn test_get_by_efl_sha256_finds_template() {
        let repo = RatePlanRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let fetched = repo.get_by_efl_sha256("abc123").unwrap().unwrap();
        assert_eq!(fetched.id, "plan-1");
    }
}
