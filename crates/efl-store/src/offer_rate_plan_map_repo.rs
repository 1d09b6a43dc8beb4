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

//! Links a cached offer to the rate plan template derived from its EFL (spec §6).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{OfferRatePlanMap, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct OfferRatePlanMapRepo {
    db: Arc<Database>,
}

impl OfferRatePlanMapRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, link: &OfferRatePlanMap) -> Result<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO offer_rate_plan_map (offer_id, rate_plan_id, last_linked_at, linked_by)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(offer_id) DO UPDATE SET
                rate_plan_id = excluded.rate_plan_id,
                last_linked_at = excluded.last_linked_at,
                linked_by = excluded.linked_by",
            rusqlite::params![
                link.offer_id,
                link.rate_plan_id,
                link.last_linked_at.to_rfc3339(),
                link.linked_by,
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn get_by_offer_id(&self, offer_id: &str) -> Result<Option<OfferRatePlanMap>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT offer_id, rate_plan_id, last_linked_at, linked_by
             FROM offer_rate_plan_map WHERE offer_id = ?1",
            [offer_id],
            |row| {
                let last_linked_at_raw: String = row.get(2)?;
                let last_linked_at = DateTime::parse_from_rfc3339(&last_linked_at_raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                    })?;
                Ok(OfferRatePlanMap {
                    offer_id: row.get(0)?,
                    rate_plan_id: row.get(1)?,
                    last_linked_at,
                    linked_by: row.get(3)?,
                })
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
    fn test_upsert_and_get_round_trips() {
        let repo = OfferRatePlanMapRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        let link = OfferRatePlanMap {
            offer_id: "offer-1".into(),
            rate_plan_id: "plan-1".into(),
            last_linked_at: Utc::now(),
            linked_by: "plan_calc".into(),
        };
        repo.upsert(&link).unwrap();
        let fetched = repo.get_by_offer_id("offer-1").unwrap().unwrap();
        assert_eq!(fetched.rate_plan_id, "plan-1");
    }

    #[test]
    fn test_relink_overwrites_rate_plan_id() {
        let repo = OfferRatePlanMapRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        let mut link = OfferRatePlanMap {
            offer_id: "offer-1".into(),
            rate_plan_id: "plan-1".into(),
            last_linked_at: Utc::now(),
            linked_by: "plan_calc".into(),
        };
        repo.upsert(&link).unwrap();
        link.rate_plan_id = "plan-2".into();
        repo.upsert(&link).unwrap();
        let fetched = repo.get_by_offer_id("offer-1").unwrap().unwrap();
        assert_eq!(fetched.rate_plan_id, "plan-2");
    }
}
