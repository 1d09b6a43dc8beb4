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

//! Cached WattBuy offer snapshots (spec §6).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{CachedOffer, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct OfferRepo {
    db: Arc<Database>,
}

impl OfferRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, offer: &CachedOffer) -> Result<()> {
        let prices_json = serde_json::to_string(&offer.disclosed_prices_cents_per_kwh)?;
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO offers (id, home_id, supplier, plan_name, term_months, efl_url,
                disclosed_prices_json, tdsp, renewable_percent, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                supplier = excluded.supplier,
                plan_name = excluded.plan_name,
                term_months = excluded.term_months,
                efl_url = excluded.efl_url,
                disclosed_prices_json = excluded.disclosed_prices_json,
                tdsp = excluded.tdsp,
                renewable_percent = excluded.renewable_percent,
                fetched_at = excluded.fetched_at",
            rusqlite::params![
                offer.id,
                offer.home_id,
                offer.supplier,
                offer.plan_name,
                offer.term_months,
                offer.efl_url,
                prices_json,
                offer.tdsp,
                offer.renewable_percent,
                offer.fetched_at.to_rfc3339(),
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn list_by_home_id(&self, home_id: &str) -> Result<Vec<CachedOffer>> {
        let conn = self.db.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, home_id, supplier, plan_name, term_months, efl_url,
                    disclosed_prices_json, tdsp, renewable_percent, fetched_at
                 FROM offers WHERE home_id = ?1 ORDER BY fetched_at DESC",
            )
            .map_err(cache_err)?;
        let rows = stmt
            .query_map([home_id], row_to_offer)
            .map_err(cache_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(cache_err)?;
        Ok(rows)
    }

    pub fn get_by_id(&self, offer_id: &str) -> Result<Option<CachedOffer>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, home_id, supplier, plan_name, term_months, efl_url,
                disclosed_prices_json, tdsp, renewable_percent, fetched_at
             FROM offers WHERE id = ?1",
            [offer_id],
            row_to_offer,
        )
        .optional()
        .map_err(cache_err)
    }
}

fn row_to_offer(row: &rusqlite::Row) -> rusqlite::Result<CachedOffer> {
    let prices_json: String = row.get(6)?;
    let disclosed_prices_cents_per_kwh: Vec<(f64, f64)> = serde_json::from_str(&prices_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?;
    let fetched_at_raw: String = row.get(9)?;
    let fetched_at = DateTime::parse_from_rfc3339(&fetched_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(CachedOffer {
        id: row.get(0)?,
        home_id: row.get(1)?,
        supplier: row.get(2)?,
        plan_name: row.get(3)?,
        term_months: row.get(4)?,
        efl_url: row.get(5)?,
        disclosed_prices_cents_per_kwh,
        tdsp: row.get(7)?,
        renewable_percent: row.get(8)?,
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CachedOffer {
        CachedOffer {
            id: "offer-1".into(),
            home_id: "home-1".into(),
            supplier: "Acme Energy".into(),
            plan_name: "Saver 12".into(),
            term_months: Some(12),
            efl_url: Some("https://example.com/efl.pdf".into()),
            disclosed_prices_cents_per_kwh: vec![(500.0, 13.2), (1000.0, 11.8), (2000.0, 11.1)],
            tdsp: Some("centerpoint".into()),
            renewable_percent: Some(15.0),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_list_round_trips() {
        let repo = OfferRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let offers = repo.list_by_home_id("home-1").unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].disclosed_prices_cents_per_kwh, sample().disclosed_prices_cents_per_kwh);
    }

    #[test]
    fn test_get_by_id_missing_returns_none() {
        let repo = OfferRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        assert!(repo.get_by_id("nope").unwrap().is_none());
    }
}
