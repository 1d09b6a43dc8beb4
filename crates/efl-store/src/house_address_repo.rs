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

use std::sync::Arc;

use efl_types::{EngineError, HouseAddress, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct HouseAddressRepo {
    db: Arc<Database>,
}

impl HouseAddressRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, address: &HouseAddress) -> Result<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO house_addresses (id, home_id, street, city, state, zip, tdsp_slug, is_renter)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                home_id = excluded.home_id,
                street = COALESCE(excluded.street, house_addresses.street),
                city = COALESCE(excluded.city, house_addresses.city),
                state = COALESCE(excluded.state, house_addresses.state),
                zip = COALESCE(excluded.zip, house_addresses.zip),
                tdsp_slug = COALESCE(excluded.tdsp_slug, house_addresses.tdsp_slug),
                is_renter = excluded.is_renter",
            rusqlite::params![
                address.id,
                address.home_id,
                address.street,
                address.city,
                address.state,
                address.zip,
                address.tdsp_slug,
                address.is_renter,
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn get_by_home_id(&self, home_id: &str) -> Result<Option<HouseAddress>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, home_id, street, city, state, zip, tdsp_slug, is_renter
             FROM house_addresses WHERE home_id = ?1",
            [home_id],
            |row| {
                Ok(HouseAddress {
                    id: row.get(0)?,
                    home_id: row.get(1)?,
                    street: row.get(2)?,
                    city: row.get(3)?,
                    state: row.get(4)?,
                    zip: row.get(5)?,
                    tdsp_slug: row.get(6)?,
                    is_renter: row.get(7)?,
                })
            },
        )
        .optional()
        .map_err(cache_err)
    }

    pub fn missing_address_fields(address: &HouseAddress) -> Result<()> {
        if address.zip.is_none() || address.tdsp_slug.is_none() {
            return Err(EngineError::MissingAddress(format!(
                "home {} is missing zip or tdsp_slug",
                address.home_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HouseAddress {
        HouseAddress {
            id: "ha-1".into(),
            home_id: "home-1".into(),
            street: Some("1 Main St".into()),
            city: Some("Houston".into()),
            state: Some("TX".into()),
            zip: Some("77002".into()),
            tdsp_slug: Some("centerpoint".into()),
            is_renter: false,
        }
    }

    #[test]
    fn test_upsert_and_get_round_trips() {
        let repo = HouseAddressRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let fetched = repo.get_by_home_id("home-1").unwrap().unwrap();
        assert_eq!(fetched, sample());
    }

    #[test]
    fn test_upsert_coalesces_missing_fields_on_conflict() {
        let repo = HouseAddressRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();

        let mut partial = sample();
        partial.street = None;
        partial.is_renter = true;
        repo.upsert(&partial).unwrap();

        let fetched = repo.get_by_home_id("home-1").unwrap().unwrap();
        assert_eq!(fetched.street, Some("1 Main St".into()));
        assert!(fetched.is_renter);
    }

    #[test]
    fn test_missing_address_fields_rejected() {
        let mut address = sample();
        address.zip = None;
        assert!(HouseAddressRepo::missing_address_fields(&address).is_err());
    }
}
