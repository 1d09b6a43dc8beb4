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

//! TDSP delivery-rate lookup (spec §6): `getTdspRates(tdspSlug, asOf) -> TdspRates | null`.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use efl_types::{Result, TdspRates};

#[async_trait]
pub trait TdspRatesProvider: Send + Sync {
    async fn get_tdsp_rates(&self, tdsp_slug: &str, as_of: NaiveDate) -> Result<Option<TdspRates>>;
}

/// In-memory table, one rate schedule per slug, latest `effective_date` not after `as_of` wins.
/// Stands in for the real TDSP tariff lookup in tests and the orchestrator's dev profile.
#[derive(Debug, Default)]
pub struct StaticTdspRatesProvider {
    by_slug: RwLock<BTreeMap<String, Vec<TdspRates>>>,
}

impl StaticTdspRatesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, slug: impl Into<String>, rates: TdspRates) {
        self.by_slug.write().unwrap().entry(slug.into()).or_default().push(rates);
    }
}

#[async_trait]
impl TdspRatesProvider for StaticTdspRatesProvider {
    async fn get_tdsp_rates(&self, tdsp_slug: &str, as_of: NaiveDate) -> Result<Option<TdspRates>> {
        let table = self.by_slug.read().unwrap();
        let Some(schedules) = table.get(tdsp_slug) else { return Ok(None) };
        let applicable = schedules
            .iter()
            .filter(|r| r.effective_date <= as_of)
            .max_by_key(|r| r.effective_date);
        Ok(applicable.copied())
    }
}
