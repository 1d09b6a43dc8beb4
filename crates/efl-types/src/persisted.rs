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

//! Persisted-state row shapes (spec §6): the abstract layout repositories in `efl-store` read
//! and write. These are distinct from the in-flight pipeline types elsewhere in this crate —
//! `RatePlan` is the template `RateStructure` plus the computability bookkeeping that survives
//! across pipeline runs, not the structure itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::computability::ReasonCode;
use crate::plan::RateStructure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseAddress {
    pub id: String,
    pub home_id: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub tdsp_slug: Option<String>,
    pub is_renter: bool,
}

/// A cached WattBuy snapshot of one offer, re-fetched periodically (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedOffer {
    pub id: String,
    pub home_id: String,
    pub supplier: String,
    pub plan_name: String,
    pub term_months: Option<u32>,
    pub efl_url: Option<String>,
    pub disclosed_prices_cents_per_kwh: Vec<(f64, f64)>,
    pub tdsp: Option<String>,
    pub renewable_percent: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePlan {
    pub id: String,
    pub efl_pdf_sha256: String,
    pub efl_url: Option<String>,
    pub rate_structure: RateStructure,
    pub plan_calc_version: u32,
    pub plan_calc_status: String,
    pub plan_calc_reason_code: Option<ReasonCode>,
    pub required_bucket_keys: Vec<String>,
    pub supported_features: std::collections::BTreeMap<String, bool>,
    pub plan_calc_derived_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRatePlanMap {
    pub offer_id: String,
    pub rate_plan_id: String,
    pub last_linked_at: DateTime<Utc>,
    pub linked_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateCacheEntry {
    pub house_address_id: String,
    pub rate_plan_id: String,
    pub inputs_sha256: String,
    pub months_count: u32,
    pub payload: crate::estimate::Estimate,
    pub computed_at: DateTime<Utc>,
}

/// The "current estimate per (home, offer)" materialization the dashboard reads (spec §4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedEstimate {
    pub house_address_id: String,
    pub rate_plan_id: String,
    pub payload: crate::estimate::Estimate,
    pub computed_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSavingsSnapshot {
    pub home_id: String,
    pub computed_at: DateTime<Utc>,
    pub payload_json: String,
}
