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

//! `PlanRules` (engine-computation view) and `RateStructure` (persisted template), spec §3.
//!
//! Dynamic, optional-heavy draft objects become tagged sum types here (spec §9): `RateType`
//! and `CreditType` are closed enums, never stringly-typed.

use serde::{Deserialize, Serialize};

use crate::validation::Validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    Fixed,
    Variable,
    Indexed,
    TimeOfUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditType {
    ThresholdMin,
    ThresholdMax,
}

/// `usageTiers` contiguity invariant (spec §8): first tier starts at 0, each subsequent tier's
/// `min_kwh` equals the previous tier's `max_kwh`, at most one (the last) is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageTier {
    pub min_kwh: f64,
    pub max_kwh: Option<f64>,
    pub rate_cents_per_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOfUsePeriod {
    pub label: String,
    pub start_hour: u8,
    pub end_hour: u8,
    pub days_of_week: Vec<u8>,
    pub months: Option<Vec<u8>>,
    pub rate_cents_per_kwh: f64,
    pub is_free: bool,
}

impl TimeOfUsePeriod {
    /// All-day periods (spec §4.7): cover the full 24h clock, distinguished from other periods
    /// only by `months` partitioning (the seasonal-discount-to-TOU promotion in §4.5 step 5).
    pub fn is_all_day(&self) -> bool {
        self.start_hour == 0 && self.end_hour == 24
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillCreditRule {
    pub credit_dollars: f64,
    pub threshold_kwh: f64,
    pub months_of_year: Option<Vec<u8>>,
    pub credit_type: CreditType,
}

/// Engine-level computation contract produced by the AI draft parser and extractors, then
/// healed by the gap solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRules {
    pub rate_type: RateType,
    pub plan_type_hint: Option<String>,
    pub default_rate_cents_per_kwh: Option<f64>,
    pub base_charge_per_month_cents: Option<f64>,
    pub usage_tiers: Vec<UsageTier>,
    pub time_of_use_periods: Vec<TimeOfUsePeriod>,
    pub bill_credits: Vec<BillCreditRule>,
}

impl PlanRules {
    pub fn empty(rate_type: RateType) -> Self {
        Self {
            rate_type,
            plan_type_hint: None,
            default_rate_cents_per_kwh: None,
            base_charge_per_month_cents: None,
            usage_tiers: Vec::new(),
            time_of_use_periods: Vec::new(),
            bill_credits: Vec::new(),
        }
    }
}

/// Segment persisted from additive raw `BillCreditRule` events (spec §4.5 step 8): the raw
/// events remain on `PlanRules` for validator math; `RateStructure` keeps only the
/// non-overlapping segments used for persistence and estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillCreditSegment {
    pub credit_amount_cents: f64,
    pub min_usage_kwh: Option<f64>,
    pub max_usage_kwh: Option<f64>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillCredits {
    pub has_bill_credit: bool,
    pub rules: Vec<BillCreditSegment>,
}

impl BillCredits {
    pub fn none() -> Self {
        Self { has_bill_credit: false, rules: Vec::new() }
    }
}

/// Provenance envelope replacing the cyclic RatePlan <-> Validation evidence reference of the
/// source system (spec §9): carries the validator's last verdict and the assumptions it used,
/// with no back-reference needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub validation: Validation,
    pub computed_at: chrono::DateTime<chrono::Utc>,
}

/// Canonical, persisted pricing template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateStructure {
    pub rate_type: RateType,
    pub base_monthly_fee_cents: f64,
    pub energy_rate_cents: Option<f64>,
    pub usage_tiers: Vec<UsageTier>,
    pub time_of_use_periods: Vec<TimeOfUsePeriod>,
    pub bill_credits: BillCredits,
    pub evidence: Option<Evidence>,
}

impl RateStructure {
    pub fn empty(rate_type: RateType) -> Self {
        Self {
            rate_type,
            base_monthly_fee_cents: 0.0,
            energy_rate_cents: None,
            usage_tiers: Vec::new(),
            time_of_use_periods: Vec::new(),
            bill_credits: BillCredits::none(),
            evidence: None,
        }
    }

    /// Contiguity invariant from spec §8: first tier at 0, each subsequent tier continues the
    /// prior tier's boundary, at most one open-ended tier and it must be last.
    pub fn tiers_contiguous(&self) -> bool {
        if self.usage_tiers.is_empty() {
            return true;
        }
        if self.usage_tiers[0].min_kwh != 0.0 {
            return false;
        }
        let mut open_ended_seen = false;
        for (i, tier) in self.usage_tiers.iter().enumerate() {
            if open_ended_seen {
                // an open-ended tier must be last
                return false;
            }
            if tier.max_kwh.is_none() {
                open_ended_seen = true;
            }
            if i > 0 {
                let prev = &self.usage_tiers[i - 1];
                match prev.max_kwh {
                    Some(prev_max) if prev_max == tier.min_kwh => {}
                    _ => return false,
                }
            }
        }
        true
    }
}
