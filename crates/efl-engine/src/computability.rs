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

//! Computability Analyzer (spec §4.7): decides whether a final `RateStructure` carries enough
//! to run the True-Cost Estimator, and which usage-bucket keys it requires.

use std::collections::BTreeMap;

use efl_types::{
    BUCKET_KEY_ALL_TOTAL, Computability, ComputabilityStatus, RateStructure, RateType, ReasonCode,
    month_bucket_key,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ComputabilityOptions {
    /// Operator override admitting intra-day TOU structures as computable without hourly
    /// usage buckets (spec §4.7: "unless an override is set").
    pub intra_day_tou_override: bool,
}

/// "Overlapping" here means a later segment's `min` falls strictly inside an earlier segment's
/// `[min, max)` range — the solver normalizes segments non-overlapping (spec §4.5 step 8), so
/// this only fires on a hand-constructed or otherwise malformed structure.
fn has_overlapping_credits(structure: &RateStructure) -> bool {
    let rules = &structure.bill_credits.rules;
    for (i, a) in rules.iter().enumerate() {
        for b in rules.iter().skip(i + 1) {
            let a_max = a.max_usage_kwh.unwrap_or(f64::INFINITY);
            let b_min = b.min_usage_kwh.unwrap_or(0.0);
            if b_min < a_max {
                return true;
            }
        }
    }
    false
}

fn all_day_periods_partition_months(structure: &RateStructure) -> bool {
    if structure.time_of_use_periods.is_empty() {
        return false;
    }
    if !structure.time_of_use_periods.iter().all(|p| p.is_all_day()) {
        return false;
    }
    let mut seen = [false; 13];
    for period in &structure.time_of_use_periods {
        let Some(months) = &period.months else { return false };
        for &m in months {
            if m == 0 || m > 12 || seen[m as usize] {
                return false;
            }
            seen[m as usize] = true;
        }
    }
    (1..=12).all(|m| seen[m as usize])
}

fn has_intra_day_periods(structure: &RateStructure) -> bool {
    structure.time_of_use_periods.iter().any(|p| !p.is_all_day())
}

fn analyze_fixed_or_tiered(structure: &RateStructure) -> Computability {
    if structure.energy_rate_cents.is_none() && structure.usage_tiers.is_empty() {
        return Computability::not_computable(ReasonCode::UnsupportedRateStructure);
    }
    if !structure.usage_tiers.is_empty() && !structure.tiers_contiguous() {
        return Computability::not_computable(ReasonCode::UnsupportedTierVariation);
    }
    if has_overlapping_credits(structure) {
        return Computability::not_computable(ReasonCode::UnsupportedCreditsInTiered);
    }
    Computability::computable(vec![BUCKET_KEY_ALL_TOTAL.to_string()])
}

fn analyze_time_of_use(structure: &RateStructure, options: &ComputabilityOptions) -> Computability {
    if has_intra_day_periods(structure) {
        return if options.intra_day_tou_override {
            Computability::computable(vec![BUCKET_KEY_ALL_TOTAL.to_string()])
        } else {
            Computability::not_computable(ReasonCode::NeedsHourlyIntervals)
        };
    }
    if !all_day_periods_partition_months(structure) {
        return Computability::not_computable(ReasonCode::UnsupportedCombinedStructures);
    }
    Computability::computable((1..=12u8).map(month_bucket_key).collect())
}

fn analyze_variable_or_indexed(has_efl_average_price_anchor: bool) -> Computability {
    if has_efl_average_price_anchor {
        return Computability {
            status: ComputabilityStatus::Computable,
            reason_code: Some(ReasonCode::IndexedApproximateOk),
            required_bucket_keys: vec![BUCKET_KEY_ALL_TOTAL.to_string()],
            supported_features: BTreeMap::new(),
        };
    }
    Computability::not_computable(ReasonCode::NonDeterministicPricing)
}

/// Runs the spec §4.7 decision tree against a final `RateStructure`.
pub fn analyze(
    structure: &RateStructure,
    has_efl_average_price_anchor: bool,
    options: &ComputabilityOptions,
) -> Computability {
    match structure.rate_type {
        RateType::Fixed => analyze_fixed_or_tiered(structure),
        RateType::TimeOfUse => analyze_time_of_use(structure, options),
        RateType::Variable | RateType::Indexed => analyze_variable_or_indexed(has_efl_average_price_anchor),
    }
}
