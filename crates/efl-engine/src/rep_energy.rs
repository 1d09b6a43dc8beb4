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

//! Shared REP energy-charge modeling, used by both the validator (§4.4) and the estimator
//! (§4.8): tiered step-through when tiers are present, a coverage-weighted approximation for
//! time-of-use structures, a single fixed rate otherwise.

use efl_types::{RateStructure, TimeOfUsePeriod};

/// Models the REP energy charge, in cents, for `usage_kwh` against a flat/tiered/TOU structure.
///
/// The validator and scorer only ever see a single disclosed `(usage_kwh, expected)` point with
/// no calendar month attached, unlike the estimator's month-by-month accumulation in
/// `estimator::tou_energy_cents_for_month`. TOU periods are therefore apportioned by coverage
/// share rather than by a specific month: an all-day period (spec §4.5 step 5, seasonal discount)
/// is weighted by the fraction of the year its `months` cover; an intra-day period (spec §4.5
/// step 9, peak/off-peak promotion) is weighted by the fraction of the day its clock hours span.
/// This is an approximation the estimator doesn't need, since it always has real per-month usage
/// buckets to apply each period against directly.
pub fn model_rep_energy_cents(usage_kwh: f64, structure: &RateStructure) -> f64 {
    if !structure.usage_tiers.is_empty() {
        return tiered_step_through_cents(usage_kwh, structure);
    }
    if !structure.time_of_use_periods.is_empty() {
        return tou_coverage_weighted_cents(usage_kwh, structure);
    }
    if let Some(rate) = structure.energy_rate_cents {
        return usage_kwh * rate;
    }
    0.0
}

fn tiered_step_through_cents(usage_kwh: f64, structure: &RateStructure) -> f64 {
    let mut total = 0.0;
    for tier in &structure.usage_tiers {
        let tier_top = tier.max_kwh.unwrap_or(f64::INFINITY);
        if usage_kwh <= tier.min_kwh {
            break;
        }
        let kwh_in_tier = usage_kwh.min(tier_top) - tier.min_kwh;
        if kwh_in_tier > 0.0 {
            total += kwh_in_tier * tier.rate_cents_per_kwh;
        }
    }
    total
}

fn tou_coverage_weighted_cents(usage_kwh: f64, structure: &RateStructure) -> f64 {
    structure
        .time_of_use_periods
        .iter()
        .map(|period| usage_kwh * period.rate_cents_per_kwh * period_coverage_weight(period))
        .sum()
}

/// Share of the year (all-day periods) or day (intra-day periods) a period covers.
fn period_coverage_weight(period: &TimeOfUsePeriod) -> f64 {
    if period.is_all_day() {
        period.months.as_ref().map_or(1.0, |months| months.len() as f64 / 12.0)
    } else {
        period_duration_hours(period) / 24.0
    }
}

fn period_duration_hours(period: &TimeOfUsePeriod) -> f64 {
    let (start, end) = (period.start_hour as i32, period.end_hour as i32);
    if end > start { (end - start) as f64 } else { (24 - start + end) as f64 }
}
