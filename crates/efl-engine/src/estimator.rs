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

//! True-Cost Estimator (spec §4.8). Pure and deterministic in its inputs.

use efl_types::{
    BUCKET_KEY_ALL_TOTAL, Estimate, EstimateComponents, EstimateMode, EstimateStatus,
    MonthlyUsageBuckets, RateStructure, RateType, TdspRates,
};

use crate::credits_math::additive_credit_cents;
use crate::rep_energy::model_rep_energy_cents;

pub struct EstimatorInputs<'a> {
    pub annual_kwh: f64,
    pub months_count: u32,
    pub tdsp_rates: TdspRates,
    pub rate_structure: &'a RateStructure,
    pub usage_buckets_by_month: &'a MonthlyUsageBuckets,
    pub estimate_mode: EstimateMode,
    /// The EFL's own disclosed 1000 kWh average ¢/kWh, required only by
    /// `INDEXED_EFL_ANCHOR_APPROX` mode.
    pub efl_disclosed_1000kwh_cents_per_kwh: Option<f64>,
}

fn monthly_kwh(buckets: &MonthlyUsageBuckets, year_month: &str) -> Option<f64> {
    buckets.get(year_month, BUCKET_KEY_ALL_TOTAL)
}

fn month_number_from_year_month(year_month: &str) -> u8 {
    year_month.rsplit('-').next().and_then(|m| m.parse().ok()).unwrap_or(0)
}

/// REP energy for an all-day TOU structure: each period contributes its full rate for the
/// months it covers. Returns `None` when any period is intra-day — that needs hourly usage
/// buckets the estimator does not have (spec §4.8).
fn tou_energy_cents_for_month(usage_kwh: f64, structure: &RateStructure, month_number: u8) -> Option<f64> {
    let mut total = 0.0;
    for period in &structure.time_of_use_periods {
        if !period.is_all_day() {
            return None;
        }
        let applies = period.months.as_ref().is_none_or(|ms| ms.contains(&month_number));
        if applies {
            total += usage_kwh * period.rate_cents_per_kwh;
        }
    }
    Some(total)
}

/// Runs the spec §4.8 monthly accumulation, returning `NOT_COMPUTABLE` whenever a required
/// bucket or TOU precondition is missing rather than guessing.
pub fn estimate(inputs: &EstimatorInputs) -> Estimate {
    let mut year_months = inputs.usage_buckets_by_month.year_months();
    year_months.sort();

    if year_months.len() < inputs.months_count as usize {
        return Estimate::not_computable("fewer usage-bucket months than months_count");
    }

    let mut annual_rep_energy_cents = 0.0;
    let mut annual_rep_fixed_cents = 0.0;
    let mut annual_tdsp_delivery_cents = 0.0;
    let mut annual_tdsp_fixed_cents = 0.0;
    let mut annual_credits_cents = 0.0;

    for ym in year_months.iter().take(inputs.months_count as usize) {
        let Some(usage_kwh) = monthly_kwh(inputs.usage_buckets_by_month, ym) else {
            return Estimate::not_computable(format!("missing {BUCKET_KEY_ALL_TOTAL} bucket for {ym}"));
        };

        let rep_energy_cents = if inputs.rate_structure.rate_type == RateType::TimeOfUse {
            match tou_energy_cents_for_month(usage_kwh, inputs.rate_structure, month_number_from_year_month(ym)) {
                Some(c) => c,
                None => return Estimate::not_computable("intra-day TOU period requires hourly usage buckets"),
            }
        } else {
            model_rep_energy_cents(usage_kwh, inputs.rate_structure)
        };

        annual_rep_energy_cents += rep_energy_cents;
        annual_rep_fixed_cents += inputs.rate_structure.base_monthly_fee_cents;
        annual_tdsp_delivery_cents += inputs.tdsp_rates.per_kwh_delivery_charge_cents * usage_kwh;
        annual_tdsp_fixed_cents += inputs.tdsp_rates.monthly_customer_charge_dollars * 100.0;
        annual_credits_cents += additive_credit_cents(usage_kwh, &inputs.rate_structure.bill_credits.rules);
    }

    let status = if inputs.estimate_mode == EstimateMode::IndexedEflAnchorApprox {
        let Some(anchor) = inputs.efl_disclosed_1000kwh_cents_per_kwh else {
            return Estimate::not_computable(
                "INDEXED_EFL_ANCHOR_APPROX requires a disclosed 1000 kWh average price",
            );
        };
        // anchor REP energy to the EFL's own disclosed average, net of the TDSP per-kWh share.
        let rep_anchor_cents_per_kwh = (anchor - inputs.tdsp_rates.per_kwh_delivery_charge_cents).max(0.0);
        annual_rep_energy_cents = rep_anchor_cents_per_kwh * inputs.annual_kwh;
        EstimateStatus::Approximate
    } else {
        EstimateStatus::Ok
    };

    let annual_cost_cents = annual_rep_energy_cents + annual_rep_fixed_cents + annual_tdsp_delivery_cents
        + annual_tdsp_fixed_cents
        - annual_credits_cents;
    let annual_cost_dollars = annual_cost_cents / 100.0;
    let monthly_cost_dollars = annual_cost_dollars / inputs.months_count as f64;
    let effective_cents_per_kwh =
        if inputs.annual_kwh > 0.0 { annual_cost_cents / inputs.annual_kwh } else { 0.0 };

    Estimate {
        status,
        annual_cost_dollars,
        monthly_cost_dollars,
        effective_cents_per_kwh,
        components: EstimateComponents {
            rep_energy_dollars: annual_rep_energy_cents / 100.0,
            rep_fixed_dollars: annual_rep_fixed_cents / 100.0,
            tdsp_delivery_dollars: annual_tdsp_delivery_cents / 100.0,
            tdsp_fixed_dollars: annual_tdsp_fixed_cents / 100.0,
            credits_dollars: annual_credits_cents / 100.0,
        },
        tdsp_rates_applied: Some(inputs.tdsp_rates),
        reason: None,
    }
}
