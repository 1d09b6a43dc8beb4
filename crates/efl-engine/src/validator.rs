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

//! Avg-Price Validator (spec §4.4).
//!
//! Models a monthly bill at each disclosed usage point from the candidate `RateStructure`,
//! adds a TDSP passthrough assumption, and compares the resulting ¢/kWh against the EFL's own
//! disclosed average-price table within a tolerance. Deterministic and side-effect free.

use efl_types::{
    AssumptionsUsed, RateStructure, TdspAppliedMode, Validation, ValidationPoint, ValidationStatus,
};

use crate::credits_math::additive_credit_cents;
use crate::rep_energy::model_rep_energy_cents;

pub const DEFAULT_TOLERANCE_CENTS_PER_KWH: f64 = 0.25;

/// TDSP passthrough assumption used while validating (spec §4.4): `FLAT` unless a tiered
/// utility tariff table is supplied, `NONE` when the TDSP rate is masked/unknown in the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdspPassthrough {
    pub mode: TdspAppliedMode,
    pub per_kwh_cents: f64,
    pub monthly_customer_charge_cents: f64,
}

impl TdspPassthrough {
    pub fn none() -> Self {
        Self { mode: TdspAppliedMode::None, per_kwh_cents: 0.0, monthly_customer_charge_cents: 0.0 }
    }

    fn cents_for(&self, usage_kwh: f64) -> f64 {
        match self.mode {
            TdspAppliedMode::None => 0.0,
            TdspAppliedMode::Flat | TdspAppliedMode::TieredByUtilityTable => {
                usage_kwh * self.per_kwh_cents + self.monthly_customer_charge_cents
            }
        }
    }
}

/// Models the total monthly bill, in cents, for `usage_kwh` under `structure` plus a TDSP
/// passthrough assumption.
pub fn model_monthly_bill_cents(usage_kwh: f64, structure: &RateStructure, tdsp: &TdspPassthrough) -> f64 {
    let rep_energy_cents = model_rep_energy_cents(usage_kwh, structure);
    let rep_fixed_cents = structure.base_monthly_fee_cents;
    let tdsp_cents = tdsp.cents_for(usage_kwh);
    let credit_cents = additive_credit_cents(usage_kwh, &structure.bill_credits.rules);

    rep_energy_cents + rep_fixed_cents + tdsp_cents - credit_cents
}

fn model_cents_per_kwh(usage_kwh: f64, structure: &RateStructure, tdsp: &TdspPassthrough) -> f64 {
    if usage_kwh <= 0.0 {
        return 0.0;
    }
    model_monthly_bill_cents(usage_kwh, structure, tdsp) / usage_kwh
}

/// Runs the validator against a disclosed `(usage_kwh, expected_cents_per_kwh)` table.
pub fn validate(
    disclosed_points: &[(f64, f64)],
    structure: &RateStructure,
    tolerance_cents_per_kwh: Option<f64>,
    tdsp: TdspPassthrough,
) -> Validation {
    let tolerance = tolerance_cents_per_kwh.unwrap_or(DEFAULT_TOLERANCE_CENTS_PER_KWH);

    let points: Vec<ValidationPoint> = disclosed_points
        .iter()
        .map(|&(usage_kwh, expected)| {
            let modeled = model_cents_per_kwh(usage_kwh, structure, &tdsp);
            ValidationPoint {
                usage_kwh,
                expected_cents_per_kwh: expected,
                modeled_cents_per_kwh: modeled,
                diff_cents_per_kwh: modeled - expected,
            }
        })
        .collect();

    let status = if points.iter().all(|p| p.diff_cents_per_kwh.abs() <= tolerance) {
        ValidationStatus::Pass
    } else {
        ValidationStatus::Fail
    };

    Validation {
        status,
        tolerance_cents_per_kwh: tolerance,
        points,
        assumptions_used: AssumptionsUsed { tdsp_applied_mode: tdsp.mode, night_usage_percent: None, tou_hours: None },
        queue_reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_types::{BillCreditSegment, BillCredits, RateType, UsageTier};

    fn fixed_structure(rate: f64, base_cents: f64) -> RateStructure {
        let mut s = RateStructure::empty(RateType::Fixed);
        s.energy_rate_cents = Some(rate);
        s.base_monthly_fee_cents = base_cents;
        s
    }

    #[test]
    fn test_pass_at_exact_tolerance() {
        let structure = fixed_structure(11.0, 0.0);
        // 500 kWh * 11.0c = 5500c = 11.0 c/kWh exactly, plus epsilon via base fee.
        let points = [(500.0, 11.0)];
        let v = validate(&points, &structure, Some(0.25), TdspPassthrough::none());
        assert_eq!(v.status, ValidationStatus::Pass);
    }

    #[test]
    fn test_fail_beyond_tolerance() {
        let structure = fixed_structure(12.0, 0.0);
        let points = [(500.0, 11.0)];
        let v = validate(&points, &structure, Some(0.25), TdspPassthrough::none());
        assert_eq!(v.status, ValidationStatus::Fail);
    }

    #[test]
    fn test_tiered_structure_models_step_through() {
        let mut structure = RateStructure::empty(RateType::Fixed);
        structure.usage_tiers = vec![
            UsageTier { min_kwh: 0.0, max_kwh: Some(1000.0), rate_cents_per_kwh: 10.9852 },
            UsageTier { min_kwh: 1000.0, max_kwh: None, rate_cents_per_kwh: 12.9852 },
        ];
        let bill = model_monthly_bill_cents(1250.0, &structure, &TdspPassthrough::none());
        assert!((bill - 14231.5).abs() < 1e-6);
    }

    #[test]
    fn test_additive_credit_reduces_bill() {
        let mut structure = fixed_structure(10.0, 0.0);
        structure.bill_credits = BillCredits {
            has_bill_credit: true,
            rules: vec![BillCreditSegment {
                credit_amount_cents: 5000.0,
                min_usage_kwh: Some(1000.0),
                max_usage_kwh: None,
                label: "threshold".to_string(),
            }],
        };
        let with_credit = model_monthly_bill_cents(2000.0, &structure, &TdspPassthrough::none());
        structure.bill_credits = BillCredits::none();
        let without_credit = model_monthly_bill_cents(2000.0, &structure, &TdspPassthrough::none());
        assert_eq!(without_credit - with_credit, 5000.0);
    }
}
