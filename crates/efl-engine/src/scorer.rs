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

//! Pass-Strength Scorer (spec §4.6).
//!
//! For validations that already PASS at the disclosed points, probes interior usage points
//! interpolated from the disclosed table (e.g. 750, 1500 between 500/1000/2000) to catch
//! structures that happen to pass at the exact disclosed points but diverge in between.

use efl_types::{PassStrength, PassStrengthLevel, RateStructure, Validation, ValidationPoint};

use crate::validator::{TdspPassthrough, model_monthly_bill_cents};

const RELAXED_TOLERANCE_CENTS_PER_KWH: f64 = 1.0;
const MIN_PLAUSIBLE_CENTS_PER_KWH: f64 = 0.0;
const MAX_PLAUSIBLE_CENTS_PER_KWH: f64 = 200.0;

fn interior_points(disclosed_points: &[(f64, f64)]) -> Vec<f64> {
    let mut sorted: Vec<f64> = disclosed_points.iter().map(|&(u, _)| u).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    sorted.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

fn interpolate_expected(disclosed_points: &[(f64, f64)], usage_kwh: f64) -> Option<f64> {
    let mut sorted: Vec<(f64, f64)> = disclosed_points.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    sorted.windows(2).find_map(|w| {
        let (u0, e0) = w[0];
        let (u1, e1) = w[1];
        if u1 <= u0 || usage_kwh < u0 || usage_kwh > u1 {
            return None;
        }
        let t = (usage_kwh - u0) / (u1 - u0);
        Some(e0 + t * (e1 - e0))
    })
}

/// A residual shape where adjacent off-points diff in opposite directions, each beyond half
/// strict tolerance — passes on average while masking a structurally wrong rate ("cancellation
/// pass", spec §4.6).
fn has_cancellation_shape(off_point_diffs: &[ValidationPoint], tolerance: f64) -> bool {
    off_point_diffs.windows(2).any(|w| {
        let a = w[0].diff_cents_per_kwh;
        let b = w[1].diff_cents_per_kwh;
        a.signum() != b.signum() && a.abs() > tolerance / 2.0 && b.abs() > tolerance / 2.0
    })
}

pub fn score(
    validation: &Validation,
    disclosed_points: &[(f64, f64)],
    structure: &RateStructure,
    tdsp: &TdspPassthrough,
) -> PassStrength {
    if !validation.is_pass() {
        return PassStrength {
            level: PassStrengthLevel::Invalid,
            reasons: vec!["validation did not PASS".to_string()],
            off_point_diffs: Vec::new(),
        };
    }

    let mut reasons = Vec::new();
    let mut off_point_diffs = Vec::new();
    let mut worst_abs_diff = 0.0_f64;
    let mut implausible = false;

    for usage_kwh in interior_points(disclosed_points) {
        let Some(expected) = interpolate_expected(disclosed_points, usage_kwh) else { continue };
        let bill = model_monthly_bill_cents(usage_kwh, structure, tdsp);
        let modeled = if usage_kwh > 0.0 { bill / usage_kwh } else { 0.0 };
        let diff = modeled - expected;

        if !(MIN_PLAUSIBLE_CENTS_PER_KWH..=MAX_PLAUSIBLE_CENTS_PER_KWH).contains(&modeled) {
            implausible = true;
            reasons.push(format!("modeled {modeled:.4} c/kWh at {usage_kwh} kWh outside plausible bounds"));
        }

        worst_abs_diff = worst_abs_diff.max(diff.abs());
        off_point_diffs.push(ValidationPoint {
            usage_kwh,
            expected_cents_per_kwh: expected,
            modeled_cents_per_kwh: modeled,
            diff_cents_per_kwh: diff,
        });
    }

    let cancellation = has_cancellation_shape(&off_point_diffs, validation.tolerance_cents_per_kwh);
    if cancellation {
        reasons.push("cancellation-like residual shape detected across off-points".to_string());
    }

    let level = if implausible || worst_abs_diff > RELAXED_TOLERANCE_CENTS_PER_KWH {
        if reasons.is_empty() {
            reasons.push(format!("off-point residual {worst_abs_diff:.4} c/kWh exceeds relaxed bound"));
        }
        PassStrengthLevel::Invalid
    } else if cancellation || worst_abs_diff > validation.tolerance_cents_per_kwh {
        if worst_abs_diff > validation.tolerance_cents_per_kwh && !cancellation {
            reasons.push(format!(
                "off-point residual {worst_abs_diff:.4} c/kWh within relaxed but above strict tolerance"
            ));
        }
        PassStrengthLevel::Weak
    } else {
        PassStrengthLevel::Strong
    };

    PassStrength { level, reasons, off_point_diffs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_types::{AssumptionsUsed, RateType, TdspAppliedMode, ValidationStatus};

    fn passing_validation() -> Validation {
        Validation {
            status: ValidationStatus::Pass,
            tolerance_cents_per_kwh: 0.25,
            points: Vec::new(),
            assumptions_used: AssumptionsUsed { tdsp_applied_mode: TdspAppliedMode::None, night_usage_percent: None, tou_hours: None },
            queue_reason: None,
        }
    }

    #[test]
    fn test_strong_when_flat_rate_matches_everywhere() {
        let mut structure = RateStructure::empty(RateType::Fixed);
        structure.energy_rate_cents = Some(11.0);
        let points = [(500.0, 11.0), (1000.0, 11.0), (2000.0, 11.0)];
        let strength = score(&passing_validation(), &points, &structure, &TdspPassthrough::none());
        assert_eq!(strength.level, PassStrengthLevel::Strong);
    }

    #[test]
    fn test_invalid_when_not_passing() {
        let mut validation = passing_validation();
        validation.status = ValidationStatus::Fail;
        let structure = RateStructure::empty(RateType::Fixed);
        let points = [(500.0, 11.0)];
        let strength = score(&validation, &points, &structure, &TdspPassthrough::none());
        assert_eq!(strength.level, PassStrengthLevel::Invalid);
    }

    #[test]
    fn test_invalid_when_structure_diverges_between_disclosed_points() {
        let mut structure = RateStructure::empty(RateType::Fixed);
        // a sharp dip-then-spike tier shape whose average matches the disclosed table exactly
        // at 500/1000/2000 kWh but diverges well beyond the relaxed bound at 750 kWh.
        structure.usage_tiers = vec![
            efl_types::UsageTier { min_kwh: 0.0, max_kwh: Some(500.0), rate_cents_per_kwh: 20.0 },
            efl_types::UsageTier { min_kwh: 500.0, max_kwh: Some(1000.0), rate_cents_per_kwh: 5.0 },
            efl_types::UsageTier { min_kwh: 1000.0, max_kwh: None, rate_cents_per_kwh: 20.0 },
        ];
        let points = [(500.0, 20.0), (1000.0, 12.5), (2000.0, 16.25)];
        let strength = score(&passing_validation(), &points, &structure, &TdspPassthrough::none());
        assert_eq!(strength.level, PassStrengthLevel::Invalid);
    }
}
