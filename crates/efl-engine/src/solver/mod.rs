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

//! Gap Solver (spec §4.5).
//!
//! Drives a fixed, ordered sequence of idempotent repair steps over a `Draft`, re-validating
//! once after each applicable repair. Each step implements the local `RepairStep` trait, whose
//! shape (`name()`, `applies()`, `apply()`) is grounded on `fluxion-core`'s `EconomicStrategy`
//! (`name()`, `is_enabled()`, `evaluate()`) — the solver drives a fixed `Vec<Box<dyn
//! RepairStep>>` rather than hosting repairs as a separate plugin crate.

mod steps;

use efl_types::{PlanRules, QueueReason, RateStructure, SolveMode, Validation};

use crate::validator::{self, TdspPassthrough};

/// The working object every repair step reads and returns a (possibly) modified copy of.
#[derive(Debug, Clone)]
pub struct Draft {
    pub raw_text: String,
    pub plan_rules: PlanRules,
    pub rate_structure: RateStructure,
}

/// One gap-solver repair. Implementations must be idempotent: `apply` run twice in a row with
/// the same draft must equal `apply` run once (`applies` returning `false` on the second call is
/// the usual way this holds).
pub trait RepairStep {
    fn name(&self) -> &str;
    fn applies(&self, draft: &Draft, validation: &Validation) -> bool;
    fn apply(&self, draft: &Draft) -> Draft;
}

pub struct SolveResult {
    pub derived_plan_rules: PlanRules,
    pub derived_rate_structure: RateStructure,
    pub solver_applied: Vec<String>,
    pub validation_after: Validation,
    pub solve_mode: SolveMode,
    pub queue_reason: Option<QueueReason>,
}

fn repair_steps() -> Vec<Box<dyn RepairStep>> {
    vec![
        Box::new(steps::SyncTiersFromStructure),
        Box::new(steps::RederiveTiersFromText),
        Box::new(steps::BaseChargeBackfill),
        Box::new(steps::FixedRateFallback),
        Box::new(steps::SeasonalDiscountToTou),
        Box::new(steps::ServiceFeeCutoffToBaseAndCredit),
        Box::new(steps::PrepaidToBaseAndCredit),
        Box::new(steps::NormalizeAdditiveCredits),
        Box::new(steps::TouPromotion),
    ]
}

/// Runs the fixed repair sequence against `draft`, re-validating once after any repair is
/// applied, and classifies the result into a `SolveMode` (spec §4.5).
pub fn solve(draft: &Draft, initial_validation: &Validation, disclosed_points: &[(f64, f64)]) -> SolveResult {
    let mut current = draft.clone();
    let mut applied = Vec::new();
    let mut last_validation = initial_validation.clone();

    for step in repair_steps() {
        if step.applies(&current, &last_validation) {
            current = step.apply(&current);
            applied.push(step.name().to_string());
            last_validation = validator::validate(
                disclosed_points,
                &current.rate_structure,
                Some(last_validation.tolerance_cents_per_kwh),
                TdspPassthrough::none(),
            );
        }
    }

    let solve_mode = if applied.is_empty() {
        SolveMode::None
    } else if last_validation.is_pass() {
        SolveMode::PassWithAssumptions
    } else {
        SolveMode::Fail
    };

    let queue_reason = match solve_mode {
        SolveMode::Fail => Some(QueueReason {
            code: "SOLVER_EXHAUSTED".to_string(),
            message: format!("repairs applied ({}) did not bring validation to PASS", applied.join(", ")),
        }),
        _ => None,
    };

    SolveResult {
        derived_plan_rules: current.plan_rules,
        derived_rate_structure: current.rate_structure,
        solver_applied: applied,
        validation_after: last_validation,
        solve_mode,
        queue_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efl_types::RateType;

    #[test]
    fn test_no_repairs_needed_when_already_passing() {
        let mut rate_structure = RateStructure::empty(RateType::Fixed);
        rate_structure.energy_rate_cents = Some(11.0);
        let draft = Draft {
            raw_text: "Energy Charge 11.0\u{a2} per kWh".to_string(),
            plan_rules: PlanRules::empty(RateType::Fixed),
            rate_structure,
        };
        let points = [(500.0, 11.0)];
        let initial = validator::validate(&points, &draft.rate_structure, None, TdspPassthrough::none());
        let result = solve(&draft, &initial, &points);
        assert!(result.solver_applied.is_empty());
        assert_eq!(result.solve_mode, SolveMode::None);
    }

    #[test]
    fn test_fixed_rate_fallback_recovers_pass() {
        let text = "Energy Charge 11.0\u{a2} per kWh";
        let draft = Draft {
            raw_text: text.to_string(),
            plan_rules: PlanRules::empty(RateType::Fixed),
            rate_structure: RateStructure::empty(RateType::Fixed),
        };
        let points = [(500.0, 11.0)];
        let initial = validator::validate(&points, &draft.rate_structure, None, TdspPassthrough::none());
        assert_eq!(initial.status, efl_types::ValidationStatus::Fail);

        let result = solve(&draft, &initial, &points);
        assert!(result.solver_applied.contains(&"fixed_rate_fallback".to_string()));
        assert_eq!(result.solve_mode, SolveMode::PassWithAssumptions);
    }

    #[test]
    fn test_seasonal_discount_to_tou_recovers_pass() {
        let draft = Draft {
            raw_text: "Energy Charge 12.0\u{a2} per kWh\n50 percent discount off the Energy Charge from June 1 through September 30".to_string(),
            plan_rules: PlanRules::empty(RateType::Fixed),
            rate_structure: RateStructure::empty(RateType::Fixed),
        };
        let points = [(500.0, 10.0), (1000.0, 10.0), (2000.0, 10.0)];
        let initial = validator::validate(&points, &draft.rate_structure, None, TdspPassthrough::none());
        assert_eq!(initial.status, efl_types::ValidationStatus::Fail);

        let result = solve(&draft, &initial, &points);
        assert!(result.solver_applied.contains(&"fixed_rate_fallback".to_string()));
        assert!(result.solver_applied.contains(&"seasonal_discount_to_tou".to_string()));
        assert_eq!(result.solve_mode, SolveMode::PassWithAssumptions);
        assert!(result.validation_after.is_pass());
    }

    #[test]
    fn test_tou_promotion_recovers_pass() {
        let draft = Draft {
            raw_text: "Energy Charge Peak 12.0\u{a2}\nOff-Peak 8.0\u{a2}\nOff-Peak hours are 9:00 PM \u{2013} 9:00 AM\n50% of Off-Peak consumption".to_string(),
            plan_rules: PlanRules::empty(RateType::Fixed),
            rate_structure: RateStructure::empty(RateType::Fixed),
        };
        let points = [(500.0, 10.0), (1000.0, 10.0), (2000.0, 10.0)];
        let initial = validator::validate(&points, &draft.rate_structure, None, TdspPassthrough::none());

        let result = solve(&draft, &initial, &points);
        assert!(result.solver_applied.contains(&"tou_promotion".to_string()));
        assert_eq!(result.solve_mode, SolveMode::PassWithAssumptions);
        assert!(result.validation_after.is_pass());
    }
}
