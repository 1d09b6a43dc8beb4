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

//! Composes the deterministic stages spec §4.1-§4.6 describe separately into the single
//! pure function an orchestrator step actually calls for one EFL document: normalize, run the
//! (advisory) AI draft, validate, solve, and score pass-strength. Nothing here touches I/O;
//! fetching the EFL document and persisting the result are the caller's job.

use efl_types::{PassStrength, PlanRules, RateStructure, RateType, SolveMode, Validation};

use crate::draft_parser::{self, DraftParser};
use crate::extractors;
use crate::normalizer::{self, NormalizedText};
use crate::scorer;
use crate::solver;
use crate::validator::{self, TdspPassthrough};

pub struct TemplateMappingInput<'a> {
    pub raw_text: &'a str,
    pub efl_sha256: &'a str,
    pub disclosed_points: &'a [(f64, f64)],
    pub tolerance_cents_per_kwh: f64,
}

#[derive(Debug, Clone)]
pub struct TemplateMappingResult {
    pub normalized: NormalizedText,
    pub draft_confidence: f64,
    pub draft_warnings: Vec<String>,
    pub rate_structure: RateStructure,
    pub validation: Validation,
    pub solve_mode: SolveMode,
    pub solver_applied: Vec<String>,
    pub pass_strength: PassStrength,
    pub puct_certificate: Option<String>,
    pub efl_version_code: Option<String>,
}

impl TemplateMappingResult {
    /// Spec §4.10 step 3: "auto-persist only on PASS+STRONG+identity".
    pub fn has_identity(&self) -> bool {
        self.puct_certificate.is_some() || self.efl_version_code.is_some()
    }

    pub fn eligible_for_auto_persist(&self) -> bool {
        self.validation.is_pass() && self.pass_strength.permits_auto_persist() && self.has_identity()
    }
}

/// Runs normalize -> draft -> validate -> solve -> score for one EFL document against one
/// offer's disclosed average-price table.
pub fn run_template_mapping(
    input: &TemplateMappingInput,
    parser: &dyn DraftParser,
) -> TemplateMappingResult {
    let normalized = normalizer::normalize(input.raw_text);
    let draft = parser.parse_draft(&normalized.text, input.efl_sha256);
    let draft_warnings = draft_parser::filter_boilerplate_warnings(draft.parse_warnings.clone());

    let rate_type = draft.rate_structure.as_ref().map(|s| s.rate_type).unwrap_or(RateType::Fixed);
    let plan_rules = draft.plan_rules.clone().unwrap_or_else(|| PlanRules::empty(rate_type));
    let rate_structure = draft.rate_structure.clone().unwrap_or_else(|| RateStructure::empty(rate_type));

    let working_draft =
        solver::Draft { raw_text: normalized.text.clone(), plan_rules, rate_structure };

    let initial_validation = validator::validate(
        input.disclosed_points,
        &working_draft.rate_structure,
        Some(input.tolerance_cents_per_kwh),
        TdspPassthrough::none(),
    );

    let solve_result = solver::solve(&working_draft, &initial_validation, input.disclosed_points);

    let pass_strength = scorer::score(
        &solve_result.validation_after,
        input.disclosed_points,
        &solve_result.derived_rate_structure,
        &TdspPassthrough::none(),
    );

    TemplateMappingResult {
        normalized,
        draft_confidence: draft.parse_confidence,
        draft_warnings,
        rate_structure: solve_result.derived_rate_structure,
        validation: solve_result.validation_after,
        solve_mode: solve_result.solve_mode,
        solver_applied: solve_result.solver_applied,
        pass_strength,
        puct_certificate: extractors::extract_puct_certificate(input.raw_text),
        efl_version_code: extractors::extract_efl_version_code(input.raw_text),
    }
}
