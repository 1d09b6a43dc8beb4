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

//! Bill credit evaluation math, shared by the validator, gap solver, and estimator.
//!
//! Two representations exist (spec §3, §4.5 step 8, §4.8):
//! - `BillCreditRule` (on `PlanRules`): raw, truly-additive threshold events as disclosed.
//! - `BillCreditSegment` (on `RateStructure`): non-overlapping usage-range segments, normalized
//!   from the raw events for persistence. A usage amount falls into at most one segment.

use efl_types::{BillCreditRule, BillCreditSegment, CreditType};

/// `THRESHOLD_MAX` rules apply at `usage_kwh <= threshold`, but a segment's upper bound is
/// exclusive (`usage_kwh < max`) — nudge the segment boundary up by this much so the threshold
/// itself still qualifies.
const THRESHOLD_MAX_INCLUSIVE_EPSILON_KWH: f64 = 1e-6;

/// Evaluates a single raw threshold rule against monthly usage (spec §4.8): `ThresholdMin`
/// applies when `kwh >= threshold`, `ThresholdMax` when `kwh <= threshold`.
pub fn rule_applies(rule: &BillCreditRule, usage_kwh: f64) -> bool {
    match rule.credit_type {
        CreditType::ThresholdMin => usage_kwh >= rule.threshold_kwh,
        CreditType::ThresholdMax => usage_kwh <= rule.threshold_kwh,
    }
}

/// Sums every raw rule that applies at `usage_kwh`, truly additive across rules (spec §4.5
/// step 8: "keep raw additive events for validator math").
pub fn raw_additive_credit_cents(usage_kwh: f64, rules: &[BillCreditRule]) -> f64 {
    rules
        .iter()
        .filter(|r| rule_applies(r, usage_kwh))
        .map(|r| r.credit_dollars * 100.0)
        .sum()
}

/// Sums the (normally singular) segment(s) whose `[min, max)` range contains `usage_kwh`. Since
/// persisted segments are constructed non-overlapping, this selects at most one segment in
/// practice — which is what gives scenario 6 (spec §8) its `$50`, not `$85`, result.
pub fn additive_credit_cents(usage_kwh: f64, segments: &[BillCreditSegment]) -> f64 {
    segments
        .iter()
        .filter(|s| {
            let above_min = s.min_usage_kwh.is_none_or(|min| usage_kwh >= min);
            let below_max = s.max_usage_kwh.is_none_or(|max| usage_kwh < max);
            above_min && below_max
        })
        .map(|s| s.credit_amount_cents)
        .sum()
}

/// Normalizes raw additive credit rules into non-overlapping persisted segments (spec §4.5 step
/// 8). `THRESHOLD_MIN` rules, sorted by threshold ascending, become cumulative segments: `$35 @
/// >=1000`, `+$15 @ >=2000` becomes `[1000,2000): $35`, `[2000, inf): $50`. `THRESHOLD_MAX` rules
/// (the prepaid max-usage credit from spec §4.5 step 7) don't stack against each other, so each
/// passes straight through as its own `[0, threshold]` segment.
pub fn normalize_threshold_min_rules_to_segments(rules: &[BillCreditRule]) -> Vec<BillCreditSegment> {
    let mut mins: Vec<&BillCreditRule> =
        rules.iter().filter(|r| r.credit_type == CreditType::ThresholdMin).collect();
    mins.sort_by(|a, b| a.threshold_kwh.partial_cmp(&b.threshold_kwh).unwrap());

    let mut segments = Vec::new();
    let mut cumulative_cents = 0.0;

    for (i, rule) in mins.iter().enumerate() {
        cumulative_cents += rule.credit_dollars * 100.0;
        let min_usage_kwh = Some(rule.threshold_kwh);
        let max_usage_kwh = mins.get(i + 1).map(|next| next.threshold_kwh);
        segments.push(BillCreditSegment {
            credit_amount_cents: cumulative_cents,
            min_usage_kwh,
            max_usage_kwh,
            label: format!("threshold >= {} kWh", rule.threshold_kwh),
        });
    }

    for rule in rules.iter().filter(|r| r.credit_type == CreditType::ThresholdMax) {
        segments.push(BillCreditSegment {
            credit_amount_cents: rule.credit_dollars * 100.0,
            min_usage_kwh: None,
            max_usage_kwh: Some(rule.threshold_kwh + THRESHOLD_MAX_INCLUSIVE_EPSILON_KWH),
            label: format!("threshold <= {} kWh", rule.threshold_kwh),
        });
    }

    segments
}
