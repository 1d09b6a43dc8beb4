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

//! The nine ordered repair steps (spec §4.5).

use efl_types::{BillCreditRule, CreditType, RateType, TimeOfUsePeriod, UsageTier, Validation};

use crate::credits_math::normalize_threshold_min_rules_to_segments;
use crate::extractors;
use crate::solver::{Draft, RepairStep};

/// Values below this are treated as dollars-per-kWh mistakenly carried in a cents field (spec
/// §4.5 step 1: "energyCharge <= 2 => $/kWh else c/kWh").
const DOLLARS_PER_KWH_HEURISTIC_CEILING: f64 = 2.0;
/// Step 6's tolerance on the monthly-bill residual that must be explained by the missing fee.
const SERVICE_FEE_RESIDUAL_TOLERANCE_CENTS: f64 = 75.0;

fn normalize_tier_unit(rate: f64) -> f64 {
    if rate <= DOLLARS_PER_KWH_HEURISTIC_CEILING { rate * 100.0 } else { rate }
}

/// Step 1: sync tiers from `RateStructure` into `PlanRules` when the draft carries structure
/// tiers the engine-computation view hasn't picked up yet.
pub struct SyncTiersFromStructure;

impl RepairStep for SyncTiersFromStructure {
    fn name(&self) -> &str {
        "sync_tiers_from_structure"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        draft.plan_rules.usage_tiers.is_empty() && !draft.rate_structure.usage_tiers.is_empty()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        next.plan_rules.usage_tiers = draft
            .rate_structure
            .usage_tiers
            .iter()
            .map(|t| UsageTier { rate_cents_per_kwh: normalize_tier_unit(t.rate_cents_per_kwh), ..*t })
            .collect();
        next
    }
}

/// Step 2: re-derive tiers from the raw text when the text discloses more tiers than the draft
/// currently carries.
pub struct RederiveTiersFromText;

impl RepairStep for RederiveTiersFromText {
    fn name(&self) -> &str {
        "rederive_tiers_from_text"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        let extracted = extractors::extract_usage_tiers(&draft.raw_text);
        extracted.len() > draft.plan_rules.usage_tiers.len()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let extracted = extractors::extract_usage_tiers(&draft.raw_text);
        next.plan_rules.usage_tiers = extracted.clone();
        next.rate_structure.usage_tiers = extracted;
        next
    }
}

/// Step 3: backfill the base monthly fee from the disclosed per-cycle or per-day charge.
pub struct BaseChargeBackfill;

impl RepairStep for BaseChargeBackfill {
    fn name(&self) -> &str {
        "base_charge_backfill"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        draft.rate_structure.base_monthly_fee_cents == 0.0
            && extractors::extract_base_charge(&draft.raw_text).is_some()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        if let Some(charge) = extractors::extract_base_charge(&draft.raw_text) {
            let monthly = match charge {
                extractors::BaseCharge::MonthlyCents(c) => c,
                extractors::BaseCharge::DailyCents(c) => extractors::daily_to_monthly_cents(c),
            };
            next.rate_structure.base_monthly_fee_cents = monthly;
            next.plan_rules.base_charge_per_month_cents = Some(monthly);
        }
        next
    }
}

/// Step 4: fall back to a single disambiguated REP rate when no tiers/TOU structure exists.
pub struct FixedRateFallback;

impl RepairStep for FixedRateFallback {
    fn name(&self) -> &str {
        "fixed_rate_fallback"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        draft.plan_rules.usage_tiers.is_empty()
            && draft.plan_rules.time_of_use_periods.is_empty()
            && draft.plan_rules.default_rate_cents_per_kwh.is_none()
            && draft.rate_structure.energy_rate_cents.is_none()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let tdsp_rate = None; // disambiguation tolerance is applied in the extractor itself
        if let Some(rate) = extractors::disambiguate_rep_energy_rate(&draft.raw_text, tdsp_rate) {
            next.plan_rules.default_rate_cents_per_kwh = Some(rate);
            next.rate_structure.energy_rate_cents = Some(rate);
        }
        next
    }
}

/// Step 5: promote a disclosed seasonal energy discount to two all-day TOU periods partitioning
/// the calendar months.
pub struct SeasonalDiscountToTou;

impl RepairStep for SeasonalDiscountToTou {
    fn name(&self) -> &str {
        "seasonal_discount_to_tou"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        draft.rate_structure.time_of_use_periods.is_empty()
            && draft.rate_structure.energy_rate_cents.is_some()
            && extractors::extract_seasonal_discount(&draft.raw_text).is_some()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let Some(discount) = extractors::extract_seasonal_discount(&draft.raw_text) else {
            return next;
        };
        let Some(base_rate) = draft.rate_structure.energy_rate_cents else {
            return next;
        };

        let discounted_rate = base_rate * (1.0 - discount.discount_fraction);
        let other_months: Vec<u8> = (1..=12u8).filter(|m| !discount.months.contains(m)).collect();

        next.rate_structure.rate_type = RateType::TimeOfUse;
        next.rate_structure.time_of_use_periods = vec![
            TimeOfUsePeriod {
                label: "seasonal_discount".to_string(),
                start_hour: 0,
                end_hour: 24,
                days_of_week: (0..7).collect(),
                months: Some(discount.months),
                rate_cents_per_kwh: discounted_rate,
                is_free: false,
            },
            TimeOfUsePeriod {
                label: "standard".to_string(),
                start_hour: 0,
                end_hour: 24,
                days_of_week: (0..7).collect(),
                months: Some(other_months),
                rate_cents_per_kwh: base_rate,
                is_free: false,
            },
        ];
        next
    }
}

/// Step 6: a disclosed "usage charge/service fee applies at or below N kWh" implies an
/// un-disclosed base fee, compensated above N kWh by an equivalent bill credit — applied only
/// when the validator's residual at points <= N is consistent with the missing fee.
pub struct ServiceFeeCutoffToBaseAndCredit;

impl ServiceFeeCutoffToBaseAndCredit {
    fn residual_is_consistent(&self, draft: &Draft, validation: &Validation, cutoff_kwh: f64, fee_cents: f64) -> bool {
        validation.points.iter().filter(|p| p.usage_kwh <= cutoff_kwh).all(|p| {
            let bill_residual_cents = p.diff_cents_per_kwh * p.usage_kwh;
            (bill_residual_cents.abs() - fee_cents).abs() <= SERVICE_FEE_RESIDUAL_TOLERANCE_CENTS
        }) && !draft.rate_structure.bill_credits.has_bill_credit
    }

    fn already_has_fee(&self, draft: &Draft) -> bool {
        draft.rate_structure.base_monthly_fee_cents > 0.0
    }
}

impl RepairStep for ServiceFeeCutoffToBaseAndCredit {
    fn name(&self) -> &str {
        "service_fee_cutoff_to_base_and_credit"
    }

    fn applies(&self, draft: &Draft, validation: &Validation) -> bool {
        if self.already_has_fee(draft) {
            return false;
        }
        let Some(cutoff) = extractors::extract_service_fee_cutoff(&draft.raw_text) else {
            return false;
        };
        self.residual_is_consistent(draft, validation, cutoff.cutoff_kwh, cutoff.fee_cents)
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let Some(cutoff) = extractors::extract_service_fee_cutoff(&draft.raw_text) else {
            return next;
        };
        next.rate_structure.base_monthly_fee_cents = cutoff.fee_cents;
        next.plan_rules.base_charge_per_month_cents = Some(cutoff.fee_cents);
        next.plan_rules.bill_credits.push(BillCreditRule {
            credit_dollars: cutoff.fee_cents / 100.0,
            threshold_kwh: cutoff.cutoff_kwh + 1.0,
            months_of_year: None,
            credit_type: CreditType::ThresholdMin,
        });
        next
    }
}

/// Step 7: prepaid daily charge becomes a monthly base fee; the compensating max-usage credit
/// becomes a `THRESHOLD_MAX` bill credit rule.
pub struct PrepaidToBaseAndCredit;

impl RepairStep for PrepaidToBaseAndCredit {
    fn name(&self) -> &str {
        "prepaid_to_base_and_credit"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        draft.rate_structure.base_monthly_fee_cents == 0.0
            && extractors::extract_prepaid_plan(&draft.raw_text).is_some()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let Some(plan) = extractors::extract_prepaid_plan(&draft.raw_text) else {
            return next;
        };
        let monthly = extractors::daily_to_monthly_cents(plan.daily_charge_cents);
        next.rate_structure.base_monthly_fee_cents = monthly;
        next.plan_rules.base_charge_per_month_cents = Some(monthly);
        next.plan_rules.bill_credits.push(BillCreditRule {
            credit_dollars: plan.monthly_credit_cents / 100.0,
            threshold_kwh: plan.max_usage_kwh,
            months_of_year: None,
            credit_type: CreditType::ThresholdMax,
        });
        next
    }
}

/// Step 8: normalize raw additive `THRESHOLD_MIN` credit events into non-overlapping persisted
/// segments, keeping the raw events on `PlanRules` for validator math.
pub struct NormalizeAdditiveCredits;

impl RepairStep for NormalizeAdditiveCredits {
    fn name(&self) -> &str {
        "normalize_additive_credits"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        !draft.plan_rules.bill_credits.is_empty() && draft.rate_structure.bill_credits.rules.is_empty()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let segments = normalize_threshold_min_rules_to_segments(&draft.plan_rules.bill_credits);
        if !segments.is_empty() {
            next.rate_structure.bill_credits.has_bill_credit = true;
            next.rate_structure.bill_credits.rules = segments;
        }
        next
    }
}

/// Step 9: promote disclosed peak/off-peak rates, hours, and an off-peak usage share into a
/// two-period TOU structure.
pub struct TouPromotion;

impl RepairStep for TouPromotion {
    fn name(&self) -> &str {
        "tou_promotion"
    }

    fn applies(&self, draft: &Draft, _validation: &Validation) -> bool {
        if !draft.rate_structure.time_of_use_periods.is_empty() {
            return false;
        }
        let candidate = extractors::extract_tou_candidate(&draft.raw_text);
        candidate.peak_rate_cents_per_kwh.is_some()
            && candidate.off_peak_rate_cents_per_kwh.is_some()
            && candidate.off_peak_window.is_some()
            && candidate.off_peak_usage_percent.is_some()
    }

    fn apply(&self, draft: &Draft) -> Draft {
        let mut next = draft.clone();
        let candidate = extractors::extract_tou_candidate(&draft.raw_text);
        let (Some(peak), Some(off_peak), Some(window)) =
            (candidate.peak_rate_cents_per_kwh, candidate.off_peak_rate_cents_per_kwh, candidate.off_peak_window)
        else {
            return next;
        };

        next.rate_structure.rate_type = RateType::TimeOfUse;
        next.rate_structure.time_of_use_periods = vec![
            TimeOfUsePeriod {
                label: "off_peak".to_string(),
                start_hour: window.start_hour,
                end_hour: window.end_hour,
                days_of_week: (0..7).collect(),
                months: None,
                rate_cents_per_kwh: off_peak,
                is_free: false,
            },
            TimeOfUsePeriod {
                label: "peak".to_string(),
                start_hour: window.end_hour,
                end_hour: window.start_hour,
                days_of_week: (0..7).collect(),
                months: None,
                rate_cents_per_kwh: peak,
                is_free: false,
            },
        ];
        next
    }
}
