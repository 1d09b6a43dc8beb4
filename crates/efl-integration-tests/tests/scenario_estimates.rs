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

//! Seed E2E scenarios, exercising the computability analyzer and true-cost estimator together
//! against hand-built rate structures the way a real template-mapping run would produce them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use efl_engine::computability::{self, ComputabilityOptions};
use efl_engine::estimator::{self, EstimatorInputs};
use efl_types::{
    BUCKET_KEY_ALL_TOTAL, BillCreditRule, BillCreditSegment, BillCredits, ComputabilityStatus, CreditType,
    EstimateMode, EstimateStatus, MonthlyUsageBuckets, RateStructure, RateType, ReasonCode, TdspRates, TimeOfUsePeriod,
    UsageTier,
};

fn flat_tdsp(delivery_cents: f64, monthly_dollars: f64) -> TdspRates {
    TdspRates {
        per_kwh_delivery_charge_cents: delivery_cents,
        monthly_customer_charge_dollars: monthly_dollars,
        effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    }
}

fn uniform_monthly_usage(monthly_kwh: f64) -> MonthlyUsageBuckets {
    let mut by_year_month = BTreeMap::new();
    for m in 1..=12u8 {
        let mut bucket = BTreeMap::new();
        bucket.insert(BUCKET_KEY_ALL_TOTAL.to_string(), monthly_kwh);
        by_year_month.insert(format!("2025-{m:02}"), bucket);
    }
    MonthlyUsageBuckets { by_year_month }
}

#[test]
fn scenario_1_fixed_rate_with_base_fee() {
    let mut structure = RateStructure::empty(RateType::Fixed);
    structure.energy_rate_cents = Some(12.5);
    structure.base_monthly_fee_cents = 995.0;

    let computability = computability::analyze(&structure, false, &ComputabilityOptions::default());
    assert_eq!(computability.status, ComputabilityStatus::Computable);

    let buckets = uniform_monthly_usage(1000.0);
    let estimate = estimator::estimate(&EstimatorInputs {
        annual_kwh: 12000.0,
        months_count: 12,
        tdsp_rates: flat_tdsp(3.87, 4.39),
        rate_structure: &structure,
        usage_buckets_by_month: &buckets,
        estimate_mode: EstimateMode::Default,
        efl_disclosed_1000kwh_cents_per_kwh: None,
    });

    assert_eq!(estimate.status, EstimateStatus::Ok);
    assert!((estimate.annual_cost_dollars - 2136.48).abs() < 0.01, "{}", estimate.annual_cost_dollars);
}

#[test]
fn scenario_2_tiered_rate() {
    let mut structure = RateStructure::empty(RateType::Fixed);
    structure.usage_tiers = vec![
        UsageTier { min_kwh: 0.0, max_kwh: Some(1000.0), rate_cents_per_kwh: 10.9852 },
        UsageTier { min_kwh: 1000.0, max_kwh: None, rate_cents_per_kwh: 12.9852 },
    ];

    let buckets = uniform_monthly_usage(1250.0);
    let estimate = estimator::estimate(&EstimatorInputs {
        annual_kwh: 15000.0,
        months_count: 12,
        tdsp_rates: flat_tdsp(0.0, 0.0),
        rate_structure: &structure,
        usage_buckets_by_month: &buckets,
        estimate_mode: EstimateMode::Default,
        efl_disclosed_1000kwh_cents_per_kwh: None,
    });

    assert_eq!(estimate.status, EstimateStatus::Ok);
    assert!((estimate.components.rep_energy_dollars - 1707.78).abs() < 0.01, "{}", estimate.components.rep_energy_dollars);
}

#[test]
fn scenario_3_seasonal_discount_modeled_as_all_day_tou() {
    let mut structure = RateStructure::empty(RateType::TimeOfUse);
    structure.time_of_use_periods = vec![
        TimeOfUsePeriod {
            label: "standard".into(),
            start_hour: 0,
            end_hour: 24,
            days_of_week: (1..=7).collect(),
            months: Some(vec![1, 2, 3, 4, 5, 10, 11, 12]),
            rate_cents_per_kwh: 20.0,
            is_free: false,
        },
        TimeOfUsePeriod {
            label: "summer discount".into(),
            start_hour: 0,
            end_hour: 24,
            days_of_week: (1..=7).collect(),
            months: Some(vec![6, 7, 8, 9]),
            rate_cents_per_kwh: 10.0,
            is_free: false,
        },
    ];

    let computability = computability::analyze(&structure, false, &ComputabilityOptions::default());
    assert_eq!(computability.status, ComputabilityStatus::Computable);

    let buckets = uniform_monthly_usage(1000.0);
    let estimate = estimator::estimate(&EstimatorInputs {
        annual_kwh: 12000.0,
        months_count: 12,
        tdsp_rates: flat_tdsp(0.0, 0.0),
        rate_structure: &structure,
        usage_buckets_by_month: &buckets,
        estimate_mode: EstimateMode::Default,
        efl_disclosed_1000kwh_cents_per_kwh: None,
    });

    assert_eq!(estimate.status, EstimateStatus::Ok);
    assert!((estimate.components.rep_energy_dollars - 2000.0).abs() < 0.01, "{}", estimate.components.rep_energy_dollars);
}

#[test]
fn scenario_4_intra_day_tou_without_hourly_buckets_is_not_computable() {
    let mut structure = RateStructure::empty(RateType::TimeOfUse);
    structure.time_of_use_periods = vec![
        TimeOfUsePeriod {
            label: "off-peak".into(),
            start_hour: 21,
            end_hour: 5,
            days_of_week: (1..=7).collect(),
            months: None,
            rate_cents_per_kwh: 5.92,
            is_free: false,
        },
        TimeOfUsePeriod {
            label: "peak".into(),
            start_hour: 5,
            end_hour: 21,
            days_of_week: (1..=7).collect(),
            months: None,
            rate_cents_per_kwh: 11.84,
            is_free: false,
        },
    ];

    let computability = computability::analyze(&structure, false, &ComputabilityOptions::default());
    assert_eq!(computability.status, ComputabilityStatus::NotComputable);
    assert_eq!(computability.reason_code, Some(ReasonCode::NeedsHourlyIntervals));
}

#[test]
fn scenario_5_service_fee_cutoff_credit_cancels_fee_above_threshold() {
    let raw_rules = vec![BillCreditRule {
        credit_dollars: 8.0,
        threshold_kwh: 2000.0,
        months_of_year: None,
        credit_type: CreditType::ThresholdMin,
    }];
    let segments = efl_engine::credits_math::normalize_threshold_min_rules_to_segments(&raw_rules);

    let mut structure = RateStructure::empty(RateType::Fixed);
    structure.energy_rate_cents = Some(11.0);
    structure.base_monthly_fee_cents = 800.0;
    structure.bill_credits = BillCredits { has_bill_credit: true, rules: segments };

    let computability = computability::analyze(&structure, false, &ComputabilityOptions::default());
    assert_eq!(computability.status, ComputabilityStatus::Computable);

    // below the 1999 kWh cutoff: the $8.00 monthly service fee stands, no credit applies.
    let below_cutoff = uniform_monthly_usage(1000.0);
    let estimate_below = estimator::estimate(&EstimatorInputs {
        annual_kwh: 12000.0,
        months_count: 12,
        tdsp_rates: flat_tdsp(0.0, 0.0),
        rate_structure: &structure,
        usage_buckets_by_month: &below_cutoff,
        estimate_mode: EstimateMode::Default,
        efl_disclosed_1000kwh_cents_per_kwh: None,
    });
    assert_eq!(estimate_below.status, EstimateStatus::Ok);
    assert!((estimate_below.components.credits_dollars - 0.0).abs() < 0.01, "{}", estimate_below.components.credits_dollars);
    assert!((estimate_below.components.rep_fixed_dollars - 96.0).abs() < 0.01, "{}", estimate_below.components.rep_fixed_dollars);

    // above the cutoff every month: the threshold credit cancels the fee in full, every month.
    let above_cutoff = uniform_monthly_usage(2500.0);
    let estimate_above = estimator::estimate(&EstimatorInputs {
        annual_kwh: 30000.0,
        months_count: 12,
        tdsp_rates: flat_tdsp(0.0, 0.0),
        rate_structure: &structure,
        usage_buckets_by_month: &above_cutoff,
        estimate_mode: EstimateMode::Default,
        efl_disclosed_1000kwh_cents_per_kwh: None,
    });
    assert_eq!(estimate_above.status, EstimateStatus::Ok);
    assert!((estimate_above.components.credits_dollars - 96.0).abs() < 0.01, "{}", estimate_above.components.credits_dollars);
    assert!(
        (estimate_above.components.rep_fixed_dollars - estimate_above.components.credits_dollars).abs() < 0.01,
        "fee not fully cancelled: fixed={} credits={}",
        estimate_above.components.rep_fixed_dollars,
        estimate_above.components.credits_dollars
    );
}

#[test]
fn scenario_6_additive_credits_cap_at_higher_threshold_not_sum() {
    let raw_rules = vec![
        BillCreditRule { credit_dollars: 35.0, threshold_kwh: 1000.0, months_of_year: None, credit_type: CreditType::ThresholdMin },
        BillCreditRule { credit_dollars: 15.0, threshold_kwh: 2000.0, months_of_year: None, credit_type: CreditType::ThresholdMin },
    ];
    let segments = efl_engine::credits_math::normalize_threshold_min_rules_to_segments(&raw_rules);
    assert_eq!(
        segments,
        vec![
            BillCreditSegment { credit_amount_cents: 3500.0, min_usage_kwh: Some(1000.0), max_usage_kwh: Some(2000.0), label: "threshold >= 1000 kWh".into() },
            BillCreditSegment { credit_amount_cents: 5000.0, min_usage_kwh: Some(2000.0), max_usage_kwh: None, label: "threshold >= 2000 kWh".into() },
        ]
    );

    let mut structure = RateStructure::empty(RateType::Fixed);
    structure.energy_rate_cents = Some(10.0);
    structure.bill_credits = BillCredits { has_bill_credit: true, rules: segments };

    let mut by_year_month = BTreeMap::new();
    let mut bucket = BTreeMap::new();
    bucket.insert(BUCKET_KEY_ALL_TOTAL.to_string(), 2500.0);
    by_year_month.insert("2025-01".to_string(), bucket);
    for m in 2..=12u8 {
        let mut bucket = BTreeMap::new();
        bucket.insert(BUCKET_KEY_ALL_TOTAL.to_string(), 2500.0);
        by_year_month.insert(format!("2025-{m:02}"), bucket);
    }
    let buckets = MonthlyUsageBuckets { by_year_month };

    let estimate = estimator::estimate(&EstimatorInputs {
        annual_kwh: 30000.0,
        months_count: 12,
        tdsp_rates: flat_tdsp(0.0, 0.0),
        rate_structure: &structure,
        usage_buckets_by_month: &buckets,
        estimate_mode: EstimateMode::Default,
        efl_disclosed_1000kwh_cents_per_kwh: None,
    });

    assert_eq!(estimate.status, EstimateStatus::Ok);
    assert!((estimate.components.credits_dollars - 600.0).abs() < 0.01, "{}", estimate.components.credits_dollars);
}
