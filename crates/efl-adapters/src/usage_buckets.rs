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

//! Usage bucket retrieval (spec §6): `buildBuckets({homeId, source, windowEnd, cutoff,
//! requiredBucketKeys, monthsCount=12}) -> {yearMonths[], usageBucketsByMonth, annualKwh}`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use efl_types::{MonthlyUsageBuckets, Result};

#[derive(Debug, Clone)]
pub struct BuildBucketsRequest {
    pub home_id: String,
    pub source: String,
    pub window_end: NaiveDate,
    pub cutoff: Option<NaiveDate>,
    pub required_bucket_keys: Vec<String>,
    pub months_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct BuildBucketsResult {
    pub year_months: Vec<String>,
    pub usage_buckets_by_month: MonthlyUsageBuckets,
    pub annual_kwh: f64,
}

#[async_trait]
pub trait UsageBucketsProvider: Send + Sync {
    async fn build_buckets(&self, request: &BuildBucketsRequest) -> Result<BuildBucketsResult>;
}

/// In-memory per-home usage table, used by tests and the orchestrator's dev profile; a real
/// implementation stitches together smart-meter or utility-portal readings.
#[derive(Debug, Default)]
pub struct StaticUsageBucketsProvider {
    pub by_home_id: BTreeMap<String, MonthlyUsageBuckets>,
}

impl StaticUsageBucketsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, home_id: impl Into<String>, buckets: MonthlyUsageBuckets) {
        self.by_home_id.insert(home_id.into(), buckets);
    }
}

#[async_trait]
impl UsageBucketsProvider for StaticUsageBucketsProvider {
    async fn build_buckets(&self, request: &BuildBucketsRequest) -> Result<BuildBucketsResult> {
        let Some(buckets) = self.by_home_id.get(&request.home_id) else {
            return Ok(BuildBucketsResult::default());
        };

        let mut year_months = buckets.year_months();
        year_months.sort();
        year_months.truncate(request.months_count as usize);

        let annual_kwh = year_months
            .iter()
            .filter_map(|ym| buckets.get(ym, efl_types::BUCKET_KEY_ALL_TOTAL))
            .sum();

        Ok(BuildBucketsResult { year_months, usage_buckets_by_month: buckets.clone(), annual_kwh })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_buckets() -> MonthlyUsageBuckets {
        let mut by_year_month = BTreeMap::new();
        for m in 1..=12u8 {
            let mut bucket = BTreeMap::new();
            bucket.insert(efl_types::BUCKET_KEY_ALL_TOTAL.to_string(), 1000.0);
            by_year_month.insert(format!("2025-{m:02}"), bucket);
        }
        MonthlyUsageBuckets { by_year_month }
    }

    #[tokio::test]
    async fn test_builds_requested_months_and_annual_kwh() {
        let mut provider = StaticUsageBucketsProvider::new();
        provider.insert("home-1", sample_buckets());

        let request = BuildBucketsRequest {
            home_id: "home-1".into(),
            source: "smart_meter".into(),
            window_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            cutoff: None,
            required_bucket_keys: vec![efl_types::BUCKET_KEY_ALL_TOTAL.to_string()],
            months_count: 12,
        };
        let result = provider.build_buckets(&request).await.unwrap();
        assert_eq!(result.year_months.len(), 12);
        assert_eq!(result.annual_kwh, 12000.0);
    }

    #[tokio::test]
    async fn test_unknown_home_returns_empty_result() {
        let provider = StaticUsageBucketsProvider::new();
        let request = BuildBucketsRequest {
            home_id: "home-missing".into(),
            source: "smart_meter".into(),
            window_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            cutoff: None,
            required_bucket_keys: vec![],
            months_count: 12,
        };
        let result = provider.build_buckets(&request).await.unwrap();
        assert!(result.year_months.is_empty());
        assert_eq!(result.annual_kwh, 0.0);
    }
}
