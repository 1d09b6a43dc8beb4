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

//! Engine configuration, loaded from a JSON file with atomic writes.
//!
//! Grounded on `fluxion-upgrader::config`: `#[serde(default = "...")]` per field,
//! a `load`/`save` pair that writes to a `.tmp` path and renames over the target.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};

fn default_tolerance_cents_per_kwh() -> f64 {
    0.25
}

fn default_weak_tolerance_cents_per_kwh() -> f64 {
    1.0
}

fn default_time_budget_ms() -> u64 {
    12_000
}

fn default_max_template_offers() -> usize {
    25
}

fn default_max_estimate_plans() -> usize {
    50
}

fn default_monthly_cadence_days() -> i64 {
    30
}

fn default_max_running_minutes() -> i64 {
    3
}

fn default_fanout_limit() -> usize {
    4
}

fn default_efl_fetch_timeout_secs() -> u64 {
    20
}

fn default_offers_live_timeout_secs() -> u64 {
    12
}

fn default_offers_cache_ttl_secs() -> u64 {
    900
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_engine_version() -> String {
    "1".to_string()
}

/// Time-budget clamp bounds from spec §5: `timeBudgetMs` is capped to `[1500, 25000]`.
pub const TIME_BUDGET_MS_MIN: u64 = 1_500;
pub const TIME_BUDGET_MS_MAX: u64 = 25_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_tolerance_cents_per_kwh")]
    pub tolerance_cents_per_kwh: f64,

    #[serde(default = "default_weak_tolerance_cents_per_kwh")]
    pub weak_tolerance_cents_per_kwh: f64,

    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,

    #[serde(default = "default_max_template_offers")]
    pub max_template_offers: usize,

    #[serde(default = "default_max_estimate_plans")]
    pub max_estimate_plans: usize,

    #[serde(default = "default_monthly_cadence_days")]
    pub monthly_cadence_days: i64,

    #[serde(default = "default_max_running_minutes")]
    pub max_running_minutes: i64,

    #[serde(default = "default_fanout_limit")]
    pub fanout_limit: usize,

    #[serde(default = "default_efl_fetch_timeout_secs")]
    pub efl_fetch_timeout_secs: u64,

    #[serde(default = "default_offers_live_timeout_secs")]
    pub offers_live_timeout_secs: u64,

    #[serde(default = "default_offers_cache_ttl_secs")]
    pub offers_cache_ttl_secs: u64,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_engine_version")]
    pub engine_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance_cents_per_kwh: default_tolerance_cents_per_kwh(),
            weak_tolerance_cents_per_kwh: default_weak_tolerance_cents_per_kwh(),
            time_budget_ms: default_time_budget_ms(),
            max_template_offers: default_max_template_offers(),
            max_estimate_plans: default_max_estimate_plans(),
            monthly_cadence_days: default_monthly_cadence_days(),
            max_running_minutes: default_max_running_minutes(),
            fanout_limit: default_fanout_limit(),
            efl_fetch_timeout_secs: default_efl_fetch_timeout_secs(),
            offers_live_timeout_secs: default_offers_live_timeout_secs(),
            offers_cache_ttl_secs: default_offers_cache_ttl_secs(),
            timezone: default_timezone(),
            engine_version: default_engine_version(),
        }
    }
}

impl EngineConfig {
    /// Clamp `time_budget_ms` into the contractual `[1500, 25000]` range.
    pub fn clamped_time_budget_ms(&self) -> u64 {
        self.time_budget_ms.clamp(TIME_BUDGET_MS_MIN, TIME_BUDGET_MS_MAX)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| EngineError::Config(format!("failed to parse config: {e}")))
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let temp_path = path.with_extension("tmp");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerance_cents_per_kwh, 0.25);
        assert_eq!(config.weak_tolerance_cents_per_kwh, 1.0);
        assert_eq!(config.timezone, "America/Chicago");
    }

    #[test]
    fn test_time_budget_clamp() {
        let mut config = EngineConfig::default();
        config.time_budget_ms = 100;
        assert_eq!(config.clamped_time_budget_ms(), TIME_BUDGET_MS_MIN);
        config.time_budget_ms = 99_999;
        assert_eq!(config.clamped_time_budget_ms(), TIME_BUDGET_MS_MAX);
    }

    #[test]
    fn test_config_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path();

        let mut config = EngineConfig::default();
        config.max_template_offers = 7;
        config.save(path).unwrap();

        let loaded = EngineConfig::load(path).unwrap();
        assert_eq!(loaded.max_template_offers, 7);
    }
}
