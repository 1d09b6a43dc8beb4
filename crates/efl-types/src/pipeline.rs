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

//! Per-home pipeline job snapshot (spec §3, §4.10, §5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineJobStatus {
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineReason {
    MonthlyRefresh,
    PlansFallback,
    DashboardBootstrap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineJobCounts {
    pub offers_considered: u32,
    pub templates_mapped: u32,
    pub estimates_computed: u32,
    pub estimates_already_cached: u32,
    pub quarantined: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineJob {
    pub home_id: String,
    pub run_id: String,
    pub status: PipelineJobStatus,
    pub reason: PipelineReason,
    pub calc_version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub last_calc_window_end: Option<DateTime<Utc>>,
    pub counts: PipelineJobCounts,
    pub last_error: Option<String>,
}

impl PipelineJob {
    /// Spec §5: a job `RUNNING` longer than `maxRunningMinutes` is stale and may be superseded.
    pub fn is_stale(&self, now: DateTime<Utc>, max_running_minutes: i64) -> bool {
        self.status == PipelineJobStatus::Running
            && now.signed_duration_since(self.started_at).num_minutes() > max_running_minutes
    }

    /// Spec §5: cooldown gates rapid re-trigger for every reason.
    pub fn is_in_cooldown(&self, now: DateTime<Utc>) -> bool {
        matches!(self.cooldown_until, Some(until) if now < until)
    }
}
