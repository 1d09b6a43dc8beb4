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

//! Per-home gating policy (spec §5): at most one `RUNNING` job per home, cooldown, and
//! `monthlyCadenceDays` (which applies only to `monthly_refresh`).

use chrono::{DateTime, Utc};
use efl_types::{EngineConfig, PipelineJob, PipelineJobStatus, PipelineReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    SkipAlreadyRunning,
    SkipCooldown,
    SkipCadenceNotDue,
}

/// Spec §5: "per-home jobs are serialized — at most one job per homeId may be RUNNING at a
/// time", "A job whose snapshot has been RUNNING longer than maxRunningMinutes ... is treated as
/// stale and may be superseded", "monthlyCadenceDays applies only to monthly_refresh", "All
/// reasons honor cooldownUntil for rapid re-trigger".
pub fn gate(
    prior: Option<&PipelineJob>,
    reason: PipelineReason,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> GateDecision {
    let Some(job) = prior else { return GateDecision::Proceed };

    if job.status == PipelineJobStatus::Running && !job.is_stale(now, config.max_running_minutes) {
        return GateDecision::SkipAlreadyRunning;
    }

    if job.is_in_cooldown(now) {
        return GateDecision::SkipCooldown;
    }

    if reason == PipelineReason::MonthlyRefresh
        && let Some(last_end) = job.last_calc_window_end
        && now.signed_duration_since(last_end).num_days() < config.monthly_cadence_days
    {
        return GateDecision::SkipCadenceNotDue;
    }

    GateDecision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use efl_types::PipelineJobCounts;

    fn base_job(status: PipelineJobStatus, started_at: DateTime<Utc>) -> PipelineJob {
        PipelineJob {
            home_id: "home-1".to_string(),
            run_id: "run-1".to_string(),
            status,
            reason: PipelineReason::MonthlyRefresh,
            calc_version: "1".to_string(),
            started_at,
            finished_at: None,
            cooldown_until: None,
            last_calc_window_end: None,
            counts: PipelineJobCounts::default(),
            last_error: None,
        }
    }

    #[test]
    fn test_no_prior_job_proceeds() {
        let config = EngineConfig::default();
        let decision = gate(None, PipelineReason::DashboardBootstrap, Utc::now(), &config);
        assert_eq!(decision, GateDecision::Proceed);
    }

    #[test]
    fn test_running_job_blocks_unless_stale() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let fresh = base_job(PipelineJobStatus::Running, now);
        assert_eq!(gate(Some(&fresh), PipelineReason::PlansFallback, now, &config), GateDecision::SkipAlreadyRunning);

        let stale = base_job(PipelineJobStatus::Running, now - Duration::minutes(10));
        assert_eq!(gate(Some(&stale), PipelineReason::PlansFallback, now, &config), GateDecision::Proceed);
    }

    #[test]
    fn test_cooldown_blocks_retrigger() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let mut job = base_job(PipelineJobStatus::Done, now - Duration::minutes(5));
        job.cooldown_until = Some(now + Duration::minutes(1));
        assert_eq!(gate(Some(&job), PipelineReason::PlansFallback, now, &config), GateDecision::SkipCooldown);
    }

    #[test]
    fn test_monthly_cadence_only_gates_monthly_refresh() {
        let config = EngineConfig::default();
        let now = Utc::now();
        let mut job = base_job(PipelineJobStatus::Done, now - Duration::days(1));
        job.last_calc_window_end = Some(now - Duration::days(1));

        assert_eq!(gate(Some(&job), PipelineReason::MonthlyRefresh, now, &config), GateDecision::SkipCadenceNotDue);
        assert_eq!(gate(Some(&job), PipelineReason::DashboardBootstrap, now, &config), GateDecision::Proceed);
    }
}
