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

//! Per-home pipeline job snapshots (spec §3, §4.10, §5): staleness, cooldown, and last-error
//! bookkeeping the orchestrator reads before triggering a new run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{PipelineJob, PipelineJobCounts, PipelineJobStatus, PipelineReason, Result};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct PipelineJobRepo {
    db: Arc<Database>,
}

impl PipelineJobRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, job: &PipelineJob) -> Result<()> {
        let counts_json = serde_json::to_string(&job.counts)?;
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO pipeline_jobs (home_id, run_id, status, reason, calc_version,
                started_at, finished_at, cooldown_until, last_calc_window_end, counts_json, last_error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(home_id, run_id) DO UPDATE SET
                status = excluded.status,
                finished_at = excluded.finished_at,
                cooldown_until = excluded.cooldown_until,
                last_calc_window_end = excluded.last_calc_window_end,
                counts_json = excluded.counts_json,
                last_error = excluded.last_error",
            rusqlite::params![
                job.home_id,
                job.run_id,
                status_str(job.status),
                reason_str(job.reason),
                job.calc_version,
                job.started_at.to_rfc3339(),
                job.finished_at.map(|t| t.to_rfc3339()),
                job.cooldown_until.map(|t| t.to_rfc3339()),
                job.last_calc_window_end.map(|t| t.to_rfc3339()),
                counts_json,
                job.last_error,
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    /// The most recently started job for a home, used for staleness/cooldown checks (spec §5).
    pub fn latest_for_home(&self, home_id: &str) -> Result<Option<PipelineJob>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT home_id, run_id, status, reason, calc_version, started_at, finished_at,
                cooldown_until, last_calc_window_end, counts_json, last_error
             FROM pipeline_jobs WHERE home_id = ?1 ORDER BY started_at DESC LIMIT 1",
            [home_id],
            row_to_job,
        )
        .optional()
        .map_err(cache_err)
    }
}

fn status_str(status: PipelineJobStatus) -> &'static str {
    match status {
        PipelineJobStatus::Running => "RUNNING",
        PipelineJobStatus::Done => "DONE",
        PipelineJobStatus::Error => "ERROR",
    }
}

fn reason_str(reason: PipelineReason) -> &'static str {
    match reason {
        PipelineReason::MonthlyRefresh => "monthly_refresh",
        PipelineReason::PlansFallback => "plans_fallback",
        PipelineReason::DashboardBootstrap => "dashboard_bootstrap",
    }
}

fn parse_status(s: &str) -> Option<PipelineJobStatus> {
    match s {
        "RUNNING" => Some(PipelineJobStatus::Running),
        "DONE" => Some(PipelineJobStatus::Done),
        "ERROR" => Some(PipelineJobStatus::Error),
        _ => None,
    }
}

fn parse_reason(s: &str) -> Option<PipelineReason> {
    match s {
        "monthly_refresh" => Some(PipelineReason::MonthlyRefresh),
        "plans_fallback" => Some(PipelineReason::PlansFallback),
        "dashboard_bootstrap" => Some(PipelineReason::DashboardBootstrap),
        _ => None,
    }
}

fn parse_timestamp(col: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e)))
}

fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<PipelineJob> {
    let status_raw: String = row.get(2)?;
    let status = parse_status(&status_raw)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(2, status_raw.clone(), rusqlite::types::Type::Text))?;
    let reason_raw: String = row.get(3)?;
    let reason = parse_reason(&reason_raw)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(3, reason_raw.clone(), rusqlite::types::Type::Text))?;
    let started_at_raw: String = row.get(5)?;
    let started_at = parse_timestamp(5, &started_at_raw)?;
    let finished_at_raw: Option<String> = row.get(6)?;
    let finished_at = finished_at_raw.map(|r| parse_timestamp(6, &r)).transpose()?;
    let cooldown_until_raw: Option<String> = row.get(7)?;
    let cooldown_until = cooldown_until_raw.map(|r| parse_timestamp(7, &r)).transpose()?;
    let last_calc_window_end_raw: Option<String> = row.get(8)?;
    let last_calc_window_end = last_calc_window_end_raw.map(|r| parse_timestamp(8, &r)).transpose()?;
    let counts_json: String = row.get(9)?;
    let counts: PipelineJobCounts = serde_json::from_str(&counts_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(PipelineJob {
        home_id: row.get(0)?,
        run_id: row.get(1)?,
        status,
        reason,
        calc_version: row.get(4)?,
        started_at,
        finished_at,
        cooldown_until,
        last_calc_window_end,
        counts,
        last_error: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PipelineJob {
        PipelineJob {
            home_id: "home-1".into(),
            run_id: "run-1".into(),
            status: PipelineJobStatus::Running,
            reason: PipelineReason::MonthlyRefresh,
            calc_version: "v1".into(),
            started_at: Utc::now(),
            finished_at: None,
            cooldown_until: None,
            last_calc_window_end: None,
            counts: PipelineJobCounts::default(),
            last_error: None,
        }
    }

    #[test]
    fn test_upsert_and_latest_for_home_round_trips() {
        let repo = PipelineJobRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let fetched = repo.latest_for_home("home-1").unwrap().unwrap();
        assert_eq!(fetched.status, PipelineJobStatus::Running);
    }

    #[test]
    fn test_transition_to_done_updates_status() {
        let repo = PipelineJobRepo::new(Arc::new(Database::open_in_memory().unwrap()));
        repo.upsert(&sample()).unwrap();
        let mut done = sample();
        done.status = PipelineJobStatus::Done;
        done.finished_at = Some(Utc::now());
        repo.upsert(&done).unwrap();

        let fetched = repo.latest_for_home("home-1").unwrap().unwrap();
        assert_eq!(fetched.status, PipelineJobStatus::Done);
        assert!(fetched.finished_at.is_some());
    }
}
