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

//! Admin review queue (spec §3, §4.11): idempotent upserts keyed `(kind, dedupeKey)`, with
//! auto-resolution recorded by `resolve`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use efl_types::{QueueReason, Result, ReviewFinalStatus, ReviewQueueItem, ReviewQueueKind};
use rusqlite::OptionalExtension;

use crate::db::{Database, cache_err};

pub struct ReviewQueueRepo {
    db: Arc<Database>,
}

impl ReviewQueueRepo {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn upsert(&self, item: &ReviewQueueItem) -> Result<()> {
        let queue_reason_json = serde_json::to_string(&item.queue_reason)?;
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO review_queue (kind, dedupe_key, final_status, offer_id, rate_plan_id,
                queue_reason_json, resolved_at, resolved_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(kind, dedupe_key) DO UPDATE SET
                final_status = excluded.final_status,
                offer_id = excluded.offer_id,
                rate_plan_id = excluded.rate_plan_id,
                queue_reason_json = excluded.queue_reason_json,
                resolved_at = excluded.resolved_at,
                resolved_by = excluded.resolved_by",
            rusqlite::params![
                kind_str(item.kind),
                item.dedupe_key,
                final_status_str(item.final_status),
                item.offer_id,
                item.rate_plan_id,
                queue_reason_json,
                item.resolved_at.map(|t| t.to_rfc3339()),
                item.resolved_by,
            ],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn get(&self, kind: ReviewQueueKind, dedupe_key: &str) -> Result<Option<ReviewQueueItem>> {
        let conn = self.db.conn.lock().unwrap();
        conn.query_row(
            "SELECT kind, dedupe_key, final_status, offer_id, rate_plan_id, queue_reason_json,
                resolved_at, resolved_by
             FROM review_queue WHERE kind = ?1 AND dedupe_key = ?2",
            rusqlite::params![kind_str(kind), dedupe_key],
            row_to_item,
        )
        .optional()
        .map_err(cache_err)
    }

    /// Spec §4.11: an item auto-resolves once a subsequent run produces an OK/APPROXIMATE
    /// estimate for the same offer/rate plan.
    pub fn resolve(&self, kind: ReviewQueueKind, dedupe_key: &str, resolved_by: &str) -> Result<()> {
        let conn = self.db.conn.lock().unwrap();
        conn.execute(
            "UPDATE review_queue SET resolved_at = ?1, resolved_by = ?2
             WHERE kind = ?3 AND dedupe_key = ?4",
            rusqlite::params![Utc::now().to_rfc3339(), resolved_by, kind_str(kind), dedupe_key],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    pub fn list_unresolved(&self) -> Result<Vec<ReviewQueueItem>> {
        let conn = self.db.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT kind, dedupe_key, final_status, offer_id, rate_plan_id, queue_reason_json,
                    resolved_at, resolved_by
                 FROM review_queue WHERE resolved_at IS NULL",
            )
            .map_err(cache_err)?;
        stmt.query_map([], row_to_item)
            .map_err(cache_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(cache_err)
    }
}

fn kind_str(kind: ReviewQueueKind) -> &'static str {
    match kind {
        ReviewQueueKind::EflParse => "EFL_PARSE",
        ReviewQueueKind::PlanCalcQuarantine => "PLAN_CALC_QUARANTINE",
    }
}

fn parse_kind(s: &str) -> Option<ReviewQueueKind> {
    match s {
        "EFL_PARSE" => Some(ReviewQueueKind::EflParse),
        "PLAN_CALC_QUARANTINE" => Some(ReviewQueueKind::PlanCalcQuarantine),
        _ => None,
    }
}

fn final_status_str(status: ReviewFinalStatus) -> &'static str {
    match status {
        ReviewFinalStatus::NeedsReview => "NEEDS_REVIEW",
        ReviewFinalStatus::Open => "OPEN",
        ReviewFinalStatus::Fail => "FAIL",
    }
}

fn parse_final_status(s: &str) -> Option<ReviewFinalStatus> {
    match s {
        "NEEDS_REVIEW" => Some(ReviewFinalStatus::NeedsReview),
        "OPEN" => Some(ReviewFinalStatus::Open),
        "FAIL" => Some(ReviewFinalStatus::Fail),
        _ => None,
    }
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ReviewQueueItem> {
    let kind_raw: String = row.get(0)?;
    let kind = parse_kind(&kind_raw)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(0, kind_raw.clone(), rusqlite::types::Type::Text))?;
    let final_status_raw: String = row.get(2)?;
    let final_status = parse_final_status(&final_status_raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(2, final_status_raw.clone(), rusqlite::types::Type::Text)
    })?;
    let queue_reason_json: String = row.get(5)?;
    let queue_reason: QueueReason = serde_json::from_str(&queue_reason_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;
    let resolved_at_raw: Option<String> = row.get(6)?;
    let resolved_at = resolved_at_raw
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(ReviewQueueItem {
        kind,
        dedupe_key: row.get(1)?,
        final_status,
        offer_id: row.get(3)?,
        rate_plan_id: row.get(4)?,
        queue_reason,
        resolved_at,
        resolved_by: row.get(7)?,
    })
}
