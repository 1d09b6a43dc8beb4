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

//! Admin review queue auto-resolve/auto-enqueue policy (spec §4.11), layered over
//! `ReviewQueueRepo`'s idempotent upsert/resolve mechanics.

use efl_types::{Computability, EstimateStatus, QueueReason, Result, ReviewFinalStatus, ReviewQueueItem, ReviewQueueKind};
use efl_store::ReviewQueueRepo;

const RESOLVED_BY: &str = "orchestrator";

/// Spec §4.11: "Auto-resolve: when a subsequent run produces an OK/APPROXIMATE estimate for the
/// mapped template, set resolvedAt/resolvedBy without deletion."
pub fn auto_resolve_quarantine(repo: &ReviewQueueRepo, offer_id: &str, estimate_status: EstimateStatus) -> Result<()> {
    if !matches!(estimate_status, EstimateStatus::Ok | EstimateStatus::Approximate) {
        return Ok(());
    }
    if let Some(existing) = repo.get(ReviewQueueKind::PlanCalcQuarantine, offer_id)?
        && !existing.is_resolved()
    {
        repo.resolve(ReviewQueueKind::PlanCalcQuarantine, offer_id, RESOLVED_BY)?;
    }
    Ok(())
}

/// Spec §7: "Quarantine-worthy reasons are structurally defective templates ... Bucket
/// availability issues and transient input gaps are not quarantine-worthy; the orchestrator
/// simply skips."
pub fn auto_enqueue_quarantine(
    repo: &ReviewQueueRepo,
    offer_id: &str,
    rate_plan_id: &str,
    computability: &Computability,
) -> Result<()> {
    if !computability.is_quarantine_worthy() {
        return Ok(());
    }
    let reason_code = computability.reason_code.expect("quarantine_worthy implies Some");
    repo.upsert(&ReviewQueueItem {
        kind: ReviewQueueKind::PlanCalcQuarantine,
        dedupe_key: offer_id.to_string(),
        final_status: ReviewFinalStatus::Open,
        offer_id: Some(offer_id.to_string()),
        rate_plan_id: Some(rate_plan_id.to_string()),
        queue_reason: QueueReason {
            code: format!("{reason_code:?}"),
            message: format!("computability analysis returned {reason_code:?}"),
        },
        resolved_at: None,
        resolved_by: None,
    })
}

/// Spec §4.10 step 3 / §4.11: enqueue an `EFL_PARSE` review when template mapping doesn't reach
/// a clean PASS+STRONG+identity result.
pub fn enqueue_efl_parse_review(
    repo: &ReviewQueueRepo,
    offer_id: &str,
    efl_sha256: &str,
    code: &str,
    message: impl Into<String>,
) -> Result<()> {
    let dedupe_key = if offer_id.is_empty() { efl_sha256.to_string() } else { offer_id.to_string() };
    repo.upsert(&ReviewQueueItem {
        kind: ReviewQueueKind::EflParse,
        dedupe_key,
        final_status: ReviewFinalStatus::NeedsReview,
        offer_id: Some(offer_id.to_string()),
        rate_plan_id: None,
        queue_reason: QueueReason { code: code.to_string(), message: message.into() },
        resolved_at: None,
        resolved_by: None,
    })
}
