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

//! Admin review queue item (spec §3, §4.11).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::QueueReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewQueueKind {
    EflParse,
    PlanCalcQuarantine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewFinalStatus {
    NeedsReview,
    Open,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueueItem {
    pub kind: ReviewQueueKind,
    pub dedupe_key: String,
    pub final_status: ReviewFinalStatus,
    pub offer_id: Option<String>,
    pub rate_plan_id: Option<String>,
    pub queue_reason: QueueReason,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl ReviewQueueItem {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}
