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

//! Error taxonomy for the pricing engine, by surface (spec §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("normalization failed: {0}")]
    Normalize(String),

    #[error("AI draft transport error: {0}")]
    AiTransport(String),

    #[error("extractor error: {0}")]
    Extract(String),

    #[error("validation error: {0}")]
    Validate(String),

    #[error("solver error: {0}")]
    Solve(String),

    #[error("computability analysis error: {0}")]
    Computability(String),

    #[error("estimate error: {0}")]
    Estimate(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("offers fetch failed: {0}")]
    OffersFetch(String),

    #[error("missing address fields: {0}")]
    MissingAddress(String),

    #[error("no usage data yet for home")]
    NoUsageYet,
}
