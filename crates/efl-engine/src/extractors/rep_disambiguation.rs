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

//! REP-vs-TDSP energy rate disambiguation (spec §4.3).

use once_cell::sync::Lazy;
use regex::Regex;

static ENERGY_CHARGE_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Energy\s*Charge\D{0,20}?([\d.]+)\s*\u{a2}").unwrap()
});

const TDSP_LINE_MARKERS: &[&str] = &["Delivery", "TDSP", "TDU"];
const TDSP_MATCH_TOLERANCE_CENTS: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
struct EnergyChargeCandidate {
    rate_cents_per_kwh: f64,
    on_tdsp_line: bool,
}

fn candidates(text: &str) -> Vec<EnergyChargeCandidate> {
    text.lines()
        .filter_map(|line| {
            let caps = ENERGY_CHARGE_RATE.captures(line)?;
            let rate: f64 = caps[1].parse().ok()?;
            let on_tdsp_line = TDSP_LINE_MARKERS.iter().any(|m| line.contains(m));
            Some(EnergyChargeCandidate { rate_cents_per_kwh: rate, on_tdsp_line })
        })
        .collect()
}

/// Disambiguates the REP energy rate from candidate "Energy Charge" tokens, rejecting anything
/// that looks like the TDSP delivery passthrough: on a Delivery/TDSP/TDU line, or within
/// ±0.02¢ of the known delivery rate. When more than one candidate survives, the larger wins
/// (spec §4.3: "prefer the non-TDSP candidate, else the larger").
pub fn disambiguate_rep_energy_rate(text: &str, tdsp_delivery_rate_cents: Option<f64>) -> Option<f64> {
    let matches_tdsp_rate = |rate: f64| {
        tdsp_delivery_rate_cents
            .map(|tdsp| (rate - tdsp).abs() <= TDSP_MATCH_TOLERANCE_CENTS)
            .unwrap_or(false)
    };

    let survivors: Vec<f64> = candidates(text)
        .into_iter()
        .filter(|c| !c.on_tdsp_line && !matches_tdsp_rate(c.rate_cents_per_kwh))
        .map(|c| c.rate_cents_per_kwh)
        .collect();

    survivors.into_iter().fold(None, |acc, rate| match acc {
        None => Some(rate),
        Some(best) => Some(best.max(rate)),
    })
}
