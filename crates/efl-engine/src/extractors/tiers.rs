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

//! Usage tier extraction (spec §4.3).
//!
//! Recognizes bracketed and line-based tier disclosures. Contiguity (first tier at 0, adjacent
//! tiers sharing a boundary, at most one open-ended tier) is NOT enforced here — that is the
//! gap solver's job (spec §4.5 step 1-2) — extractors only surface raw candidates.

use once_cell::sync::Lazy;
use regex::Regex;

use efl_types::UsageTier;

static BRACKETED_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((\d+)\s*to\s*(\d+)\s*kWh\)\s*([\d.]+)\s*¢").unwrap()
});

static DASH_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*[\x{2013}\x{2014}-]\s*(\d+)\s*kWh\s+([\d.]+)\s*¢").unwrap()
});

static OPEN_ENDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r">\s*(\d+)\s*kWh\s+([\d.]+)\s*¢").unwrap()
});

/// Extract every tier-shaped line in the raw EFL text, in document order.
pub fn extract_usage_tiers(text: &str) -> Vec<UsageTier> {
    let mut tiers = Vec::new();

    for line in text.lines() {
        if let Some(caps) = BRACKETED_RANGE.captures(line) {
            let min_kwh: f64 = caps[1].parse().unwrap_or(0.0);
            let max_kwh: f64 = caps[2].parse().unwrap_or(0.0);
            let rate: f64 = caps[3].parse().unwrap_or(0.0);
            tiers.push(UsageTier { min_kwh, max_kwh: Some(max_kwh), rate_cents_per_kwh: rate });
            continue;
        }
        if let Some(caps) = DASH_RANGE.captures(line) {
            let min_kwh: f64 = caps[1].parse().unwrap_or(0.0);
            let max_kwh: f64 = caps[2].parse().unwrap_or(0.0);
            let rate: f64 = caps[3].parse().unwrap_or(0.0);
            tiers.push(UsageTier { min_kwh, max_kwh: Some(max_kwh), rate_cents_per_kwh: rate });
            continue;
        }
        if let Some(caps) = OPEN_ENDED.captures(line) {
            // spec §8: "> N kWh X¢" is modeled as [N+1, inf) — the solver re-derives this from
            // the raw `N`, but extractors surface the disclosed boundary directly as min_kwh =
            // N + 1 so downstream contiguity checks see the modeled boundary.
            let n: f64 = caps[1].parse().unwrap_or(0.0);
            let rate: f64 = caps[2].parse().unwrap_or(0.0);
            tiers.push(UsageTier { min_kwh: n + 1.0, max_kwh: None, rate_cents_per_kwh: rate });
        }
    }

    tiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_form() {
        let text = "(0 to 1000 kWh) 10.9852¢ per kWh";
        let tiers = extract_usage_tiers(text);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].min_kwh, 0.0);
        assert_eq!(tiers[0].max_kwh, Some(1000.0));
    }

    #[test]
    fn test_dash_range_form() {
        let text = "0 \u{2013} 1000 kWh 10.9852\u{a2}";
        let tiers = extract_usage_tiers(text);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].rate_cents_per_kwh, 10.9852);
    }

    #[test]
    fn test_open_ended_boundary() {
        let text = "> 1200 kWh 12.5\u{a2}";
        let tiers = extract_usage_tiers(text);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].min_kwh, 1201.0);
        assert_eq!(tiers[0].max_kwh, None);
    }
}
