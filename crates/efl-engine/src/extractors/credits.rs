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

//! Additive threshold usage credit extraction (spec §4.3, §4.5 step 8, §8).

use once_cell::sync::Lazy;
use regex::Regex;

static RESIDENTIAL_CREDIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Residential\s*Usage\s*Credit\s*\$([\d.]+).*?usage\s*>=\s*(\d+)\s*kWh").unwrap()
});

static ADDITIONAL_CREDIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Additional.*?\$([\d.]+).*?>=\s*(\d+)\s*kWh").unwrap()
});

/// One raw additive credit event as disclosed in the EFL text; the solver normalizes a set of
/// these into non-overlapping persisted segments (spec §4.5 step 8) while keeping the raw
/// events for validator math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCreditEvent {
    pub credit_dollars: f64,
    pub threshold_kwh: f64,
}

pub fn extract_threshold_credits(text: &str) -> Vec<ThresholdCreditEvent> {
    let mut events = Vec::new();

    if let Some(caps) = RESIDENTIAL_CREDIT.captures(text) {
        if let (Ok(dollars), Ok(threshold)) = (caps[1].parse(), caps[2].parse()) {
            events.push(ThresholdCreditEvent { credit_dollars: dollars, threshold_kwh: threshold });
        }
    }

    if let Some(caps) = ADDITIONAL_CREDIT.captures(text) {
        if let (Ok(dollars), Ok(threshold)) = (caps[1].parse(), caps[2].parse()) {
            events.push(ThresholdCreditEvent { credit_dollars: dollars, threshold_kwh: threshold });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_both_events() {
        let text = "Residential Usage Credit $35.00 Applies when usage >= 1000 kWh\nAdditional Usage Credit $15.00 Applies when usage >= 2000 kWh";
        let events = extract_threshold_credits(text);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].credit_dollars, 35.0);
        assert_eq!(events[0].threshold_kwh, 1000.0);
        assert_eq!(events[1].credit_dollars, 15.0);
        assert_eq!(events[1].threshold_kwh, 2000.0);
    }
}
