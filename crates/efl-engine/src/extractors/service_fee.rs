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

//! Service-fee cutoff extraction (spec §4.3).

use once_cell::sync::Lazy;
use regex::Regex;

static MONTHLY_SERVICE_FEE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Monthly\s*Service\s*Fee\s*\$([\d.]+).*?\(\s*<=\s*(\d+)\s*\)\s*kWh").unwrap()
});

static USAGE_CHARGE_CUTOFF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Usage\s*Charge\s*\$([\d.]+).*?<\s*(\d+)\s*kWh").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceFeeCutoff {
    pub fee_cents: f64,
    pub cutoff_kwh: f64,
}

pub fn extract_service_fee_cutoff(text: &str) -> Option<ServiceFeeCutoff> {
    for line in text.lines() {
        if let Some(caps) = MONTHLY_SERVICE_FEE.captures(line) {
            let dollars: f64 = caps[1].parse().ok()?;
            let cutoff: f64 = caps[2].parse().ok()?;
            return Some(ServiceFeeCutoff { fee_cents: dollars * 100.0, cutoff_kwh: cutoff });
        }
        if let Some(caps) = USAGE_CHARGE_CUTOFF.captures(line) {
            let dollars: f64 = caps[1].parse().ok()?;
            let cutoff: f64 = caps[2].parse().ok()?;
            return Some(ServiceFeeCutoff { fee_cents: dollars * 100.0, cutoff_kwh: cutoff - 1.0 });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_service_fee_form() {
        let text = "Monthly Service Fee $8.00 applies for usage (<=1999) kWh";
        let cutoff = extract_service_fee_cutoff(text).unwrap();
        assert_eq!(cutoff.fee_cents, 800.0);
        assert_eq!(cutoff.cutoff_kwh, 1999.0);
    }

    #[test]
    fn test_usage_charge_form() {
        let text = "Usage Charge $8.00 applies for < 2000 kWh";
        let cutoff = extract_service_fee_cutoff(text).unwrap();
        assert_eq!(cutoff.cutoff_kwh, 1999.0);
    }
}
