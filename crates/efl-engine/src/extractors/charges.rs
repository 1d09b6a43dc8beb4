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

//! Base/daily charge extraction (spec §4.3).

use once_cell::sync::Lazy;
use regex::Regex;

static PER_CYCLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$([\d.]+)\s*per\s*(?:billing cycle|month)").unwrap()
});

static PER_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\$([\d.]+)\s*per\s*day").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaseCharge {
    /// A monthly/billing-cycle flat charge, already in cents.
    MonthlyCents(f64),
    /// A daily charge in cents; the solver converts this to `30 * daily` per month (spec §4.3).
    DailyCents(f64),
}

pub fn extract_base_charge(text: &str) -> Option<BaseCharge> {
    for line in text.lines() {
        if let Some(caps) = PER_DAY.captures(line) {
            let dollars: f64 = caps[1].parse().ok()?;
            return Some(BaseCharge::DailyCents(dollars * 100.0));
        }
        if let Some(caps) = PER_CYCLE.captures(line) {
            let dollars: f64 = caps[1].parse().ok()?;
            return Some(BaseCharge::MonthlyCents(dollars * 100.0));
        }
    }
    None
}

/// Converts a daily charge to a monthly equivalent per spec §4.3: "solver converts to 30*D per
/// month, rounded to cents".
pub fn daily_to_monthly_cents(daily_cents: f64) -> f64 {
    (daily_cents * 30.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_billing_cycle() {
        let text = "Base Charge $9.95 per billing cycle";
        assert_eq!(extract_base_charge(text), Some(BaseCharge::MonthlyCents(995.0)));
    }

    #[test]
    fn test_per_day() {
        let text = "Daily Charge $0.33 per day";
        assert_eq!(extract_base_charge(text), Some(BaseCharge::DailyCents(33.0)));
    }

    #[test]
    fn test_daily_to_monthly_conversion() {
        assert_eq!(daily_to_monthly_cents(33.0), 990.0);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_base_charge("Energy Charge 11.0 cents per kWh"), None);
    }
}
