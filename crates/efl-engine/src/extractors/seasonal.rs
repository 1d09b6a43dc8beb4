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

//! Seasonal discount extraction (spec §4.3, §8).

use once_cell::sync::Lazy;
use regex::Regex;

static SEASONAL_DISCOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([\d.]+)\s*percent\s*discount\s*off\s*the\s*Energy\s*Charge\s*from\s*([A-Za-z]+)\s*\d*\s*through\s*([A-Za-z]+)",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalDiscount {
    pub discount_fraction: f64,
    pub months: Vec<u8>,
}

fn month_number(name: &str) -> Option<u8> {
    let lower = name.to_lowercase();
    let months = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    months.iter().position(|m| *m == lower).map(|i| (i + 1) as u8)
}

/// Inclusive-inclusive month range (spec §8: "June 1 through September 30 produces months
/// {6,7,8,9}"), wrapping across a year boundary if `end < start`.
fn month_range(start: u8, end: u8) -> Vec<u8> {
    if start <= end {
        (start..=end).collect()
    } else {
        (start..=12).chain(1..=end).collect()
    }
}

pub fn extract_seasonal_discount(text: &str) -> Option<SeasonalDiscount> {
    let caps = SEASONAL_DISCOUNT.captures(text)?;
    let percent: f64 = caps[1].parse().ok()?;
    let start = month_number(&caps[2])?;
    let end = month_number(&caps[3])?;
    Some(SeasonalDiscount { discount_fraction: percent / 100.0, months: month_range(start, end) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_seasonal_discount() {
        let text = "50 percent discount off the Energy Charge from June 1 through September 30";
        let discount = extract_seasonal_discount(text).unwrap();
        assert_eq!(discount.discount_fraction, 0.5);
        assert_eq!(discount.months, vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_no_discount_present() {
        assert!(extract_seasonal_discount("Energy Charge 11.0 cents per kWh").is_none());
    }
}
