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

//! Time-of-use peak/off-peak extraction (spec §4.3).

use once_cell::sync::Lazy;
use regex::Regex;

static PEAK_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Energy\s*Charge\s*Peak\s*([\d.]+)\s*\u{a2}").unwrap()
});

static OFF_PEAK_RATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Off-Peak\s*([\d.]+)\s*\u{a2}").unwrap());

static OFF_PEAK_HOURS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Off-Peak hours are (\d{1,2}):(\d{2})\s*(AM|PM)\s*[\x{2013}\x{2014}-]\s*(\d{1,2}):(\d{2})\s*(AM|PM)")
        .unwrap()
});

static OFF_PEAK_PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d.]+)%\s*of\s*Off-Peak\s*consumption").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockWindow {
    pub start_hour: u8,
    pub end_hour: u8,
}

/// Converts a 12-hour clock time to the engine's 24-hour half-open convention (spec §4.3):
/// 12AM=0, 12PM=12; a non-zero minute rounds the hour up (used for window end times).
pub fn clock_to_hour(hour_12: u8, minute: u8, is_pm: bool, round_up_on_minute: bool) -> u8 {
    let mut hour24 = match (hour_12, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    if round_up_on_minute && minute > 0 {
        hour24 = (hour24 + 1) % 25; // allow 24 as an end-of-day sentinel
        if hour24 == 25 {
            hour24 = 0;
        }
    }
    hour24
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouCandidate {
    pub peak_rate_cents_per_kwh: Option<f64>,
    pub off_peak_rate_cents_per_kwh: Option<f64>,
    pub off_peak_window: Option<ClockWindow>,
    pub off_peak_usage_percent: Option<f64>,
}

pub fn extract_tou_candidate(text: &str) -> TouCandidate {
    let peak_rate_cents_per_kwh = PEAK_RATE.captures(text).and_then(|c| c[1].parse().ok());
    let off_peak_rate_cents_per_kwh = OFF_PEAK_RATE.captures(text).and_then(|c| c[1].parse().ok());

    let off_peak_window = OFF_PEAK_HOURS.captures(text).map(|c| {
        let start_hour_12: u8 = c[1].parse().unwrap_or(12);
        let start_min: u8 = c[2].parse().unwrap_or(0);
        let start_pm = c[3].eq_ignore_ascii_case("PM");
        let end_hour_12: u8 = c[4].parse().unwrap_or(12);
        let end_min: u8 = c[5].parse().unwrap_or(0);
        let end_pm = c[6].eq_ignore_ascii_case("PM");

        ClockWindow {
            start_hour: clock_to_hour(start_hour_12, start_min, start_pm, false),
            end_hour: clock_to_hour(end_hour_12, end_min, end_pm, true),
        }
    });

    let off_peak_usage_percent = OFF_PEAK_PERCENT
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|p| p / 100.0);

    TouCandidate {
        peak_rate_cents_per_kwh,
        off_peak_rate_cents_per_kwh,
        off_peak_window,
        off_peak_usage_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_conversion_midnight_and_noon() {
        assert_eq!(clock_to_hour(12, 0, false, false), 0);
        assert_eq!(clock_to_hour(12, 0, true, false), 12);
    }

    #[test]
    fn test_clock_conversion_rounds_end_minute_up() {
        assert_eq!(clock_to_hour(5, 1, false, true), 6);
        assert_eq!(clock_to_hour(5, 0, false, true), 5);
    }

    #[test]
    fn test_extract_full_candidate() {
        let text = "Energy Charge Peak 11.84\u{a2}\nOff-Peak 5.92\u{a2}\nOff-Peak hours are 9:00 PM \u{2013} 5:00 AM\n32% of Off-Peak consumption";
        let candidate = extract_tou_candidate(text);
        assert_eq!(candidate.peak_rate_cents_per_kwh, Some(11.84));
        assert_eq!(candidate.off_peak_rate_cents_per_kwh, Some(5.92));
        assert_eq!(candidate.off_peak_usage_percent, Some(0.32));
        let window = candidate.off_peak_window.unwrap();
        assert_eq!(window.start_hour, 21);
        assert_eq!(window.end_hour, 5);
    }
}
