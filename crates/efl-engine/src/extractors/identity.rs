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

//! Identity extraction: PUCT certificate, EFL version, footer-token fallback (spec §4.3).
//!
//! Open question from spec §9: when raw text lacks a `Version #` label but contains an
//! `M1F...` footer token, "last-match wins" is the documented, deliberately-kept behavior
//! (decision recorded in `DESIGN.md`).

use once_cell::sync::Lazy;
use regex::Regex;

static PUCT_CERT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PUCT\s*Certificate\s*#\s*([0-9]+)").unwrap()
});

static VERSION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Version\s*#|Ver\.?\s*#)\s*:?\s*([A-Za-z0-9.]+)").unwrap()
});

static FOOTER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"M1F[0-9A-Z]{8,24}").unwrap());

pub fn extract_puct_certificate(text: &str) -> Option<String> {
    PUCT_CERT.captures(text).map(|c| c[1].to_string())
}

/// Returns the EFL version code, preferring an explicit `Version #`/`Ver. #` label; when none
/// is present, falls back to the last `M1F...` footer token in the text.
pub fn extract_efl_version_code(text: &str) -> Option<String> {
    if let Some(caps) = VERSION_LABEL.captures(text) {
        return Some(caps[1].to_string());
    }
    FOOTER_TOKEN.find_iter(text).last().map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_puct_certificate() {
        assert_eq!(extract_puct_certificate("PUCT Certificate #10234"), Some("10234".to_string()));
    }

    #[test]
    fn test_version_label_preferred() {
        let text = "Version #: 3.2\nFooter M1FABCDEFGH1234";
        assert_eq!(extract_efl_version_code(text), Some("3.2".to_string()));
    }

    #[test]
    fn test_footer_token_fallback_last_match() {
        let text = "Footer M1FABCDEFGH1234 and again M1FZZZZZZZZ9999";
        assert_eq!(extract_efl_version_code(text), Some("M1FZZZZZZZZ9999".to_string()));
    }

    #[test]
    fn test_no_identity_present() {
        assert_eq!(extract_efl_version_code("no identity here"), None);
    }
}
