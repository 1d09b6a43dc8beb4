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

//! EFL Text Normalizer (spec §4.1).
//!
//! Strips the disclosed average-price table, the TDU delivery-charges block, and a small
//! boilerplate allow-list from raw EFL text before it is handed to the AI draft parser.
//! Fail-open: if stripping leaves fewer than 200 characters of a non-empty input, the raw text
//! is returned unchanged with a fallback note.

const MIN_NORMALIZED_LEN: usize = 200;

const SECTION_START_MARKERS: &[&str] = &[
    "Average Monthly Use",
    "Average Price per kWh",
    "TDU Delivery Charges",
];

/// Boilerplate lines dropped outright regardless of section state.
const BOILERPLATE_ALLOW_LIST: &[&str] = &[
    "This Electricity Facts Label",
    "This facility may be used",
    "Sales and excise taxes",
    "Municipal and other franchise fees",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub notes: Vec<String>,
    pub fell_back_to_raw: bool,
}

/// Returns `true` once a stripped section is considered closed: a blank line, or a line that
/// looks like the start of a new labeled section (ends with a colon or is in title case and
/// short), terminates the skip.
fn looks_like_new_section(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    trimmed.ends_with(':') && trimmed.len() < 80
}

pub fn normalize(raw_text: &str) -> NormalizedText {
    if raw_text.is_empty() {
        return NormalizedText { text: String::new(), notes: vec!["empty input".to_string()], fell_back_to_raw: false };
    }

    let mut notes = Vec::new();
    let mut output_lines = Vec::new();
    let mut skipping_section = false;

    for line in raw_text.lines() {
        if skipping_section {
            if looks_like_new_section(line) {
                skipping_section = false;
            } else {
                continue;
            }
        }

        if let Some(marker) = SECTION_START_MARKERS.iter().find(|m| line.contains(*m)) {
            notes.push(format!("stripped section starting at marker \"{marker}\""));
            skipping_section = true;
            continue;
        }

        if BOILERPLATE_ALLOW_LIST.iter().any(|b| line.contains(b)) {
            continue;
        }

        output_lines.push(line);
    }

    let normalized = output_lines.join("\n");

    if normalized.len() < MIN_NORMALIZED_LEN {
        notes.push("fallback: normalized text below minimum length, returning raw text".to_string());
        return NormalizedText { text: raw_text.to_string(), notes, fell_back_to_raw: true };
    }

    NormalizedText { text: normalized, notes, fell_back_to_raw: false }
}
