// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Matchers for the plant-level summary: total module and inverter counts,
//! and for single-array plants, the array's own characteristics.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{cut_at, lines_from, LocatedSection, ReportContent, SectionKind, SectionMatcher};

pub(super) const MATCHERS: &[&dyn SectionMatcher] = &[&ArrayCharacteristics, &SystemSummary];

/// The global part of the `PV Array Characteristics` section, up to the
/// first per-array block or the next top-level section.
struct ArrayCharacteristics;

static CHARACTERISTICS_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*PV\s+Array\s+Characteristics\b").unwrap());

static CHARACTERISTICS_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?im)^\s*(?:Array\s*#\s*\d|Sub-array\b|Array\s+losses|System\s+losses|",
        r"Loss\s+diagram|Main\s+results|Balances\s+and\s+main\s+results|AC\s+wiring\s+losses)"
    ))
    .unwrap()
});

impl SectionMatcher for ArrayCharacteristics {
    fn name(&self) -> &'static str {
        "array-characteristics-summary"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let header = CHARACTERISTICS_HEADER.find(&report.text)?;
        let body = cut_at(&report.text[header.end()..], &CHARACTERISTICS_END);
        Some(vec![LocatedSection::text(
            SectionKind::SystemSummary,
            self.name(),
            format!("{}{}", header.as_str(), body),
        )])
    }
}

/// The `System summary` / `Project summary` block found on the first page of
/// most reports.
struct SystemSummary;

static SUMMARY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(?:System|Project|Results)\s+summary\b").unwrap());

impl SectionMatcher for SystemSummary {
    fn name(&self) -> &'static str {
        "system-summary"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let header = SUMMARY_HEADER.find(&report.text)?;
        Some(vec![LocatedSection::text(
            SectionKind::SystemSummary,
            self.name(),
            lines_from(&report.text, header.start(), 16),
        )])
    }
}
