// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Matchers for the per-array blocks of the `PV Array Characteristics`
//! section.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{cut_at, LocatedSection, ReportContent, SectionKind, SectionMatcher};

pub(super) const MATCHERS: &[&dyn SectionMatcher] = &[&NumberedArrays, &NamedSubArrays];

/// Array headers are repeated in later sections, e.g. the loss tables.  Only
/// blocks that describe a string layout are array definitions.
static STRING_LAYOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\d+\s*strings?\s*x\s*\d+|In\s+parallel\s*\d+\s*strings?)").unwrap()
});

/// Splits `text` into blocks at each header match.  Each block runs until
/// the next header, and is then cut at the first `terminator`.
fn split_blocks<'a>(text: &'a str, header: &Regex, terminator: &Regex) -> Vec<(usize, &'a str)> {
    let starts = header.find_iter(text).map(|m| m.start()).collect::<Vec<_>>();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            // Skip the header line itself when looking for the terminator.
            let first_line_end = text[start..end].find('\n').map_or(end, |p| start + p);
            let tail = cut_at(&text[first_line_end..end], terminator);
            (start, &text[start..first_line_end + tail.len()])
        })
        .collect()
}

/// `Array #n - <inverter/MPPT notation>` blocks, as printed by newer
/// versions of the report generator.
struct NumberedArrays;

static NUMBERED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*Array\s*#\s*(\d+)").unwrap());

static NUMBERED_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?im)^\s*(?:AC\s+wiring\s+losses|Page\s+\d+/\d+|Total\s+PV\s+power|",
        r"Array\s+losses|System\s+losses)"
    ))
    .unwrap()
});

impl SectionMatcher for NumberedArrays {
    fn name(&self) -> &'static str {
        "numbered-arrays"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let mut seen = HashSet::new();
        let mut sections = vec![];
        for (start, block) in split_blocks(&report.text, &NUMBERED_HEADER, &NUMBERED_END) {
            let Some(caps) = NUMBERED_HEADER.captures(&report.text[start..]) else {
                continue;
            };
            let id = caps[1].trim_start_matches('0');
            let id = if id.is_empty() { "0" } else { id };
            if !STRING_LAYOUT.is_match(block) || !seen.insert(id.to_string()) {
                continue;
            }
            sections.push(
                LocatedSection::text(SectionKind::ArrayBlock, self.name(), block).with_label(id),
            );
        }
        (!sections.is_empty()).then_some(sections)
    }
}

/// `Sub-array "<name>"` blocks, as printed by older versions of the report
/// generator.  The blocks are numbered in the order they appear.
struct NamedSubArrays;

static NAMED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?im)^[ \t]*Sub-array\s*"[^"\n]*""#).unwrap());

static NAMED_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:PV\s+Array\s+loss\s+factors|Page\s+\d+/\d+|Total\s+PV\s+power|System\s+losses)")
        .unwrap()
});

impl SectionMatcher for NamedSubArrays {
    fn name(&self) -> &'static str {
        "named-sub-arrays"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let sections = split_blocks(&report.text, &NAMED_HEADER, &NAMED_END)
            .into_iter()
            .filter(|(_, block)| STRING_LAYOUT.is_match(block))
            .enumerate()
            .map(|(i, (_, block))| {
                LocatedSection::text(SectionKind::ArrayBlock, self.name(), block)
                    .with_label((i + 1).to_string())
            })
            .collect::<Vec<_>>();
        (!sections.is_empty()).then_some(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{report, SINGLE_ARRAY_CPS_V7, SMA_V6, SMA_V7};

    #[test]
    fn test_numbered_arrays() {
        let sections = NumberedArrays.locate(&report(SMA_V7, &[])).unwrap();
        assert_eq!(sections.len(), 3);
        assert!(sections[0].text.starts_with("Array #1 - INV01 MPPT 1-6"));
        assert!(sections[0].text.contains("Modules 12 strings x 18 In series"));
        assert!(!sections[0].text.contains("Array #2"));
        // The last block stops at the plant totals.
        assert!(!sections[2].text.contains("Total PV power"));

        assert!(NumberedArrays.locate(&report(SMA_V6, &[])).is_none());
        assert!(NumberedArrays
            .locate(&report(SINGLE_ARRAY_CPS_V7, &[]))
            .is_none());
    }

    #[test]
    fn test_named_sub_arrays() {
        let sections = NamedSubArrays.locate(&report(SMA_V6, &[])).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label.as_deref(), Some("1"));
        assert!(sections[0].text.starts_with("Sub-array \"INV01 MPPT 1-2\""));
        assert_eq!(sections[1].label.as_deref(), Some("2"));
        assert!(sections[1].text.starts_with("Sub-array \"INV02-03 MPPT 1-3\""));
    }
}
