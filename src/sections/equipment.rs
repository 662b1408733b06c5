// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Matchers for the PV module and inverter identification blocks.
//!
//! Both matchers emit one `PvModule` and one `Inverter` section per block
//! they find, each normalized to `Label value` lines, so that a single parser
//! can read them regardless of the layout they came from.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{lines_from, LocatedSection, ReportContent, SectionKind, SectionMatcher};

pub(super) const MATCHERS: &[&dyn SectionMatcher] = &[&SideBySideEquipment, &StackedEquipment];

/// Newer reports print the module and the inverter in two columns, under a
/// `PV module Inverter` header:
///
/// ```text
/// PV module Inverter
/// Manufacturer Hanwha Q Cells Manufacturer SMA
/// Model Q.Peak-Duo-XL-G11S.3 / BFG-595 Model Sunny Tripower_Core1 62-US-41
/// Unit Nom. Power 595Wp Unit Nom. Power 62.5kWac
/// ```
struct SideBySideEquipment;

static SIDE_BY_SIDE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*PV\s+module\s+Inverter\s*$").unwrap());

/// Column-paired rows, as (label, regex) pairs.
static PAIRED_ROWS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "Manufacturer",
            Regex::new(r"(?i)^\s*Manufacturer\s+(.+?)\s+Manufacturer\s+(.+?)\s*$").unwrap(),
        ),
        (
            "Model",
            Regex::new(r"(?i)^\s*Model\s+(.+?)\s+Model\s+(.+?)\s*$").unwrap(),
        ),
        (
            "Unit Nom. Power",
            Regex::new(r"(?i)^\s*Unit\s+Nom\.?\s*Power\s+(.+?)\s+Unit\s+Nom\.?\s*Power\s+(.+?)\s*$")
                .unwrap(),
        ),
    ]
});

impl SectionMatcher for SideBySideEquipment {
    fn name(&self) -> &'static str {
        "side-by-side-equipment"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let mut sections = vec![];
        for header in SIDE_BY_SIDE_HEADER.find_iter(&report.text) {
            let block = lines_from(&report.text, header.end(), 8);
            let mut module = vec![];
            let mut inverter = vec![];
            for line in block.lines() {
                for (label, re) in PAIRED_ROWS.iter() {
                    if let Some(caps) = re.captures(line) {
                        module.push(format!("{label} {}", &caps[1]));
                        inverter.push(format!("{label} {}", &caps[2]));
                    }
                }
            }
            if module.is_empty() {
                continue;
            }
            sections.push(LocatedSection::text(
                SectionKind::PvModule,
                self.name(),
                module.join("\n"),
            ));
            sections.push(LocatedSection::text(
                SectionKind::Inverter,
                self.name(),
                inverter.join("\n"),
            ));
        }
        (!sections.is_empty()).then_some(sections)
    }
}

/// Older reports describe the module and the inverter one after the other:
///
/// ```text
/// PV module Si-mono Model JKM 400M-72
/// Original PVsyst database Manufacturer Jinkosolar
/// ...
/// Inverter Model Sunny Tripower CORE1 50-US
/// Original PVsyst database Manufacturer SMA
/// Characteristics Operating Voltage 500-800 V Unit Nom. Power 50.0 kWac
/// ```
struct StackedEquipment;

static STACKED_MODULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*PV\s+module\b.*\bModel\b.*$").unwrap());
static STACKED_INVERTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Inverter\b.*\bModel\b.*$").unwrap());

/// Labelled values inside a stacked block.
static STACKED_FIELDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "Manufacturer",
            Regex::new(r"(?im)\bManufacturer\s+(.+?)\s*$").unwrap(),
        ),
        ("Model", Regex::new(r"(?im)\bModel\s+(.+?)\s*$").unwrap()),
        (
            "Unit Nom. Power",
            Regex::new(r"(?i)Unit\s+Nom\.?\s*Power\s+([\d.,]+\s*[kM]?W\w*)").unwrap(),
        ),
    ]
});

impl StackedEquipment {
    fn normalize(block: &str) -> String {
        STACKED_FIELDS
            .iter()
            .filter_map(|(label, re)| re.captures(block).map(|c| format!("{label} {}", &c[1])))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl SectionMatcher for StackedEquipment {
    fn name(&self) -> &'static str {
        "stacked-equipment"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let text = &report.text;
        let inverter_starts = STACKED_INVERTER
            .find_iter(text)
            .map(|m| m.start())
            .collect::<Vec<_>>();

        let mut sections = vec![];
        for module in STACKED_MODULE.find_iter(text) {
            // The module block runs until the next inverter block, which is
            // where the module's rated power has been printed at the latest.
            let end = inverter_starts
                .iter()
                .copied()
                .find(|&s| s > module.start())
                .unwrap_or(text.len());
            sections.push(LocatedSection::text(
                SectionKind::PvModule,
                self.name(),
                Self::normalize(&text[module.start()..end]),
            ));
        }
        for &start in &inverter_starts {
            sections.push(LocatedSection::text(
                SectionKind::Inverter,
                self.name(),
                Self::normalize(lines_from(text, start, 4)),
            ));
        }

        let has_module = sections.iter().any(|s| s.kind == SectionKind::PvModule);
        let has_inverter = sections.iter().any(|s| s.kind == SectionKind::Inverter);
        (has_module && has_inverter).then_some(sections)
    }
}
