// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Matchers for the orientation table.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{lines_from, LocatedSection, ReportContent, SectionKind, SectionMatcher};

pub(super) const MATCHERS: &[&dyn SectionMatcher] = &[&NumberedOrientations, &SinglePlane];

/// `Orientation #n` entries followed by a `Tilt/Azimuth` line.
struct NumberedOrientations;

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Orientation\s*#\s*(\d+)").unwrap());
static TILT_AZIMUTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Tilt\s*/\s*Azimuth").unwrap());

impl SectionMatcher for NumberedOrientations {
    fn name(&self) -> &'static str {
        "numbered-orientations"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let mut seen = HashSet::new();
        let mut sections = vec![];
        for caps in NUMBERED.captures_iter(&report.text) {
            let Some(m) = caps.get(0) else { continue };
            let window = lines_from(&report.text, m.start(), 3);
            // Later mentions of an orientation only reference it.
            if !TILT_AZIMUTH.is_match(window) || !seen.insert(caps[1].to_string()) {
                continue;
            }
            sections.push(
                LocatedSection::text(SectionKind::Orientation, self.name(), window)
                    .with_label(&caps[1]),
            );
        }
        (!sections.is_empty()).then_some(sections)
    }
}

/// A single fixed plane, described as `Plane tilt 20° Azimuth 0°`.
struct SinglePlane;

static PLANE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^.*\bTilt\s*-?[\d.]+\s*°\s*Azimuth\s*-?[\d.]+\s*°.*$").unwrap()
});

impl SectionMatcher for SinglePlane {
    fn name(&self) -> &'static str {
        "single-plane"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let line = PLANE.find(&report.text)?;
        Some(vec![LocatedSection::text(
            SectionKind::Orientation,
            self.name(),
            line.as_str().trim(),
        )
        .with_label("1")])
    }
}
