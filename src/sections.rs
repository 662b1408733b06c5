// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Locating the logical sections of an extracted report.
//!
//! The wording and layout of a section depend on the version of the report
//! generator.  Each section kind therefore has an ordered list of
//! [`SectionMatcher`]s, one per known layout.  They are tried in order and the
//! first one that recognizes its layout wins.

mod arrays;
mod equipment;
mod orientation;
mod production;
mod summary;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Page, Table};

/// The logical kinds of sections found in a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SectionKind {
    PvModule,
    Inverter,
    SystemSummary,
    ArrayBlock,
    MonthlyProduction,
    Orientation,
}

/// A section of a report, isolated from the rest of it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LocatedSection {
    pub(crate) kind: SectionKind,
    /// The identifier the report gives the section, e.g. the `n` of `Array #n`.
    pub(crate) label: Option<String>,
    pub(crate) text: String,
    /// Table cells, for tabular sections.
    pub(crate) rows: Vec<Vec<String>>,
    /// Name of the matcher that located the section.
    pub(crate) matcher: &'static str,
}

impl LocatedSection {
    pub(crate) fn text(kind: SectionKind, matcher: &'static str, text: impl Into<String>) -> Self {
        Self {
            kind,
            label: None,
            text: text.into(),
            rows: vec![],
            matcher,
        }
    }

    pub(crate) fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn with_rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows = rows;
        self
    }
}

/// The linearized content of a report: the text of all pages, in order, and
/// the extracted tables, if any.
#[derive(Debug, Default)]
pub(crate) struct ReportContent {
    pub(crate) text: String,
    pub(crate) tables: Vec<Vec<Vec<String>>>,
}

impl ReportContent {
    pub(crate) fn new<P: Page, T: Table>(
        pages: impl IntoIterator<Item = P>,
        tables: impl IntoIterator<Item = T>,
    ) -> Self {
        let mut pages = pages.into_iter().collect::<Vec<_>>();
        pages.sort_by_key(|p| p.page_number());
        let text = pages
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n");

        let mut tables = tables.into_iter().collect::<Vec<_>>();
        tables.sort_by_key(|t| t.page_number());
        let tables = tables.iter().map(|t| t.rows().to_vec()).collect();

        Self { text, tables }
    }
}

/// A strategy for locating the sections of one kind, for one report layout.
pub(crate) trait SectionMatcher {
    /// Returns the name of the matcher, for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns the located sections, or `None` if the report doesn't use the
    /// layout this matcher knows about.
    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>>;
}

/// Tries the given matchers in order, and returns the sections located by
/// the first applicable one.
pub(crate) fn first_match(
    report: &ReportContent,
    matchers: &[&dyn SectionMatcher],
) -> Vec<LocatedSection> {
    for matcher in matchers {
        if let Some(sections) = matcher.locate(report) {
            tracing::debug!(
                "Matcher {} located {} section(s).",
                matcher.name(),
                sections.len()
            );
            return sections;
        }
    }
    vec![]
}

/// All the sections of a report, grouped by kind.
#[derive(Debug, Default)]
pub(crate) struct ReportSections {
    pub(crate) pv_modules: Vec<LocatedSection>,
    pub(crate) inverters: Vec<LocatedSection>,
    pub(crate) summary: Option<LocatedSection>,
    pub(crate) arrays: Vec<LocatedSection>,
    pub(crate) monthly_production: Option<LocatedSection>,
    pub(crate) orientations: Vec<LocatedSection>,
}

impl ReportSections {
    pub(crate) fn locate(report: &ReportContent) -> Self {
        let (pv_modules, inverters) = first_match(report, equipment::MATCHERS)
            .into_iter()
            .partition(|s| s.kind == SectionKind::PvModule);

        Self {
            pv_modules,
            inverters,
            summary: first_match(report, summary::MATCHERS).into_iter().next(),
            arrays: first_match(report, arrays::MATCHERS),
            monthly_production: first_match(report, production::MATCHERS)
                .into_iter()
                .next(),
            orientations: first_match(report, orientation::MATCHERS),
        }
    }
}

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// Returns at most `max_lines` lines of `text`, starting at byte offset
/// `start`, which must be on a char boundary.
pub(crate) fn lines_from(text: &str, start: usize, max_lines: usize) -> &str {
    let rest = &text[start..];
    match LINE_BREAK.find_iter(rest).nth(max_lines.saturating_sub(1)) {
        Some(m) => &rest[..m.start()],
        None => rest,
    }
}

/// Returns `text` up to the first match of `terminator`, or all of it.
pub(crate) fn cut_at<'a>(text: &'a str, terminator: &Regex) -> &'a str {
    match terminator.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{report, TestPage, TestTable, SINGLE_ARRAY_CPS_V7, SMA_V7, SMA_V7_TABLES};

    #[test]
    fn test_report_content_orders_pages() {
        let content = ReportContent::new(
            vec![TestPage::new(2, "second"), TestPage::new(1, "first")],
            Vec::<TestTable>::new(),
        );
        assert_eq!(content.text, "first\nsecond");
    }

    #[test]
    fn test_lines_from() {
        let text = "a\nb\nc\nd";
        assert_eq!(lines_from(text, 2, 2), "b\nc");
        assert_eq!(lines_from(text, 0, 10), text);
    }

    #[test]
    fn test_locate_v7_sections() {
        let sections = ReportSections::locate(&report(SMA_V7, &[]));
        assert_eq!(sections.pv_modules.len(), 1);
        assert_eq!(sections.inverters.len(), 1);
        assert!(sections.summary.is_some());
        assert_eq!(
            sections
                .arrays
                .iter()
                .map(|s| s.label.as_deref())
                .collect::<Vec<_>>(),
            vec![Some("1"), Some("2"), Some("3")]
        );
        assert_eq!(
            sections.monthly_production.map(|s| s.matcher),
            Some("text-monthly-balances")
        );
        assert_eq!(sections.orientations.len(), 2);
    }

    #[test]
    fn test_locate_prefers_tables() {
        let sections = ReportSections::locate(&report(SMA_V7, SMA_V7_TABLES));
        assert_eq!(
            sections.monthly_production.map(|s| s.matcher),
            Some("table-monthly-balances")
        );
    }

    #[test]
    fn test_locate_without_arrays() {
        let sections = ReportSections::locate(&report(SINGLE_ARRAY_CPS_V7, &[]));
        assert!(sections.arrays.is_empty());
        assert!(sections.summary.is_some());
        assert_eq!(sections.pv_modules.len(), 1);
    }

    #[test]
    fn test_locate_nothing() {
        let sections = ReportSections::locate(&report(&["Nothing to see here."], &[]));
        assert!(sections.pv_modules.is_empty());
        assert!(sections.inverters.is_empty());
        assert!(sections.summary.is_none());
        assert!(sections.arrays.is_empty());
        assert!(sections.monthly_production.is_none());
        assert!(sections.orientations.is_empty());
    }
}
