// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Matchers for the monthly balances table.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{LocatedSection, ReportContent, SectionKind, SectionMatcher};
use crate::production::Month;

pub(super) const MATCHERS: &[&dyn SectionMatcher] = &[&TableMonthlyBalances, &TextMonthlyBalances];

static E_GRID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bE_?Grid\b").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[\d.,]+$").unwrap());

fn starts_with_month(cells: &[String]) -> bool {
    cells.first().is_some_and(|c| Month::from_name(c).is_some())
}

/// The balances table as returned by a table extractor.
struct TableMonthlyBalances;

impl SectionMatcher for TableMonthlyBalances {
    fn name(&self) -> &'static str {
        "table-monthly-balances"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let table = report.tables.iter().find(|rows| {
            rows.iter().any(|r| r.iter().any(|c| E_GRID.is_match(c)))
                && rows.iter().any(|r| starts_with_month(r))
        })?;
        let rows = table
            .iter()
            .map(|r| r.iter().map(|c| c.trim().to_string()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let text = rows
            .iter()
            .map(|r| r.join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        Some(vec![LocatedSection::text(
            SectionKind::MonthlyProduction,
            self.name(),
            text,
        )
        .with_rows(rows)])
    }
}

/// The balances table, read from the page text one line per row.
struct TextMonthlyBalances;

impl TextMonthlyBalances {
    fn cells(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    /// Rows following a header line that names the `E_Grid` column.
    fn anchored_rows(text: &str) -> Option<Vec<Vec<String>>> {
        let mut lines = text.lines().skip_while(|l| !E_GRID.is_match(l));
        let header = lines.next()?;
        let mut rows = vec![Self::cells(header)];
        let mut months = HashSet::new();
        for line in lines.take(30) {
            let cells = Self::cells(line);
            if cells.first().is_some_and(|c| c.eq_ignore_ascii_case("year")) {
                break;
            }
            if starts_with_month(&cells) && months.insert(cells[0].to_lowercase()) {
                rows.push(cells);
            }
        }
        (rows.len() > 1).then_some(rows)
    }

    /// Month rows anywhere in the text, recognized by their shape.
    fn shaped_rows(text: &str) -> Option<Vec<Vec<String>>> {
        let mut months = HashSet::new();
        let rows = text
            .lines()
            .map(Self::cells)
            .filter(|cells| {
                cells.len() >= 8 && starts_with_month(cells) && NUMBER.is_match(&cells[1])
            })
            .filter(|cells| months.insert(cells[0].to_lowercase()))
            .collect::<Vec<_>>();
        (!rows.is_empty()).then_some(rows)
    }
}

impl SectionMatcher for TextMonthlyBalances {
    fn name(&self) -> &'static str {
        "text-monthly-balances"
    }

    fn locate(&self, report: &ReportContent) -> Option<Vec<LocatedSection>> {
        let rows = Self::anchored_rows(&report.text).or_else(|| Self::shaped_rows(&report.text))?;
        let text = rows
            .iter()
            .map(|r| r.join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        Some(vec![LocatedSection::text(
            SectionKind::MonthlyProduction,
            self.name(),
            text,
        )
        .with_rows(rows)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{report, SMA_V7, SMA_V7_TABLES};

    #[test]
    fn test_text_balances() {
        let sections = TextMonthlyBalances.locate(&report(SMA_V7, &[])).unwrap();
        let rows = &sections[0].rows;
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0][0], "GlobHor");
        assert_eq!(rows[1][0], "January");
        assert_eq!(rows[12][0], "December");
    }

    #[test]
    fn test_text_balances_without_header() {
        let text = concat!(
            "January 96.1 32.59 11.85 114.8 107.1 35712 34807 0.839\n",
            "February 105.0 41.20 13.10 120.2 112.9 37001 36015 0.827\n",
            "January 1 2 3\n"
        );
        let sections = TextMonthlyBalances.locate(&report(&[text], &[])).unwrap();
        assert_eq!(sections[0].rows.len(), 2);
        assert_eq!(sections[0].rows[1][7], "36015");
    }

    #[test]
    fn test_table_balances() {
        let sections = TableMonthlyBalances
            .locate(&report(SMA_V7, SMA_V7_TABLES))
            .unwrap();
        assert_eq!(sections[0].rows.len(), 14);
        assert!(TableMonthlyBalances.locate(&report(SMA_V7, &[])).is_none());
    }
}
