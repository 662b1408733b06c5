// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Monthly energy series: the plant-level balances read from the report, and
//! their allocation to inverters.

mod allocation;
pub(crate) use allocation::allocate;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::sections::LocatedSection;

/// A calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

/// The months of the year, in calendar order.
pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

impl Month {
    /// Returns the English name of the month.
    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Parses a full or three-letter English month name, ignoring case and a
    /// trailing dot.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_end_matches('.').to_lowercase();
        MONTHS.into_iter().find(|m| {
            let full = m.name().to_lowercase();
            name == full || (name.len() == 3 && full.starts_with(&name))
        })
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Values for some or all months of a year, in a fixed month order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonthlySeries(Vec<(Month, f64)>);

impl MonthlySeries {
    /// Builds a series from the given values, ordered by `months`.  Months
    /// without a value are left out.
    pub(crate) fn ordered(values: &HashMap<Month, f64>, months: &[Month; 12]) -> Self {
        Self(
            months
                .iter()
                .filter_map(|m| values.get(m).map(|v| (*m, *v)))
                .collect(),
        )
    }

    /// Returns the value for the given month, if there is one.
    pub fn get(&self, month: Month) -> Option<f64> {
        self.0.iter().find(|(m, _)| *m == month).map(|(_, v)| *v)
    }

    /// Returns an iterator over the `(month, value)` pairs, in order.
    pub fn iter(&self) -> impl Iterator<Item = (Month, f64)> + '_ {
        self.0.iter().copied()
    }

    /// Returns the sum of all values.
    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, v)| v).sum()
    }

    /// Returns the number of months with a value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no month has a value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MonthlySeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (month, value) in &self.0 {
            map.serialize_entry(month.name(), value)?;
        }
        map.end()
    }
}

/// The monthly series read from the balances table.
#[derive(Debug, Default)]
pub(crate) struct Balances {
    /// Energy injected into the grid, `E_Grid`, in kWh.
    pub(crate) production: MonthlySeries,
    /// Global horizontal irradiation, `GlobHor`, in kWh/m².
    pub(crate) globhor: MonthlySeries,
}

static E_GRID_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^E_?Grid$").unwrap());
static GLOBHOR_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^GlobHor$").unwrap());

/// Parses a number as printed in the report, with optional thousands
/// separators.
pub(crate) fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().replace(',', "").parse().ok()
}

/// Rounds `value` to `precision` decimals.
pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

impl Balances {
    /// Reads the balances from a located monthly table.
    ///
    /// The `E_Grid` and `GlobHor` columns are found by name when the table has
    /// a header row.  Otherwise `E_Grid` is the second to last column and
    /// `GlobHor` the first one after the month.
    pub(crate) fn parse(section: &LocatedSection, months: &[Month; 12]) -> Self {
        let header = section
            .rows
            .first()
            .filter(|r| r.first().and_then(|c| Month::from_name(c)).is_none());
        let column = |re: &Regex| header.and_then(|h| h.iter().position(|c| re.is_match(c.trim())));
        let e_grid = column(&E_GRID_COLUMN);
        let globhor = column(&GLOBHOR_COLUMN);

        let mut production = HashMap::new();
        let mut irradiation = HashMap::new();
        for row in &section.rows {
            let Some(month) = row.first().and_then(|c| Month::from_name(c)) else {
                continue;
            };
            // A header without a label for the month column is shifted by one.
            let shift = match header {
                Some(h) if h.len() == row.len() => 0,
                _ => 1,
            };
            let e_grid_idx = e_grid
                .map(|i| i + shift)
                .or_else(|| row.len().checked_sub(2).filter(|i| *i > 0));
            let globhor_idx = globhor.map(|i| i + shift).unwrap_or(1);

            if let Some(value) = e_grid_idx.and_then(|i| row.get(i)).and_then(|c| parse_number(c)) {
                production.entry(month).or_insert(value);
            }
            if let Some(value) = row.get(globhor_idx).and_then(|c| parse_number(c)) {
                irradiation.entry(month).or_insert(value);
            }
        }

        Self {
            production: MonthlySeries::ordered(&production, months),
            globhor: MonthlySeries::ordered(&irradiation, months),
        }
    }
}
