// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for a parse run.

use crate::production::{Month, MONTHS};
use crate::topology::InverterFamily;

/// Configuration options for building a `PlantModel`.
#[derive(Clone, Debug)]
pub struct ReportParserConfig {
    /// Number of decimals the allocated monthly production values are
    /// rounded to.
    pub monthly_precision: u32,

    /// Number of decimals the per-MPPT `dc_kwp` values are rounded to.
    pub dc_kwp_precision: u32,

    /// How far a capacity can be off from the sum of its parts before a
    /// reconciliation warning is raised.
    pub capacity_tolerance_kwp: f64,

    /// Known inverter families, used to infer the MPPT topology when a report
    /// has no per-array blocks.  The first matching entry wins.
    pub inverter_families: Vec<InverterFamily>,

    /// The order in which months appear in monthly series.
    pub months: [Month; 12],
}

impl Default for ReportParserConfig {
    fn default() -> Self {
        Self {
            monthly_precision: 0,
            dc_kwp_precision: 3,
            capacity_tolerance_kwp: 0.01,
            inverter_families: InverterFamily::builtin(),
            months: MONTHS,
        }
    }
}
