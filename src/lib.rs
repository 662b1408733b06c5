// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Frequenz PV Design Report

This is a library for turning the text of a PV system design report into a
structured record of the plant: the module and inverter types, the array
configurations, which configuration feeds which MPPT of which inverter, and
the plant's monthly production split across its inverters.

## The `Page` and `Table` traits

The main struct is [`PlantModel`], instances of which can be created by
passing the extracted pages and tables of a report to the
[`try_new`][PlantModel::try_new] method.

But because this is an independent library, it doesn't extract anything from
pdf files itself and instead uses traits to read the extractor's output.

Therefore, to be usable with this library, the page and table types must
implement the [`Page`] and [`Table`] traits, respectively.  Check out the
documentation for these traits for sample implementations.

## Reconciliation

Reports differ in layout between generator versions, and the parts of a
report don't always agree with each other.  The
[`try_new`][PlantModel::try_new] method:

- Locates each kind of section with a list of layout-specific matchers, and
  uses the first one that matches.
- Expands the compact inverter and MPPT notation of the array headers, like
  `INV02-05, 7,8 MPPT 1-6`.
- Splits each configuration's strings evenly over its inverters' MPPTs.
- Infers the topology from the inverter family when the report has a single
  configuration without per-array blocks.
- Splits the plant's monthly production over the inverters in proportion to
  their module counts, so that the inverters' values add up exactly to the
  plant's.

The method fails with an [`Error`] only when the report doesn't identify its
equipment.  Every other problem is recorded as a [`Diagnostic`] in the
returned model, next to the best-effort values, and
[`check_consistency`][PlantModel::check_consistency] can re-derive the
model's totals from their parts.
*/

mod array_config;
pub use array_config::ArrayConfiguration;

mod config;
pub use config::ReportParserConfig;

mod equipment;
pub use equipment::{InverterType, ModuleType};

mod error;
pub use error::{Diagnostic, Error, ErrorKind};

mod model;
pub use model::{CombinedConfiguration, InverterSummary, Metadata, PlantModel};

mod notation;
pub use notation::{expand_notation, Notation};

mod orientation;
pub use orientation::{compass_azimuth, pvsyst_azimuth, Orientation};

mod production;
pub use production::{Month, MonthlySeries, MONTHS};

mod report_traits;
pub use report_traits::{Page, Table};

mod sections;

mod topology;
pub use topology::{ConfigShare, InverterFamily, InverterId, Mppt, TopologyInferenceDiagnostics};

#[cfg(test)]
mod test_utils;
