// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Turning per-array text blocks into structured [`ArrayConfiguration`]s.
//!
//! Every field has one or more patterns, one per known wording.  A field that
//! can't be found is left as `None`, never defaulted to zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::equipment::Catalog;
use crate::error::Diagnostics;
use crate::notation::Notation;
use crate::orientation::{compass_azimuth, pvsyst_azimuth, tilt_azimuth};
use crate::production::parse_number;
use crate::sections::LocatedSection;
use crate::topology::InverterId;
use crate::Error;

/// A set of strings sharing the same modules, electrical layout and
/// orientation, possibly spread over several inverters and MPPTs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ArrayConfiguration {
    pub config_id: String,
    /// The name of the array in the report, e.g. `INV01 MPPT 1-6`.
    pub name: Option<String>,
    pub inverter_notation: Option<String>,
    pub mppt_notation: Option<String>,
    pub inverters: Vec<InverterId>,
    /// MPPT numbers used on each of the inverters.  Empty when the report
    /// doesn't name them.
    pub mppts: Vec<u32>,
    pub mppts_per_inverter: Option<u32>,
    pub module_type_id: Option<String>,
    pub inverter_type_id: Option<String>,
    pub modules: Option<u64>,
    pub strings: Option<u64>,
    pub modules_in_series: Option<u64>,
    pub u_mpp_v: Option<f64>,
    pub i_mpp_a: Option<f64>,
    pub nominal_stc_kwp: Option<f64>,
    pub dc_kwp: Option<f64>,
    pub tilt: Option<f64>,
    /// Compass azimuth.
    pub azimuth: Option<f64>,
    pub azimuth_pvsyst_deg: Option<f64>,
    pub orientation_id: Option<String>,
    /// MPPT inputs of the whole array, from the `Number of inverters` line.
    pub mppt_inputs: Option<u32>,
    pub mppt_share_percent: Option<f64>,
    pub inverter_units: Option<f64>,
}

static NUMBERED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*Array\s*#\s*\d+\s*-?\s*(.*?)\s*$").unwrap());
static QUOTED_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).unwrap());

static INVERTER_NOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bINV(?:ERTERS?)?\s*#?\s*(\d(?:[\d\s,]|-\s*(?:INV)?)*)").unwrap()
});
static MPPT_NOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bMPPTs?\s*#?\s*(\d(?:[\d\s,]|-\s*)*)").unwrap());

static STRINGS_X_SERIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s*strings?\s*x\s*(\d+)\s*(?:modules?\s*)?In\s+series").unwrap()
});
static IN_SERIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)In\s+series\s+(\d+)\s*modules?").unwrap());
static IN_PARALLEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)In\s+parallel\s+(\d[\d,]*)\s*strings?").unwrap());
static MODULE_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:Number\s+of\s+PV\s+modules|Nb\.?\s+(?:of\s+)?modules|Total\s+number\s+of\s+modules)\s+(\d[\d,]*)",
    )
    .unwrap()
});
static NOMINAL_STC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Nominal\s*\(STC\)\s*([\d.,]+)\s*([kM])Wp").unwrap());
static U_MPP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bU\s*mpp\s+([\d.,]+)\s*V").unwrap());
static I_MPP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bI\s*mpp\s+([\d.,]+)\s*A").unwrap());
static COMPASS_AZIMUTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Azimuth\s*\(compass\)\s*(-?[\d.]+)").unwrap());
static ORIENTATION_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Orientation\s*#\s*(\d+)").unwrap());
static INVERTER_UNITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Number\s+of\s+inverters\s+(\d+)\s*\*\s*MPPT\s+([\d.]+)\s*%\s*([\d.]+)\s*units?")
        .unwrap()
});
static MODULE_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*PV\s+module\b.*?\bModel\s+(.+?)\s*$").unwrap());
static INVERTER_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Inverter\b.*?\bModel\s+(.+?)\s*$").unwrap());

/// Returns the first capture group of `re` in `text`, parsed as a number.
fn capture_number<T: TryFrom<u64>>(re: &Regex, text: &str) -> Option<T> {
    let caps = re.captures(text)?;
    let value = parse_number(&caps[1])?;
    if value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    T::try_from(value as u64).ok()
}

fn capture_float(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|c| parse_number(&c[1]))
}

/// Finds the notation following `keyword` in `header`, and returns it as
/// written and the digits part of it.
fn find_notation<'a>(keyword: &Regex, header: &'a str) -> Option<(&'a str, &'a str)> {
    let caps = keyword.captures(header)?;
    let whole = caps.get(0)?;
    let digits = caps.get(1)?;
    let trim = |s: &'a str| s.trim_end_matches(|c: char| c.is_whitespace() || c == ',');
    Some((
        trim(&header[whole.start()..digits.end()]),
        trim(digits.as_str()),
    ))
}

impl ArrayConfiguration {
    /// Builds a configuration from a per-array block.
    ///
    /// Returns a notation error if the block's inverter or MPPT notation
    /// can't be parsed.
    pub(crate) fn from_block(
        section: &LocatedSection,
        catalog: &mut Catalog,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let config_id = section.label.clone().unwrap_or_default();
        let header = section.text.lines().next().unwrap_or_default();
        let name = QUOTED_NAME
            .captures(header)
            .or_else(|| NUMBERED_NAME.captures(header))
            .map(|c| c[1].trim().to_string())
            .filter(|n| !n.is_empty());

        let mut config = Self::from_text(config_id, &section.text, catalog, diagnostics);
        config.name = name;

        if let Some((raw, digits)) = find_notation(&INVERTER_NOTATION, header) {
            // Identifiers are written as `INV` and a number padded to at least
            // two digits, whatever the wording in the header.
            let notation = Notation::parse(&format!("INV{digits}")).map_err(|e| {
                Error::notation(format!(
                    "Configuration {}: inverter notation `{raw}`: {}",
                    config.config_id,
                    e.description()
                ))
            })?;
            config.inverters = notation
                .labels("INV", 2)
                .into_iter()
                .map(InverterId::new)
                .collect();
            config.inverter_notation = Some(raw.to_string());
        }
        if let Some((raw, digits)) = find_notation(&MPPT_NOTATION, header) {
            let notation = Notation::parse(digits).map_err(|e| {
                Error::notation(format!(
                    "Configuration {}: MPPT notation `{raw}`: {}",
                    config.config_id,
                    e.description()
                ))
            })?;
            config.mppts = notation.values().to_vec();
            config.mppt_notation = Some(raw.to_string());
        }
        config.mppts_per_inverter = if config.mppts.is_empty() {
            // The MPPT inputs of the array are spread over all its inverters.
            let inverters = u32::try_from(config.inverters.len()).unwrap_or(0);
            config
                .mppt_inputs
                .filter(|inputs| inverters > 0 && inputs % inverters == 0)
                .map(|inputs| inputs / inverters)
        } else {
            u32::try_from(config.mppts.len()).ok()
        };

        tracing::debug!(
            "Configuration {}: {} inverter(s), {:?} strings.",
            config.config_id,
            config.inverters.len(),
            config.strings
        );
        Ok(config)
    }

    /// Builds the single configuration of a plant without per-array blocks,
    /// from the plant summary.  Its inverters are left to be inferred.
    pub(crate) fn from_summary(
        section: &LocatedSection,
        catalog: &mut Catalog,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        Self::from_text(String::from("1"), &section.text, catalog, diagnostics)
    }

    fn from_text(
        config_id: String,
        text: &str,
        catalog: &mut Catalog,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut config = Self {
            config_id,
            ..Default::default()
        };

        if let Some(caps) = STRINGS_X_SERIES.captures(text) {
            config.strings = parse_number(&caps[1]).map(|v| v as u64);
            config.modules_in_series = caps[2].parse().ok();
        } else {
            config.strings = capture_number(&IN_PARALLEL, text);
            config.modules_in_series = capture_number(&IN_SERIES, text);
        }
        config.modules = capture_number(&MODULE_COUNT, text);
        config.reconcile_counts(diagnostics);

        config.nominal_stc_kwp = NOMINAL_STC.captures(text).and_then(|c| {
            let value = parse_number(&c[1])?;
            Some(if c[2].eq_ignore_ascii_case("M") {
                value * 1_000.0
            } else {
                value
            })
        });
        config.u_mpp_v = capture_float(&U_MPP, text);
        config.i_mpp_a = capture_float(&I_MPP, text);

        if let Some((tilt, azimuth)) = tilt_azimuth(text) {
            config.tilt = Some(tilt);
            config.azimuth_pvsyst_deg = Some(azimuth);
            config.azimuth = Some(compass_azimuth(azimuth));
        }
        if let Some(compass) = capture_float(&COMPASS_AZIMUTH, text) {
            config.azimuth = Some(compass.rem_euclid(360.0));
            config.azimuth_pvsyst_deg = Some(pvsyst_azimuth(compass));
        }
        config.orientation_id = ORIENTATION_REF.captures(text).map(|c| c[1].to_string());

        if let Some(caps) = INVERTER_UNITS.captures(text) {
            config.mppt_inputs = caps[1].parse().ok();
            config.mppt_share_percent = caps[2].parse().ok();
            config.inverter_units = caps[3].parse().ok();
        }

        let module_model = MODULE_MODEL.captures(text).map(|c| c[1].to_string());
        config.module_type_id = catalog.resolve_module(module_model.as_deref());
        let inverter_model = INVERTER_MODEL.captures(text).map(|c| c[1].to_string());
        config.inverter_type_id = catalog.resolve_inverter(inverter_model.as_deref());

        let unit_power_w = config
            .module_type_id
            .as_deref()
            .and_then(|id| catalog.module(id))
            .and_then(|m| m.unit_nom_power_w);
        config.dc_kwp = match (unit_power_w, config.modules) {
            (Some(w), Some(modules)) => Some(w * modules as f64 / 1_000.0),
            _ => config.nominal_stc_kwp,
        };

        config
    }

    /// Completes the module, string and series counts from each other, and
    /// reports counts that don't agree.
    fn reconcile_counts(&mut self, diagnostics: &mut Diagnostics) {
        match (self.modules, self.strings, self.modules_in_series) {
            (None, Some(strings), Some(series)) => self.modules = Some(strings * series),
            (Some(modules), None, Some(series)) if series > 0 && modules % series == 0 => {
                self.strings = Some(modules / series)
            }
            (Some(modules), Some(strings), None) if strings > 0 && modules % strings == 0 => {
                self.modules_in_series = Some(modules / strings)
            }
            (Some(modules), Some(strings), Some(series)) if modules != strings * series => {
                diagnostics.push(Error::reconciliation(format!(
                    "Configuration {}: {modules} modules don't match {strings} strings of {series} modules.",
                    self.config_id
                )));
            }
            _ => {}
        }
    }
}

/// The plant totals stated in the report's summary.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PlantTotals {
    pub(crate) modules: Option<u64>,
    pub(crate) inverters: Option<u64>,
}

static TOTAL_MODULES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Number\s+of\s+PV\s+modules|Nb\.?\s+of\s+modules)\s+(\d[\d,]*)\s*units?")
        .unwrap()
});
static TOTAL_INVERTERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Number|Nb\.?)\s+of\s+inverters\s+(\d[\d,]*)\s*units?").unwrap()
});

impl PlantTotals {
    pub(crate) fn parse(summary: Option<&LocatedSection>) -> Self {
        let Some(summary) = summary else {
            return Self::default();
        };
        Self {
            modules: capture_number(&TOTAL_MODULES, &summary.text),
            inverters: capture_number(&TOTAL_INVERTERS, &summary.text),
        }
    }
}
