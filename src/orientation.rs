// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Plane orientations, and the conversion between the report's azimuth
//! convention and compass azimuths.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::array_config::ArrayConfiguration;
use crate::sections::LocatedSection;

/// Converts an azimuth in the report's convention (0° is south, east is
/// negative) to a compass azimuth (0° is north, clockwise).
pub fn compass_azimuth(pvsyst_deg: f64) -> f64 {
    (180.0 + pvsyst_deg).rem_euclid(360.0)
}

/// Converts a compass azimuth to the report's convention, in `(-180, 180]`.
pub fn pvsyst_azimuth(compass_deg: f64) -> f64 {
    let azimuth = (compass_deg - 180.0).rem_euclid(360.0);
    if azimuth > 180.0 {
        azimuth - 360.0
    } else {
        azimuth
    }
}

/// A plane orientation, as listed in the report's orientation table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Orientation {
    pub id: String,
    pub description: Option<String>,
    pub tilt: Option<f64>,
    pub azimuth_pvsyst_deg: Option<f64>,
    /// Compass azimuth.
    pub azimuth_deg: Option<f64>,
}

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Orientation\s*#\s*\d+[ \t]*([^\n]*)").unwrap());
pub(crate) static TILT_AZIMUTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Tilt\s*/\s*Azimuth\s+(-?[\d.]+)\s*/\s*(-?[\d.]+)").unwrap()
});
pub(crate) static PLANE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Tilt\s+(-?[\d.]+)\s*°?\s*Azimuth\s+(-?[\d.]+)").unwrap());

/// Reads the tilt and the azimuth, in the report's convention, from either
/// the `Tilt/Azimuth t / a°` or the `Tilt t° Azimuth a°` form.
pub(crate) fn tilt_azimuth(text: &str) -> Option<(f64, f64)> {
    let caps = TILT_AZIMUTH
        .captures(text)
        .or_else(|| PLANE.captures(text))?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

impl Orientation {
    pub(crate) fn parse(section: &LocatedSection) -> Option<Self> {
        let id = section.label.clone()?;
        let description = HEADER
            .captures(&section.text)
            .map(|c| c[1].trim().to_string())
            .filter(|d| !d.is_empty());
        let angles = tilt_azimuth(&section.text);
        Some(Self {
            id,
            description,
            tilt: angles.map(|(t, _)| t),
            azimuth_pvsyst_deg: angles.map(|(_, a)| a),
            azimuth_deg: angles.map(|(_, a)| compass_azimuth(a)),
        })
    }
}

/// Fills in the tilt and azimuth of configurations that don't state them,
/// from the orientation they reference, or from the only orientation of the
/// plant.
pub(crate) fn backfill(configs: &mut [ArrayConfiguration], orientations: &[Orientation]) {
    let only = match orientations {
        [orientation] => Some(orientation),
        _ => None,
    };
    for config in configs.iter_mut().filter(|c| c.tilt.is_none()) {
        let referenced = config
            .orientation_id
            .as_deref()
            .and_then(|id| orientations.iter().find(|o| o.id == id));
        let Some(orientation) = referenced.or(only) else {
            continue;
        };
        tracing::debug!(
            "Configuration {} takes its orientation from orientation {}.",
            config.config_id,
            orientation.id
        );
        config.tilt = orientation.tilt;
        config.azimuth_pvsyst_deg = orientation.azimuth_pvsyst_deg;
        config.azimuth = orientation.azimuth_deg;
    }
}
