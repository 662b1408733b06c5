// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The structured record of a plant, as assembled from one report.

mod assembly;
mod consistency;

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::array_config::ArrayConfiguration;
use crate::equipment::{InverterType, ModuleType};
use crate::orientation::Orientation;
use crate::production::MonthlySeries;
use crate::topology::{ConfigShare, InverterId, Mppt, TopologyInferenceDiagnostics};
use crate::Diagnostic;

/// Plant-wide totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// Module count stated in the report's summary.
    pub reported_modules: Option<u64>,
    /// Inverter count stated in the report's summary.
    pub reported_inverters: Option<u64>,
    pub configurations: usize,
    pub associations: usize,
    pub inverters: usize,
    /// Modules connected to an inverter.
    pub modules: u64,
    pub capacity_kwp: f64,
    pub annual_production_kwh: Option<f64>,
}

/// One MPPT of an inverter, with the static fields of the configuration
/// connected to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CombinedConfiguration {
    pub mppt: Mppt,
    pub config_id: String,
    pub module_type_id: Option<String>,
    pub strings: u64,
    pub modules: Option<u64>,
    pub dc_kwp: Option<f64>,
    pub tilt: Option<f64>,
    pub azimuth: Option<f64>,
    pub modules_in_series: Option<u64>,
    pub u_mpp_v: Option<f64>,
    pub i_mpp_a: Option<f64>,
}

impl CombinedConfiguration {
    fn new(mppt: Mppt, share: &ConfigShare, config: Option<&ArrayConfiguration>) -> Self {
        Self {
            mppt,
            config_id: share.config_id.clone(),
            module_type_id: config.and_then(|c| c.module_type_id.clone()),
            strings: share.strings,
            modules: share.modules,
            dc_kwp: share.dc_kwp,
            tilt: config.and_then(|c| c.tilt),
            azimuth: config.and_then(|c| c.azimuth),
            modules_in_series: config.and_then(|c| c.modules_in_series),
            u_mpp_v: config.and_then(|c| c.u_mpp_v),
            i_mpp_a: share.i_mpp_a,
        }
    }
}

/// Everything known about one inverter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InverterSummary {
    pub description: String,
    pub inverter_type_id: Option<String>,
    /// One row per MPPT, in MPPT order.
    pub combined_configuration: Vec<CombinedConfiguration>,
    /// The module type, if only one type is connected to the inverter.
    pub pv_module: Option<ModuleType>,
    /// The module types, if more than one type is connected to the inverter.
    pub pv_modules: Vec<ModuleType>,
    pub capacity_kwp: f64,
    pub annual_production_kwh: Option<f64>,
    pub specific_production_kwh_per_kwp: Option<f64>,
    pub monthly_production: MonthlySeries,
}

/// The structured record of a plant.
///
/// Built with [`PlantModel::try_new`] from the pages and tables of one
/// report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlantModel {
    pub metadata: Metadata,
    /// The module type, if the plant uses only one.
    pub pv_module: Option<ModuleType>,
    pub module_types: Vec<ModuleType>,
    /// The inverter type, if the plant uses only one.
    pub inverter: Option<InverterType>,
    pub inverter_types: Vec<InverterType>,
    #[serde(serialize_with = "by_config_id")]
    pub array_configurations: Vec<ArrayConfiguration>,
    pub associations: BTreeMap<InverterId, BTreeMap<Mppt, ConfigShare>>,
    pub inverter_summary: BTreeMap<InverterId, InverterSummary>,
    pub system_monthly_production: MonthlySeries,
    pub system_monthly_globhor: Option<MonthlySeries>,
    pub orientations: Vec<Orientation>,
    /// Present only when the topology had to be inferred.
    pub topology_inference: Option<TopologyInferenceDiagnostics>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Serializes the configurations as a map keyed by `config_id`, in report
/// order.
fn by_config_id<S: Serializer>(
    configs: &[ArrayConfiguration],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(configs.len()))?;
    for config in configs {
        map.serialize_entry(&config.config_id, config)?;
    }
    map.end()
}

impl PlantModel {
    /// Returns the configuration with the given id, if it exists.
    pub fn array_configuration(&self, config_id: &str) -> Option<&ArrayConfiguration> {
        self.array_configurations
            .iter()
            .find(|c| c.config_id == config_id)
    }
}
