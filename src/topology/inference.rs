// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Inference of the MPPT topology of plants whose report has no per-array
//! blocks, from the known characteristics of their inverter family.

use serde::Serialize;

use crate::array_config::ArrayConfiguration;
use crate::equipment::InverterType;
use crate::error::Diagnostics;
use crate::Error;

use super::InverterId;

/// The MPPT topology shared by the inverters of a family.
#[derive(Clone, Debug, PartialEq)]
pub struct InverterFamily {
    pub name: String,
    /// Case-insensitive fragments of the manufacturer or model name that
    /// identify the family.
    pub patterns: Vec<String>,
    pub mppts_per_inverter: u32,
    pub max_strings_per_mppt: u32,
}

impl InverterFamily {
    pub fn new(
        name: impl Into<String>,
        patterns: &[&str],
        mppts_per_inverter: u32,
        max_strings_per_mppt: u32,
    ) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
            mppts_per_inverter,
            max_strings_per_mppt,
        }
    }

    /// The families known out of the box.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new("SMA Core1", &["core1", "core 1", "core-1"], 6, 2),
            Self::new("CHINT/CPS", &["chint", "cps"], 3, 6),
        ]
    }

    /// Returns true if the given inverter description belongs to the family.
    pub fn matches(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        self.patterns.iter().any(|p| description.contains(p.as_str()))
    }

    fn strings_per_inverter(&self) -> u64 {
        u64::from(self.mppts_per_inverter) * u64::from(self.max_strings_per_mppt)
    }
}

/// How the inverter count of a plant was inferred.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopologyInferenceDiagnostics {
    pub inverter_family: String,
    pub inferred_inverters_reported: Option<u64>,
    pub inferred_inverters_required: u64,
    pub inferred_inverters_used: u64,
}

/// Assigns inverters and MPPTs to the single configuration of a plant.
///
/// The plant needs at least as many inverters as it takes to host all its
/// strings without exceeding the family's per-MPPT limit, and at least as
/// many as the report states.  The strings are later spread over all MPPTs
/// of those inverters.
pub(crate) fn infer_topology(
    config: &mut ArrayConfiguration,
    inverter: Option<&InverterType>,
    reported_inverters: Option<u64>,
    families: &[InverterFamily],
    diagnostics: &mut Diagnostics,
) -> Result<TopologyInferenceDiagnostics, Error> {
    let description = inverter
        .map(InverterType::description)
        .ok_or_else(|| Error::topology_unknown("Can't infer the topology of an unknown inverter."))?;
    let family = families
        .iter()
        .find(|f| f.matches(&description))
        .ok_or_else(|| {
            Error::topology_unknown(format!(
                "Can't infer the topology of `{description}`: unknown inverter family."
            ))
        })?;
    let strings = config.strings.filter(|s| *s > 0).ok_or_else(|| {
        Error::topology_unknown("Can't infer the topology: the report states no string count.")
    })?;
    if family.strings_per_inverter() == 0 {
        return Err(Error::topology_unknown(format!(
            "Inverter family {} can't host any strings.",
            family.name
        )));
    }

    let required = strings.div_ceil(family.strings_per_inverter());
    let used = required.max(reported_inverters.unwrap_or(0));
    match reported_inverters {
        Some(reported) if reported < required => {
            diagnostics.push(Error::reconciliation(format!(
                "{reported} inverters reported, but {required} {} inverters are required for {strings} strings.",
                family.name
            )));
        }
        None => tracing::debug!("No inverter count reported, using {required}."),
        _ => {}
    }
    tracing::info!(
        "Inferred {used} {} inverters with {} MPPTs each for {strings} strings.",
        family.name,
        family.mppts_per_inverter
    );

    config.inverters = (1..=used)
        .map(|n| InverterId::new(format!("INV{n:02}")))
        .collect();
    config.mppts = (1..=family.mppts_per_inverter).collect();
    config.mppts_per_inverter = Some(family.mppts_per_inverter);

    Ok(TopologyInferenceDiagnostics {
        inverter_family: family.name.clone(),
        inferred_inverters_reported: reported_inverters,
        inferred_inverters_required: required,
        inferred_inverters_used: used,
    })
}
