// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Catalogs of the distinct PV module and inverter types used in a plant.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::sections::LocatedSection;
use crate::Error;

/// A PV module type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModuleType {
    pub id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// The rated power as printed in the report, e.g. `595Wp`.
    pub unit_nom_power_raw: Option<String>,
    pub unit_nom_power_w: Option<f64>,
}

/// An inverter type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InverterType {
    pub id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// The rated power as printed in the report, e.g. `62.5kWac`.
    pub unit_nom_power_raw: Option<String>,
    pub unit_nom_power_kw: Option<f64>,
}

impl InverterType {
    /// Returns a human readable description of the inverter type.
    pub fn description(&self) -> String {
        let mut parts = vec![];
        parts.extend(self.manufacturer.as_deref());
        parts.extend(self.model.as_deref());
        let mut description = parts.join(" ");
        if let Some(kw) = self.unit_nom_power_kw {
            description.push_str(&format!(" ({kw} kWac)"));
        }
        description
    }
}

/// The labelled values of a normalized equipment section.
struct EquipmentFields {
    manufacturer: Option<String>,
    model: Option<String>,
    power_raw: Option<String>,
    power_w: Option<f64>,
}

static MANUFACTURER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Manufacturer\s+(.+?)\s*$").unwrap());
static MODEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*Model\s+(.+?)\s*$").unwrap());
static UNIT_POWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Unit\s+Nom\.?\s*Power\s+(.+?)\s*$").unwrap());
static POWER_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]*\.?[0-9]+)").unwrap());

/// Converts a rated power like `595Wp`, `62.5kWac`, `540 W` or `1.2MWp` to
/// watts.
pub(crate) fn clean_nom_power(raw: &str) -> Option<f64> {
    let lower = raw.trim().to_lowercase().replace(',', "");
    let value: f64 = POWER_VALUE.captures(&lower)?[1].parse().ok()?;
    if lower.contains("mw") {
        Some(value * 1_000_000.0)
    } else if lower.contains("kw") {
        Some(value * 1_000.0)
    } else {
        Some(value)
    }
}

impl EquipmentFields {
    fn parse(section: &LocatedSection) -> Self {
        let capture = |re: &Regex| re.captures(&section.text).map(|c| c[1].to_string());
        let power_raw = capture(&UNIT_POWER);
        Self {
            manufacturer: capture(&MANUFACTURER),
            model: capture(&MODEL),
            power_w: power_raw.as_deref().and_then(clean_nom_power),
            power_raw,
        }
    }

    fn same_as(&self, manufacturer: &Option<String>, model: &Option<String>) -> bool {
        let eq = |a: &Option<String>, b: &Option<String>| match (a, b) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        eq(&self.manufacturer, manufacturer) && eq(&self.model, model)
    }
}

/// The distinct module and inverter types found in a report.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Catalog {
    pub(crate) modules: Vec<ModuleType>,
    pub(crate) inverters: Vec<InverterType>,
}

impl Catalog {
    /// Builds the catalog from the located equipment sections.
    ///
    /// Returns an error if no module or no inverter can be identified.
    pub(crate) fn try_new(
        pv_modules: &[LocatedSection],
        inverters: &[LocatedSection],
    ) -> Result<Self, Error> {
        let mut catalog = Self::default();
        for section in pv_modules {
            catalog.add_module(EquipmentFields::parse(section));
        }
        for section in inverters {
            catalog.add_inverter(EquipmentFields::parse(section));
        }

        if catalog.modules.is_empty() {
            return Err(Error::structural("No PV module could be identified."));
        }
        if catalog.inverters.is_empty() {
            return Err(Error::structural("No inverter could be identified."));
        }
        Ok(catalog)
    }

    fn add_module(&mut self, fields: EquipmentFields) -> Option<&ModuleType> {
        if fields.model.is_none() {
            return None;
        }
        if let Some(pos) = self
            .modules
            .iter()
            .position(|m| fields.same_as(&m.manufacturer, &m.model))
        {
            return self.modules.get(pos);
        }
        self.modules.push(ModuleType {
            id: format!("M{}", self.modules.len() + 1),
            manufacturer: fields.manufacturer,
            model: fields.model,
            unit_nom_power_raw: fields.power_raw,
            unit_nom_power_w: fields.power_w,
        });
        self.modules.last()
    }

    fn add_inverter(&mut self, fields: EquipmentFields) {
        if fields.model.is_none()
            || self
                .inverters
                .iter()
                .any(|i| fields.same_as(&i.manufacturer, &i.model))
        {
            return;
        }
        self.inverters.push(InverterType {
            id: format!("I{}", self.inverters.len() + 1),
            manufacturer: fields.manufacturer,
            model: fields.model,
            unit_nom_power_raw: fields.power_raw,
            unit_nom_power_kw: fields.power_w.map(|w| w / 1_000.0),
        });
    }

    /// Returns the id of the module type an array block refers to by model
    /// name, registering it if it is new, or the only known module type if
    /// the block names none.
    pub(crate) fn resolve_module(&mut self, model: Option<&str>) -> Option<String> {
        match model {
            Some(model) => {
                let fields = EquipmentFields {
                    manufacturer: None,
                    model: Some(model.to_string()),
                    power_raw: None,
                    power_w: None,
                };
                if let Some(found) = self.modules.iter().find(|m| {
                    m.model
                        .as_deref()
                        .is_some_and(|known| known.eq_ignore_ascii_case(model))
                }) {
                    return Some(found.id.clone());
                }
                self.add_module(fields).map(|m| m.id.clone())
            }
            None => (self.modules.len() == 1).then(|| self.modules[0].id.clone()),
        }
    }

    /// Returns the id of the inverter type with the given model, falling back
    /// to the only known inverter type.
    pub(crate) fn resolve_inverter(&self, model: Option<&str>) -> Option<String> {
        model
            .and_then(|model| {
                self.inverters.iter().find(|i| {
                    i.model
                        .as_deref()
                        .is_some_and(|known| known.eq_ignore_ascii_case(model))
                })
            })
            .or_else(|| self.sole_inverter())
            .map(|i| i.id.clone())
    }

    pub(crate) fn module(&self, id: &str) -> Option<&ModuleType> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub(crate) fn inverter(&self, id: &str) -> Option<&InverterType> {
        self.inverters.iter().find(|i| i.id == id)
    }

    /// Returns the inverter type, if the plant uses only one.
    pub(crate) fn sole_inverter(&self) -> Option<&InverterType> {
        match self.inverters.as_slice() {
            [inverter] => Some(inverter),
            _ => None,
        }
    }
}
