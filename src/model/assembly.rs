// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for assembling a [`PlantModel`] from the pages and tables of a
//! report.

use std::collections::BTreeMap;

use crate::array_config::{ArrayConfiguration, PlantTotals};
use crate::equipment::Catalog;
use crate::error::Diagnostics;
use crate::orientation::{self, Orientation};
use crate::production::{allocate, round_to, Balances, MonthlySeries};
use crate::sections::{ReportContent, ReportSections};
use crate::topology::{
    infer_topology, ConfigShare, InverterId, Mppt, Topology, TopologyInferenceDiagnostics,
};
use crate::{Error, Page, ReportParserConfig, Table};

use super::{CombinedConfiguration, InverterSummary, Metadata, PlantModel};

/// `PlantModel` instantiation.
impl PlantModel {
    /// Creates a new [`PlantModel`] from the given pages and tables of a
    /// report.
    ///
    /// Returns an error if the report doesn't identify its PV module and
    /// inverter.  Any other problem is reported in the model's `diagnostics`,
    /// next to the best-effort values.
    pub fn try_new<P, T, PageIterator, TableIterator>(
        pages: PageIterator,
        tables: TableIterator,
        config: ReportParserConfig,
    ) -> Result<Self, Error>
    where
        P: Page,
        T: Table,
        PageIterator: IntoIterator<Item = P>,
        TableIterator: IntoIterator<Item = T>,
    {
        let content = ReportContent::new(pages, tables);
        let sections = ReportSections::locate(&content);
        let mut diagnostics = Diagnostics::default();

        let mut catalog = Catalog::try_new(&sections.pv_modules, &sections.inverters)?;
        let orientations = sections
            .orientations
            .iter()
            .filter_map(Orientation::parse)
            .collect::<Vec<_>>();
        let totals = PlantTotals::parse(sections.summary.as_ref());

        let (mut configs, topology_inference) =
            build_configurations(&sections, &mut catalog, &totals, &config, &mut diagnostics);
        orientation::backfill(&mut configs, &orientations);

        let topology = match Topology::try_new(&configs, &config, &mut diagnostics) {
            Ok(topology) => topology,
            Err(err) => {
                diagnostics.push(err);
                Topology::default()
            }
        };
        let associations = topology.associations()?;
        tracing::debug!(
            "Connected {} configuration(s) to {} inverter(s).",
            configs.len(),
            associations.len()
        );

        let balances = sections
            .monthly_production
            .as_ref()
            .map(|section| Balances::parse(section, &config.months))
            .unwrap_or_default();
        let mut monthly = allocate_production(
            &balances.production,
            &associations,
            &totals,
            &config,
            &mut diagnostics,
        );

        let inverter_summary = associations
            .iter()
            .map(|(inverter, shares)| {
                let summary = summarize(
                    shares,
                    &configs,
                    &catalog,
                    monthly.remove(inverter).unwrap_or_default(),
                    &config,
                );
                (inverter.clone(), summary)
            })
            .collect::<BTreeMap<_, _>>();

        let capacity_kwp = round_to(
            inverter_summary.values().map(|s| s.capacity_kwp).sum(),
            config.dc_kwp_precision,
        );
        let metadata = Metadata {
            reported_modules: totals.modules,
            reported_inverters: totals.inverters,
            configurations: configs.len(),
            associations: associations.values().map(BTreeMap::len).sum(),
            inverters: associations.len(),
            modules: module_counts(&associations).values().sum(),
            capacity_kwp,
            annual_production_kwh: (!balances.production.is_empty())
                .then(|| round_to(balances.production.total(), config.monthly_precision)),
        };

        let mut model = Self {
            metadata,
            pv_module: match catalog.modules.as_slice() {
                [module] => Some(module.clone()),
                _ => None,
            },
            inverter: catalog.sole_inverter().cloned(),
            module_types: catalog.modules,
            inverter_types: catalog.inverters,
            array_configurations: configs,
            associations,
            inverter_summary,
            system_monthly_production: balances.production,
            system_monthly_globhor: (!balances.globhor.is_empty()).then_some(balances.globhor),
            orientations,
            topology_inference,
            diagnostics: vec![],
        };

        if let Err(err) = model.check_consistency(&config) {
            diagnostics.push(err);
        }
        model.diagnostics = diagnostics.into_inner();

        tracing::info!(
            "Assembled a plant model with {} inverter(s), {} configuration(s) and {} diagnostic(s).",
            model.metadata.inverters,
            model.metadata.configurations,
            model.diagnostics.len()
        );

        Ok(model)
    }
}

/// Builds the array configurations from the per-array blocks, or when there
/// are none, the single configuration of the plant with an inferred
/// topology.
fn build_configurations(
    sections: &ReportSections,
    catalog: &mut Catalog,
    totals: &PlantTotals,
    config: &ReportParserConfig,
    diagnostics: &mut Diagnostics,
) -> (Vec<ArrayConfiguration>, Option<TopologyInferenceDiagnostics>) {
    if !sections.arrays.is_empty() {
        let mut configs = vec![];
        for block in &sections.arrays {
            match ArrayConfiguration::from_block(block, catalog, diagnostics) {
                Ok(array) => configs.push(array),
                Err(err) => diagnostics.push(err),
            }
        }
        return (configs, None);
    }

    let Some(summary) = &sections.summary else {
        diagnostics.push(Error::topology_unknown(
            "The report has neither per-array blocks nor a plant summary.",
        ));
        return (vec![], None);
    };

    tracing::debug!("No per-array blocks found, inferring the topology.");
    let mut single = ArrayConfiguration::from_summary(summary, catalog, diagnostics);
    let inverter = single
        .inverter_type_id
        .as_deref()
        .and_then(|id| catalog.inverter(id));
    match infer_topology(
        &mut single,
        inverter,
        totals.inverters,
        &config.inverter_families,
        diagnostics,
    ) {
        Ok(inference) => (vec![single], Some(inference)),
        Err(err) => {
            diagnostics.push(err);
            (vec![single], None)
        }
    }
}

/// Returns the number of modules connected to each inverter.
pub(super) fn module_counts(
    associations: &BTreeMap<InverterId, BTreeMap<Mppt, ConfigShare>>,
) -> BTreeMap<InverterId, u64> {
    associations
        .iter()
        .map(|(inverter, shares)| {
            (
                inverter.clone(),
                shares.values().filter_map(|s| s.modules).sum(),
            )
        })
        .collect()
}

fn allocate_production(
    system: &MonthlySeries,
    associations: &BTreeMap<InverterId, BTreeMap<Mppt, ConfigShare>>,
    totals: &PlantTotals,
    config: &ReportParserConfig,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<InverterId, MonthlySeries> {
    if system.is_empty() || associations.is_empty() {
        return BTreeMap::new();
    }

    let modules = module_counts(associations);
    let connected: u64 = modules.values().sum();
    if let Some(reported) = totals.modules.filter(|r| *r != connected) {
        diagnostics.push(Error::reconciliation(format!(
            "The report states {reported} modules, but {connected} are connected to inverters."
        )));
    }

    match allocate(system, &modules, config.monthly_precision, &config.months) {
        Ok(monthly) => monthly,
        Err(err) => {
            diagnostics.push(err);
            BTreeMap::new()
        }
    }
}

fn summarize(
    shares: &BTreeMap<Mppt, ConfigShare>,
    configs: &[ArrayConfiguration],
    catalog: &Catalog,
    monthly_production: MonthlySeries,
    config: &ReportParserConfig,
) -> InverterSummary {
    let find_config = |id: &str| configs.iter().find(|c| c.config_id == id);
    let rows = shares
        .iter()
        .map(|(mppt, share)| CombinedConfiguration::new(*mppt, share, find_config(&share.config_id)))
        .collect::<Vec<_>>();
    let capacity_kwp = round_to(
        rows.iter().filter_map(|r| r.dc_kwp).sum(),
        config.dc_kwp_precision,
    );

    let mut module_ids = rows
        .iter()
        .filter_map(|r| r.module_type_id.as_deref())
        .collect::<Vec<_>>();
    module_ids.sort();
    module_ids.dedup();
    let mut module_types = module_ids
        .into_iter()
        .filter_map(|id| catalog.module(id))
        .cloned()
        .collect::<Vec<_>>();
    let pv_module = if module_types.len() == 1 {
        module_types.pop()
    } else {
        None
    };

    let inverter_type = rows
        .iter()
        .filter_map(|r| find_config(&r.config_id))
        .find_map(|c| c.inverter_type_id.as_deref())
        .and_then(|id| catalog.inverter(id));

    let annual_production_kwh = (!monthly_production.is_empty())
        .then(|| round_to(monthly_production.total(), config.monthly_precision));
    let specific_production_kwh_per_kwp = annual_production_kwh
        .filter(|_| capacity_kwp > 0.0)
        .map(|annual| round_to(annual / capacity_kwp, 2));

    InverterSummary {
        description: inverter_type
            .map(|t| t.description())
            .unwrap_or_else(|| String::from("Unknown inverter")),
        inverter_type_id: inverter_type.map(|t| t.id.clone()),
        combined_configuration: rows,
        pv_module,
        pv_modules: module_types,
        capacity_kwp,
        annual_production_kwh,
        specific_production_kwh_per_kwp,
        monthly_production,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        pages, tables, TestTable, SINGLE_ARRAY_CPS_V7, SMA_V6, SMA_V7, SMA_V7_TABLES,
    };
    use crate::{ErrorKind, InverterFamily, Month};

    fn model(texts: &[&str]) -> PlantModel {
        PlantModel::try_new(pages(texts), Vec::<TestTable>::new(), ReportParserConfig::default())
            .unwrap()
    }

    fn replaced(texts: &[&str], from: &str, to: &str) -> Vec<String> {
        texts.iter().map(|t| t.replace(from, to)).collect()
    }

    fn january(model: &PlantModel, inverter: &str) -> Option<f64> {
        model.inverter_summary[&InverterId::new(inverter)]
            .monthly_production
            .get(Month::January)
    }

    #[test]
    fn test_multi_array_report() {
        let model = model(SMA_V7);
        assert!(model.diagnostics.is_empty());
        assert!(model.topology_inference.is_none());

        assert_eq!(model.metadata.configurations, 3);
        assert_eq!(model.metadata.inverters, 8);
        assert_eq!(model.metadata.associations, 45);
        assert_eq!(model.metadata.modules, 1530);
        assert_eq!(model.metadata.reported_modules, Some(1530));
        assert_eq!(model.metadata.reported_inverters, Some(8));
        assert_eq!(model.metadata.capacity_kwp, 910.35);
        assert_eq!(model.metadata.annual_production_kwh, Some(569629.0));

        assert_eq!(
            model.pv_module.as_ref().and_then(|m| m.model.as_deref()),
            Some("Q.Peak-Duo-XL-G11S.3 / BFG-595")
        );
        assert_eq!(
            model.inverter.as_ref().map(|i| i.id.as_str()),
            Some("I1")
        );

        assert_eq!(
            model.associations.keys().map(|i| i.as_str()).collect::<Vec<_>>(),
            ["INV01", "INV02", "INV03", "INV04", "INV05", "INV06", "INV07", "INV08"]
        );
        let share = &model.associations[&InverterId::new("INV01")][&Mppt(1)];
        assert_eq!(share.config_id, "1");
        assert_eq!(share.strings, 2);
        assert_eq!(share.modules, Some(36));
        assert_eq!(share.dc_kwp, Some(21.42));
        assert!((share.i_mpp_a.unwrap() - 33.0).abs() < 1e-9);

        // The 70 strings of configuration 2 don't divide evenly over its 36
        // MPPTs: the last two get one string each.
        let inv08 = &model.associations[&InverterId::new("INV08")];
        assert_eq!(
            inv08.values().map(|s| s.strings).collect::<Vec<_>>(),
            [2, 2, 2, 2, 1, 1]
        );
        assert_eq!(model.associations[&InverterId::new("INV06")].len(), 3);

        let summary = &model.inverter_summary[&InverterId::new("INV01")];
        assert_eq!(
            summary.description,
            "SMA Sunny Tripower_Core1 62-US-41 (62.5 kWac)"
        );
        assert_eq!(summary.capacity_kwp, 128.52);
        assert_eq!(summary.combined_configuration.len(), 6);
        assert_eq!(summary.combined_configuration[0].u_mpp_v, Some(596.0));
        assert_eq!(summary.annual_production_kwh, Some(80424.0));
        assert!((summary.specific_production_kwh_per_kwp.unwrap() - 625.77).abs() < 1e-9);
        assert!(summary.pv_module.is_some());
        assert!(summary.pv_modules.is_empty());

        assert_eq!(january(&model, "INV01"), Some(4914.0));
        assert_eq!(january(&model, "INV02"), Some(4914.0));
        assert_eq!(january(&model, "INV06"), Some(1228.0));
        assert_eq!(january(&model, "INV08"), Some(4095.0));
        assert_eq!(
            model.inverter_summary[&InverterId::new("INV08")].annual_production_kwh,
            Some(67016.0)
        );
        assert_eq!(model.inverter_summary[&InverterId::new("INV08")].capacity_kwp, 107.1);

        // The third array has no angles of its own.
        let array = model.array_configuration("3").unwrap();
        assert_eq!(array.tilt, Some(15.0));
        assert_eq!(array.azimuth, Some(90.0));
        assert_eq!(array.azimuth_pvsyst_deg, Some(-90.0));
        let row = &model.inverter_summary[&InverterId::new("INV06")].combined_configuration[0];
        assert_eq!(row.tilt, Some(15.0));
        assert_eq!(row.azimuth, Some(90.0));

        assert_eq!(model.system_monthly_production.len(), 12);
        assert_eq!(
            model
                .system_monthly_globhor
                .as_ref()
                .and_then(|g| g.get(Month::January)),
            Some(96.1)
        );
        assert_eq!(model.orientations.len(), 2);
    }

    #[test]
    fn test_tables_agree_with_text() {
        let from_text = model(SMA_V7);
        let from_tables = PlantModel::try_new(
            pages(SMA_V7),
            tables(SMA_V7_TABLES),
            ReportParserConfig::default(),
        )
        .unwrap();
        assert_eq!(from_text, from_tables);
    }

    #[test]
    fn test_sub_array_report() {
        let model = model(SMA_V6);
        assert!(model.diagnostics.is_empty());
        assert_eq!(model.metadata.configurations, 2);
        assert_eq!(model.metadata.inverters, 3);
        assert_eq!(model.metadata.associations, 8);
        assert_eq!(model.metadata.modules, 234);
        assert_eq!(model.metadata.reported_modules, None);

        assert_eq!(
            model.associations[&InverterId::new("INV02")]
                .values()
                .map(|s| s.strings)
                .collect::<Vec<_>>(),
            [2, 2, 2]
        );
        assert_eq!(
            model.associations[&InverterId::new("INV03")]
                .values()
                .map(|s| s.strings)
                .collect::<Vec<_>>(),
            [1, 1, 1]
        );
        assert_eq!(model.inverter_summary[&InverterId::new("INV01")].capacity_kwp, 28.8);
        assert_eq!(model.inverter_summary[&InverterId::new("INV02")].capacity_kwp, 43.2);

        assert_eq!(january(&model, "INV01"), Some(10710.0));
        assert_eq!(january(&model, "INV02"), Some(16065.0));
        assert_eq!(january(&model, "INV03"), Some(8032.0));
        assert_eq!(
            model.inverter_summary[&InverterId::new("INV02")].annual_production_kwh,
            Some(262903.0)
        );

        // Both sub-arrays take the angles of the single plane.
        for array in &model.array_configurations {
            assert_eq!(array.tilt, Some(20.0));
            assert_eq!(array.azimuth, Some(170.0));
        }
    }

    #[test]
    fn test_inferred_topology() {
        let model = model(SINGLE_ARRAY_CPS_V7);

        let inference = model.topology_inference.as_ref().unwrap();
        assert_eq!(inference.inverter_family, "CHINT/CPS");
        assert_eq!(inference.inferred_inverters_reported, Some(16));
        assert_eq!(inference.inferred_inverters_required, 17);
        assert_eq!(inference.inferred_inverters_used, 17);

        assert_eq!(model.diagnostics.len(), 1);
        assert_eq!(model.diagnostics[0].kind, ErrorKind::Reconciliation);

        assert_eq!(model.metadata.configurations, 1);
        assert_eq!(model.metadata.inverters, 17);
        assert_eq!(model.metadata.associations, 51);
        assert_eq!(model.metadata.modules, 5400);

        let inv01 = &model.associations[&InverterId::new("INV01")];
        assert_eq!(inv01.values().map(|s| s.strings).collect::<Vec<_>>(), [6, 6, 6]);
        let inv17 = &model.associations[&InverterId::new("INV17")];
        assert_eq!(inv17.values().map(|s| s.strings).collect::<Vec<_>>(), [5, 5, 5]);
        assert!(inv17.values().all(|s| s.modules == Some(90)));

        assert_eq!(january(&model, "INV01"), Some(2095.0));
        assert_eq!(january(&model, "INV17"), Some(1740.0));

        let array = model.array_configuration("1").unwrap();
        assert_eq!(array.inverters.len(), 17);
        assert_eq!(array.mppts, [1, 2, 3]);
        assert_eq!(array.tilt, Some(20.0));
    }

    #[test]
    fn test_unknown_inverter_family() {
        let texts = replaced(SINGLE_ARRAY_CPS_V7, "CHINT POWER SYSTEMS", "Huawei");
        let texts = texts
            .iter()
            .map(|t| t.replace("CPS SCA50KTL-DO/US-480", "SUN2000-100KTL"))
            .collect::<Vec<_>>();
        let model = PlantModel::try_new(
            pages(&texts),
            Vec::<TestTable>::new(),
            ReportParserConfig::default(),
        )
        .unwrap();

        assert!(model.topology_inference.is_none());
        assert_eq!(model.diagnostics[0].kind, ErrorKind::TopologyUnknown);
        assert!(model.diagnostics[0].message.contains("unknown inverter family"));

        // The configuration is kept, without associations.
        assert_eq!(model.metadata.configurations, 1);
        assert_eq!(model.array_configuration("1").unwrap().strings, Some(300));
        assert!(model.associations.is_empty());
        assert!(model.inverter_summary.is_empty());
        assert_eq!(model.system_monthly_production.len(), 12);
    }

    #[test]
    fn test_custom_inverter_family() {
        let config = ReportParserConfig {
            inverter_families: vec![InverterFamily::new("CHINT/CPS", &["cps"], 2, 10)],
            ..Default::default()
        };
        let model =
            PlantModel::try_new(pages(SINGLE_ARRAY_CPS_V7), Vec::<TestTable>::new(), config)
                .unwrap();
        let inference = model.topology_inference.unwrap();
        assert_eq!(inference.inferred_inverters_required, 15);
        assert_eq!(inference.inferred_inverters_used, 16);
        assert_eq!(model.metadata.associations, 32);
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn test_notation_error_keeps_other_arrays() {
        let texts = replaced(SMA_V7, "INV06 MPPT", "INV06- MPPT");
        let model = PlantModel::try_new(
            pages(&texts),
            Vec::<TestTable>::new(),
            ReportParserConfig::default(),
        )
        .unwrap();

        assert_eq!(
            model
                .diagnostics
                .iter()
                .map(|d| d.kind)
                .collect::<Vec<_>>(),
            [ErrorKind::Notation, ErrorKind::Reconciliation]
        );
        assert_eq!(
            model.diagnostics[1].message,
            "The report states 1530 modules, but 1476 are connected to inverters."
        );
        assert_eq!(model.metadata.configurations, 2);
        assert_eq!(model.metadata.inverters, 7);
        assert!(!model.associations.contains_key(&InverterId::new("INV06")));

        // The plant's production is still fully allocated.
        let allocated: f64 = model
            .inverter_summary
            .values()
            .filter_map(|s| s.monthly_production.get(Month::January))
            .sum();
        assert_eq!(allocated, 34807.0);
    }

    #[test]
    fn test_mppt_collision_is_a_warning() {
        let texts = replaced(SMA_V7, "Array #3 - INV06 MPPT 1-3", "Array #3 - INV01 MPPT 6-7");
        let model = PlantModel::try_new(
            pages(&texts),
            Vec::<TestTable>::new(),
            ReportParserConfig::default(),
        )
        .unwrap();

        assert_eq!(model.diagnostics.len(), 1);
        assert_eq!(model.diagnostics[0].kind, ErrorKind::Reconciliation);
        assert_eq!(
            model.diagnostics[0].message,
            "MPPT 6 of INV01 is already used; configuration 3 is connected to MPPT 8 instead."
        );

        // All strings of the third array are still connected.
        let inv01 = &model.associations[&InverterId::new("INV01")];
        assert_eq!(inv01.len(), 8);
        assert_eq!(inv01[&Mppt(7)].strings, 1);
        assert_eq!(inv01[&Mppt(8)].strings, 2);
        assert_eq!(model.metadata.inverters, 7);
        assert_eq!(model.metadata.modules, 1530);
        assert_eq!(model.inverter_summary[&InverterId::new("INV01")].capacity_kwp, 160.65);
    }

    #[test]
    fn test_missing_equipment() {
        let result = PlantModel::try_new(
            pages(&["Nothing to see here."]),
            Vec::<TestTable>::new(),
            ReportParserConfig::default(),
        );
        assert!(result.is_err_and(|e| e.kind() == ErrorKind::Structural));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(model(SMA_V7)).unwrap();

        let share = &json["associations"]["INV01"]["MPPT 1"];
        assert_eq!(share["config_id"], "1");
        assert_eq!(share["strings"], 2);
        assert_eq!(share["modules"], 36);

        assert_eq!(json["array_configurations"]["2"]["inverter_notation"], "INV02-05, 7,8");
        assert_eq!(json["array_configurations"]["3"]["u_mpp_v"], serde_json::Value::Null);
        assert_eq!(json["inverter_summary"]["INV06"]["monthly_production"]["January"], 1228.0);
        assert_eq!(json["system_monthly_production"]["December"], 30410.0);
        assert_eq!(json["topology_inference"], serde_json::Value::Null);
        assert_eq!(json["diagnostics"], serde_json::json!([]));
        assert_eq!(
            json["inverter_summary"]["INV01"]["combined_configuration"][0]["mppt"],
            "MPPT 1"
        );
    }
}
