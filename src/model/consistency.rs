// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Re-deriving a [`PlantModel`]'s totals from its parts.

use crate::{Error, ReportParserConfig};

use super::PlantModel;

/// Sums of allocated values are exact up to floating point noise.
const SUM_EPSILON: f64 = 1e-6;

impl PlantModel {
    /// Checks that the model's totals agree with their parts: inverter
    /// capacities with the `dc_kwp` of their MPPTs, configuration capacities
    /// and string counts with their associations, and the system's monthly
    /// production with the sum of the inverters' allocations.
    ///
    /// Returns the first disagreement found.
    pub fn check_consistency(&self, config: &ReportParserConfig) -> Result<(), Error> {
        self.check_inverter_capacities(config.capacity_tolerance_kwp)?;
        self.check_configurations(config)?;
        self.check_monthly_totals(config.monthly_precision)?;
        Ok(())
    }

    fn check_inverter_capacities(&self, tolerance: f64) -> Result<(), Error> {
        for (inverter, summary) in &self.inverter_summary {
            let shares = self.associations.get(inverter).ok_or_else(|| {
                Error::reconciliation(format!("Inverter {inverter} has no associations."))
            })?;
            let from_shares: f64 = shares.values().filter_map(|s| s.dc_kwp).sum();
            let from_rows: f64 = summary
                .combined_configuration
                .iter()
                .filter_map(|r| r.dc_kwp)
                .sum();
            for derived in [from_shares, from_rows] {
                if (derived - summary.capacity_kwp).abs() > tolerance {
                    return Err(Error::reconciliation(format!(
                        "Inverter {inverter}: capacity of {} kWp, but its MPPTs add up to {derived:.3} kWp.",
                        summary.capacity_kwp
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_configurations(&self, config: &ReportParserConfig) -> Result<(), Error> {
        // Every share is rounded on its own.
        let share_rounding = 0.5 * 10f64.powi(-(config.dc_kwp_precision as i32));

        for array in &self.array_configurations {
            let shares = self
                .associations
                .values()
                .flat_map(|mppts| mppts.values())
                .filter(|s| s.config_id == array.config_id)
                .collect::<Vec<_>>();
            if shares.is_empty() {
                continue;
            }

            let strings: u64 = shares.iter().map(|s| s.strings).sum();
            if Some(strings) != array.strings {
                return Err(Error::reconciliation(format!(
                    "Configuration {}: {strings} strings are connected, {:?} declared.",
                    array.config_id, array.strings
                )));
            }

            if let Some(dc_kwp) = array.dc_kwp {
                let from_shares: f64 = shares.iter().filter_map(|s| s.dc_kwp).sum();
                let tolerance =
                    config.capacity_tolerance_kwp + share_rounding * shares.len() as f64;
                if (from_shares - dc_kwp).abs() > tolerance {
                    return Err(Error::reconciliation(format!(
                        "Configuration {}: capacity of {dc_kwp} kWp, but its shares add up to {from_shares:.3} kWp.",
                        array.config_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Compares against the system values rounded to `precision` decimals,
    /// the target the allocation meets.
    fn check_monthly_totals(&self, precision: u32) -> Result<(), Error> {
        if self
            .inverter_summary
            .values()
            .all(|s| s.monthly_production.is_empty())
        {
            return Ok(());
        }
        let scale = 10f64.powi(precision as i32);
        for (month, system) in self.system_monthly_production.iter() {
            let expected = (system * scale).round() / scale;
            let allocated: f64 = self
                .inverter_summary
                .values()
                .filter_map(|s| s.monthly_production.get(month))
                .sum();
            if (allocated - expected).abs() > SUM_EPSILON * expected.abs().max(1.0) {
                return Err(Error::reconciliation(format!(
                    "{month}: the inverters' production adds up to {allocated} kWh, not {expected} kWh."
                )));
            }
        }
        Ok(())
    }
}
