// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating a [`Topology`] from array configurations: the
//! association of every configuration's strings to inverter MPPT inputs.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::array_config::ArrayConfiguration;
use crate::error::Diagnostics;
use crate::production::round_to;
use crate::{Error, ErrorKind, ReportParserConfig};

use super::{ConfigShare, InverterId, Mppt, Topology, TopologyNode};

/// `Topology` instantiation.
impl Topology {
    /// Creates a new [`Topology`] connecting the strings of the given
    /// configurations to inverter MPPTs.
    ///
    /// Configurations that can't be connected are left out and reported in
    /// `diagnostics`, and so are string totals that don't add up.  Returns an
    /// error only if the resulting graph is malformed.
    pub(crate) fn try_new(
        configs: &[ArrayConfiguration],
        config: &ReportParserConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let mut topology = Self::default();
        for array in configs {
            if let Err(err) = topology.add_configuration(array, config.dc_kwp_precision, diagnostics)
            {
                diagnostics.push(err);
            }
        }

        match topology.validate(configs) {
            Err(err) if err.kind() == ErrorKind::Reconciliation => diagnostics.push(err),
            result => result?,
        }

        Ok(topology)
    }

    fn add_configuration(
        &mut self,
        array: &ArrayConfiguration,
        dc_kwp_precision: u32,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        let id = &array.config_id;
        if array.inverters.is_empty() {
            return Err(Error::reconciliation(format!(
                "Configuration {id} names no inverter; it is left out of the associations."
            )));
        }

        let slots = self.slots(array, diagnostics);
        let total = array.strings.unwrap_or(0);
        if total == 0 {
            return Err(Error::reconciliation(format!(
                "Configuration {id} has no strings to connect to its {} MPPT input(s).",
                slots.len()
            )));
        }

        // Even split, the remainder going to the earliest slots.
        let base = total / slots.len() as u64;
        let remainder = (total % slots.len() as u64) as usize;

        let config_idx = self.node(TopologyNode::Configuration(id.clone()));
        for (pos, (inverter, mppt)) in slots.into_iter().enumerate() {
            let strings = base + u64::from(pos < remainder);
            if strings == 0 {
                tracing::debug!("Configuration {id}: no strings left for {mppt} of {inverter}.");
                continue;
            }
            let fraction = strings as f64 / total as f64;
            let share = ConfigShare {
                config_id: id.clone(),
                strings,
                modules: array.modules_in_series.map(|series| series * strings),
                dc_kwp: array
                    .dc_kwp
                    .map(|dc| round_to(dc * fraction, dc_kwp_precision)),
                i_mpp_a: array.i_mpp_a.map(|i| i / total as f64 * strings as f64),
            };

            let inverter_idx = self.node(TopologyNode::Inverter(inverter.clone()));
            let mppt_idx = self.node(TopologyNode::Mppt(inverter, mppt));
            self.graph.update_edge(inverter_idx, mppt_idx, ());
            self.graph.update_edge(mppt_idx, config_idx, ());
            self.shares.insert((mppt_idx, config_idx), share);
        }

        Ok(())
    }

    fn node(&mut self, node: TopologyNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_indices.insert(node, idx);
        idx
    }

    fn is_used(&self, inverter: &InverterId, mppt: Mppt) -> bool {
        self.node_indices
            .contains_key(&TopologyNode::Mppt(inverter.clone(), mppt))
    }

    /// Returns the `(inverter, MPPT)` slots of a configuration, inverter-major
    /// and MPPT-minor.
    ///
    /// MPPTs already used by an earlier configuration, and MPPTs of
    /// configurations that don't name them, are replaced with the next MPPT
    /// number of the inverter that is neither used nor requested by the
    /// configuration itself.
    fn slots(
        &self,
        array: &ArrayConfiguration,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(InverterId, Mppt)> {
        let requested = array.mppts.iter().map(|&n| Mppt(n)).collect::<HashSet<_>>();
        let mut slots = vec![];
        for inverter in &array.inverters {
            let mut claimed = HashSet::new();
            let next_free = |claimed: &HashSet<Mppt>| {
                (1..=u32::MAX).map(Mppt).find(|m| {
                    !claimed.contains(m) && !requested.contains(m) && !self.is_used(inverter, *m)
                })
            };
            let no_free_mppt = || {
                Error::reconciliation(format!(
                    "{inverter} has no free MPPT left for configuration {}.",
                    array.config_id
                ))
            };

            if array.mppts.is_empty() {
                let count = array.mppts_per_inverter.unwrap_or(1).max(1);
                for _ in 0..count {
                    let Some(mppt) = next_free(&claimed) else {
                        diagnostics.push(no_free_mppt());
                        break;
                    };
                    claimed.insert(mppt);
                    slots.push((inverter.clone(), mppt));
                }
                tracing::debug!(
                    "Configuration {} names no MPPT, using {} MPPT(s) of {inverter}.",
                    array.config_id,
                    count
                );
                continue;
            }

            for &number in &array.mppts {
                let wanted = Mppt(number);
                if !self.is_used(inverter, wanted) {
                    claimed.insert(wanted);
                    slots.push((inverter.clone(), wanted));
                    continue;
                }
                let Some(free) = next_free(&claimed) else {
                    diagnostics.push(no_free_mppt());
                    continue;
                };
                diagnostics.push(Error::reconciliation(format!(
                    "{wanted} of {inverter} is already used; configuration {} is connected to {free} instead.",
                    array.config_id
                )));
                claimed.insert(free);
                slots.push((inverter.clone(), free));
            }
        }
        slots
    }
}
