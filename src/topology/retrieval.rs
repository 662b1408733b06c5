// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving inverters, MPPTs and shares from a [`Topology`].

use std::collections::BTreeMap;

use petgraph::Direction;

use crate::Error;

use super::{ConfigShare, InverterId, Mppt, Topology, TopologyNode};

/// Inverter and share retrieval.
impl Topology {
    /// Returns the inverters of the topology, in natural order.
    pub(crate) fn inverters(&self) -> Vec<&InverterId> {
        let mut inverters = self
            .graph
            .node_weights()
            .filter_map(|node| match node {
                TopologyNode::Inverter(id) => Some(id),
                _ => None,
            })
            .collect::<Vec<_>>();
        inverters.sort();
        inverters
    }

    /// Returns the shares connected to the MPPTs of the given inverter, by
    /// MPPT.
    ///
    /// Returns an error if the inverter is not part of the topology.
    pub(crate) fn inverter_shares(
        &self,
        inverter: &InverterId,
    ) -> Result<BTreeMap<Mppt, &ConfigShare>, Error> {
        let idx = self
            .node_indices
            .get(&TopologyNode::Inverter(inverter.clone()))
            .ok_or_else(|| Error::internal(format!("Inverter {inverter} not found.")))?;

        let mut shares = BTreeMap::new();
        for mppt_idx in self.graph.neighbors_directed(*idx, Direction::Outgoing) {
            let TopologyNode::Mppt(_, mppt) = &self.graph[mppt_idx] else {
                return Err(Error::internal(format!(
                    "Inverter {inverter} is connected to a node that is not an MPPT."
                )));
            };
            for config_idx in self.graph.neighbors_directed(mppt_idx, Direction::Outgoing) {
                if let Some(share) = self.shares.get(&(mppt_idx, config_idx)) {
                    shares.insert(*mppt, share);
                }
            }
        }
        Ok(shares)
    }

    /// Returns all shares, by inverter and MPPT.
    pub(crate) fn associations(
        &self,
    ) -> Result<BTreeMap<InverterId, BTreeMap<Mppt, ConfigShare>>, Error> {
        let mut associations = BTreeMap::new();
        for inverter in self.inverters() {
            let shares = self
                .inverter_shares(inverter)?
                .into_iter()
                .map(|(mppt, share)| (mppt, share.clone()))
                .collect::<BTreeMap<_, _>>();
            associations.insert(inverter.clone(), shares);
        }
        Ok(associations)
    }

    /// Returns the shares of the given configuration, ordered by inverter and
    /// MPPT.  Returns an empty list for unknown configurations.
    pub(crate) fn config_shares(&self, config_id: &str) -> Vec<(&InverterId, Mppt, &ConfigShare)> {
        let Some(&config_idx) = self
            .node_indices
            .get(&TopologyNode::Configuration(config_id.to_string()))
        else {
            return vec![];
        };

        let mut shares = self
            .graph
            .neighbors_directed(config_idx, Direction::Incoming)
            .filter_map(|mppt_idx| match &self.graph[mppt_idx] {
                TopologyNode::Mppt(inverter, mppt) => self
                    .shares
                    .get(&(mppt_idx, config_idx))
                    .map(|share| (inverter, *mppt, share)),
                _ => None,
            })
            .collect::<Vec<_>>();
        shares.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
        shares
    }
}
