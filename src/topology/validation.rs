// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating a [`Topology`].

use petgraph::Direction;

use crate::array_config::ArrayConfiguration;
use crate::Error;

use super::{Topology, TopologyNode};

struct TopologyValidator<'a> {
    topology: &'a Topology,
}

impl Topology {
    /// Checks that every MPPT feeds from exactly one configuration, and that
    /// the strings of each connected configuration are all accounted for.
    pub(crate) fn validate(&self, configs: &[ArrayConfiguration]) -> Result<(), Error> {
        let validator = TopologyValidator { topology: self };

        validator.validate_mppts()?;
        validator.validate_string_totals(configs)?;

        Ok(())
    }
}

impl TopologyValidator<'_> {
    fn validate_mppts(&self) -> Result<(), Error> {
        let graph = &self.topology.graph;
        for idx in graph.node_indices() {
            let TopologyNode::Mppt(inverter, mppt) = &graph[idx] else {
                continue;
            };
            let configs = graph.neighbors_directed(idx, Direction::Outgoing).count();
            if configs != 1 {
                return Err(Error::internal(format!(
                    "{mppt} of {inverter} is connected to {configs} configurations."
                )));
            }
            let inverters = graph.neighbors_directed(idx, Direction::Incoming).count();
            if inverters != 1 {
                return Err(Error::internal(format!(
                    "{mppt} of {inverter} is connected to {inverters} inverters."
                )));
            }
        }
        Ok(())
    }

    fn validate_string_totals(&self, configs: &[ArrayConfiguration]) -> Result<(), Error> {
        for config in configs {
            let shares = self.topology.config_shares(&config.config_id);
            if shares.is_empty() {
                continue;
            }
            let connected: u64 = shares.iter().map(|(_, _, share)| share.strings).sum();
            let declared = config.strings.unwrap_or(0);
            if connected != declared {
                return Err(Error::reconciliation(format!(
                    "Configuration {} has {declared} strings, but {connected} are connected.",
                    config.config_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::topology::InverterId;
    use crate::ReportParserConfig;

    fn config(id: &str, strings: u64) -> ArrayConfiguration {
        ArrayConfiguration {
            config_id: id.to_string(),
            inverters: vec![InverterId::new("INV01"), InverterId::new("INV02")],
            mppts: vec![1, 2, 3],
            strings: Some(strings),
            ..Default::default()
        }
    }

    #[test]
    fn test_string_totals() -> Result<(), Error> {
        let configs = [config("1", 17)];
        let topology = Topology::try_new(
            &configs,
            &ReportParserConfig::default(),
            &mut Diagnostics::default(),
        )?;
        topology.validate(&configs)?;

        assert!(topology.validate(&[config("1", 18)]).is_err_and(|e| e
            == Error::reconciliation("Configuration 1 has 18 strings, but 17 are connected.")));
        Ok(())
    }

    #[test]
    fn test_empty_topology() {
        assert!(Topology::default().validate(&[config("1", 3)]).is_ok());
    }
}
