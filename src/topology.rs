// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of a plant's DC topology: inverters, their MPPT
//! inputs, and the array configurations whose strings feed them.

mod creation;
mod inference;
mod retrieval;
mod validation;

pub use inference::{InverterFamily, TopologyInferenceDiagnostics};
pub(crate) use inference::infer_topology;

use std::cmp::Ordering;
use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};

/// The identifier of an inverter, as written in the report, e.g. `INV01`.
///
/// Identifiers sort naturally, so `INV2` comes before `INV10`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InverterId(String);

impl InverterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Splits `s` into alternating runs of digits and non-digits.
fn natural_chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = natural_chunks(a);
    let mut right = natural_chunks(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let both_digits = l.starts_with(|c: char| c.is_ascii_digit())
                    && r.starts_with(|c: char| c.is_ascii_digit());
                let ord = if both_digits {
                    let (l, r) = (l.trim_start_matches('0'), r.trim_start_matches('0'));
                    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
                } else {
                    l.to_lowercase().cmp(&r.to_lowercase())
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for InverterId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for InverterId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for InverterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for InverterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// An MPPT input of an inverter, by its 1-based number.  Displayed and
/// serialized as `MPPT n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mppt(pub u32);

impl std::fmt::Display for Mppt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MPPT {}", self.0)
    }
}

impl Serialize for Mppt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The part of an array configuration that is connected to one MPPT input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigShare {
    pub config_id: String,
    pub strings: u64,
    pub modules: Option<u64>,
    pub dc_kwp: Option<f64>,
    /// The configuration's MPP current, scaled to the strings on this MPPT.
    pub i_mpp_a: Option<f64>,
}

/// The nodes of a [`Topology`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TopologyNode {
    Inverter(InverterId),
    Mppt(InverterId, Mppt),
    Configuration(String),
}

/// `TopologyNode`s stored in a `DiGraph` instance can be addressed with
/// `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any node, so that
/// nodes can be found again from their identifiers.
pub(crate) type NodeIndexMap = HashMap<TopologyNode, NodeIndex>;

/// The shares are not stored in the `DiGraph` instance, so they are stored
/// separately, keyed by the `(MPPT, configuration)` edge they belong to.
pub(crate) type ShareMap = HashMap<(NodeIndex, NodeIndex), ConfigShare>;

/// The inverter → MPPT → configuration graph of a plant.
///
/// Every inverter node has an edge to each of its used MPPT nodes, and every
/// MPPT node has exactly one edge, to the configuration whose strings are
/// connected to it.
#[derive(Debug, Default)]
pub(crate) struct Topology {
    graph: DiGraph<TopologyNode, ()>,
    node_indices: NodeIndexMap,
    shares: ShareMap,
}
