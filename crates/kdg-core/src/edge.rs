//! Typed dependency edges between basic nodes.
//!
//! Every edge kind is a named struct with explicit fields; the
//! AND-versus-OR distinction is carried by group cardinality, not a
//! flag, mirroring the source formats (a one-element alternative group
//! is valid input and behaves exactly like a mandatory edge).

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// One outgoing dependency reference from a sink to a source node.
///
/// Weights default to zero, meaning "crossing this edge contributes
/// nothing to the objective".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Address of the source (prerequisite) node.
    pub target: Address,
    /// Value contributed to the objective when the edge is crossed.
    pub value_weight: f64,
    /// Cost contributed to the budget when the edge is crossed.
    pub cost_weight: f64,
}

impl EdgeRef {
    pub fn new(target: Address) -> Self {
        Self {
            target,
            value_weight: 0.0,
            cost_weight: 0.0,
        }
    }

    pub fn with_weights(target: Address, value_weight: f64, cost_weight: f64) -> Self {
        Self {
            target,
            value_weight,
            cost_weight,
        }
    }

    /// Whether crossing this edge perturbs the objective or budget.
    pub fn is_weighted(&self) -> bool {
        self.value_weight != 0.0 || self.cost_weight != 0.0
    }
}

/// A group of outgoing edges attached to one basic node.
///
/// A singleton group is a mandatory (AND) dependency; a larger group is
/// an alternative (OR) set of which at least one source must be active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGroup {
    pub sources: Vec<EdgeRef>,
}

impl DependencyGroup {
    /// Single-source AND group.
    pub fn mandatory(source: EdgeRef) -> Self {
        Self {
            sources: vec![source],
        }
    }

    /// Multi-source OR group (callers must guarantee non-emptiness).
    pub fn alternatives(sources: Vec<EdgeRef>) -> Self {
        Self { sources }
    }

    /// Group size, not a stored flag, discriminates AND from OR.
    pub fn is_mandatory(&self) -> bool {
        self.sources.len() == 1
    }
}

/// Mutual-exclusion group over the fan-out of a shared source: the
/// crossings from all listed sinks to `source` may sum to at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutEdgeGroup {
    pub source: Address,
    pub sinks: Vec<Address>,
}

/// A closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// One (source interval, sink interval) coupling of a continuous edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangePair {
    pub source: Interval,
    pub sink: Interval,
}

/// Couples one continuous knob's active interval to another's: when the
/// sink sits in a pair's sink interval, the source must sit in the
/// matching source interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousEdge {
    /// The continuous node whose variable appears on the source side.
    pub target: Address,
    pub ranges: Vec<RangePair>,
}
