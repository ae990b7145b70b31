//! Auxiliary-variable naming and crossing-variable placement.
//!
//! Both the constraint and objective generators must agree on which
//! edges carry a crossing auxiliary variable and what it is called, so
//! the rules live here. A crossing variable exists for the edges of a
//! dependency group when any edge of the group is weighted or feeds a
//! registered fan-out source; unweighted models stay free of
//! auxiliaries.

use kdg_core::{Address, DependencyGraph, DependencyGroup};

/// Crossing auxiliary variable for a sink/source edge.
pub(crate) fn crossing_var(sink: &str, source: &str) -> String {
    format!("x_{sink}_{source}")
}

/// Piecewise segment indicator for a continuous node variable.
pub(crate) fn segment_ind_var(node: &str, segment: &str) -> String {
    format!("s_{node}_{segment}")
}

/// Auxiliary segment-value variable for a continuous node variable.
pub(crate) fn segment_val_var(node: &str, segment: &str) -> String {
    format!("sv_{node}_{segment}")
}

/// Indicator for the `index`-th range pair attached to a sink node.
pub(crate) fn range_ind_var(sink: &str, index: usize) -> String {
    format!("r_{sink}_{index}")
}

/// Whether `sink -> source` participates in a fan-out exclusivity group.
pub(crate) fn in_fan_out(graph: &DependencyGraph, sink: Address, source: Address) -> bool {
    graph
        .out_edge_groups()
        .iter()
        .any(|g| g.source == source && g.sinks.contains(&sink))
}

/// Whether the group's edges carry crossing variables.
pub(crate) fn group_has_crossing(
    graph: &DependencyGraph,
    sink: Address,
    group: &DependencyGroup,
) -> bool {
    group
        .sources
        .iter()
        .any(|e| e.is_weighted() || in_fan_out(graph, sink, e.target))
}
