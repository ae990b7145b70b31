//! The dependency-graph container.
//!
//! Nodes live in an arena keyed by the packed address, so map iteration
//! is exactly (top, level, basic) order; parents store child address
//! lists rather than owning references. The graph is populated by a
//! front end's construction events and is read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::continuous::{ContinuousSpec, Polynomial, Segment};
use crate::edge::{ContinuousEdge, DependencyGroup, EdgeRef, Interval, OutEdgeGroup};
use crate::error::GraphError;
use crate::node::{BasicNode, LevelNode, Node, TopNode};

/// The knob dependency graph for one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    app_name: String,
    nodes: BTreeMap<u64, Node>,
    out_edges: Vec<OutEdgeGroup>,
    names: BTreeMap<String, Address>,
}

impl DependencyGraph {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            nodes: BTreeMap::new(),
            out_edges: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    // --- Construction ---

    /// Add a knob (Top node).
    pub fn add_knob(&mut self, name: impl Into<String>) -> Result<Address, GraphError> {
        let index = self.knobs().count() + 1;
        if index > u16::MAX as usize {
            return Err(GraphError::AddressOverflow { component: "knob" });
        }
        let addr = Address::knob(index as u16);
        let name = name.into();
        self.names.insert(name.clone(), addr);
        self.nodes.insert(
            addr.encode(),
            Node::Top(TopNode {
                addr,
                name,
                levels: Vec::new(),
            }),
        );
        Ok(addr)
    }

    /// Add a Level under an existing knob.
    pub fn add_level(&mut self, top: Address) -> Result<Address, GraphError> {
        let knob = self.top_mut(top)?;
        if knob.levels.len() + 1 > u16::MAX as usize {
            return Err(GraphError::AddressOverflow { component: "level" });
        }
        let addr = Address::level(top.top, knob.levels.len() as u16 + 1);
        knob.levels.push(addr);
        self.nodes.insert(
            addr.encode(),
            Node::Level(LevelNode {
                addr,
                basics: Vec::new(),
            }),
        );
        Ok(addr)
    }

    /// Add a Basic node under an existing Level.
    pub fn add_basic(
        &mut self,
        level: Address,
        name: impl Into<String>,
    ) -> Result<Address, GraphError> {
        let parent = self.level_mut(level)?;
        if parent.basics.len() + 1 > u16::MAX as usize {
            return Err(GraphError::AddressOverflow { component: "basic" });
        }
        let addr = Address::basic(level.top, level.level, parent.basics.len() as u16 + 1);
        parent.basics.push(addr);
        let name = name.into();
        if !name.is_empty() {
            self.names.insert(name.clone(), addr);
        }
        self.nodes
            .insert(addr.encode(), Node::Basic(BasicNode::new(addr, name)));
        Ok(addr)
    }

    pub fn set_cost(&mut self, addr: Address, cost: f64) -> Result<(), GraphError> {
        self.basic_mut(addr)?.cost = cost;
        Ok(())
    }

    pub fn set_quality(&mut self, addr: Address, quality: f64) -> Result<(), GraphError> {
        self.basic_mut(addr)?.quality = quality;
        Ok(())
    }

    /// Append a single-element AND group.
    pub fn add_mandatory_edge(&mut self, basic: Address, source: EdgeRef) -> Result<(), GraphError> {
        self.basic_mut(basic)?
            .groups
            .push(DependencyGroup::mandatory(source));
        Ok(())
    }

    /// Append one OR group of one or more alternatives.
    pub fn add_alternative_edges(
        &mut self,
        basic: Address,
        sources: Vec<EdgeRef>,
    ) -> Result<(), GraphError> {
        if sources.is_empty() {
            return Err(GraphError::EmptyAlternativeGroup(basic));
        }
        self.basic_mut(basic)?
            .groups
            .push(DependencyGroup::alternatives(sources));
        Ok(())
    }

    /// Register a mutual-exclusion fan-out group on a shared source.
    pub fn add_out_edge_group(&mut self, source: Address, sinks: Vec<Address>) {
        self.out_edges.push(OutEdgeGroup { source, sinks });
    }

    /// Attach weights to an already-declared edge. Returns `false` when
    /// the sink carries no edge to `source` (callers treat that as a
    /// recoverable unresolved reference).
    pub fn set_edge_weights(
        &mut self,
        sink: Address,
        source: Address,
        value_weight: f64,
        cost_weight: f64,
    ) -> Result<bool, GraphError> {
        let basic = self.basic_mut(sink)?;
        for group in &mut basic.groups {
            for edge in &mut group.sources {
                if edge.target == source {
                    edge.value_weight = value_weight;
                    edge.cost_weight = cost_weight;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // --- Continuous-mode setters ---

    pub fn set_cost_polynomial(&mut self, addr: Address, poly: Polynomial) -> Result<(), GraphError> {
        let spec = self.continuous_mut(addr)?;
        if spec.is_piecewise() {
            return Err(GraphError::ConflictingContinuousMode(addr));
        }
        spec.cost_poly = Some(poly);
        Ok(())
    }

    pub fn set_value_polynomial(
        &mut self,
        addr: Address,
        poly: Polynomial,
    ) -> Result<(), GraphError> {
        let spec = self.continuous_mut(addr)?;
        if spec.is_piecewise() {
            return Err(GraphError::ConflictingContinuousMode(addr));
        }
        spec.value_poly = Some(poly);
        Ok(())
    }

    pub fn set_domain(&mut self, addr: Address, domain: Interval) -> Result<(), GraphError> {
        self.continuous_mut(addr)?.domain = Some(domain);
        Ok(())
    }

    pub fn add_segment(&mut self, addr: Address, segment: Segment) -> Result<(), GraphError> {
        let spec = self.continuous_mut(addr)?;
        if spec.has_polynomial() {
            return Err(GraphError::ConflictingContinuousMode(addr));
        }
        spec.segments.push(segment);
        Ok(())
    }

    pub fn set_cost_coupling(
        &mut self,
        addr: Address,
        other_var: impl Into<String>,
        coeff: f64,
    ) -> Result<(), GraphError> {
        self.continuous_mut(addr)?
            .cost_coupling
            .insert(other_var.into(), coeff);
        Ok(())
    }

    pub fn set_value_coupling(
        &mut self,
        addr: Address,
        other_var: impl Into<String>,
        coeff: f64,
    ) -> Result<(), GraphError> {
        self.continuous_mut(addr)?
            .value_coupling
            .insert(other_var.into(), coeff);
        Ok(())
    }

    pub fn add_continuous_edge(
        &mut self,
        addr: Address,
        edge: ContinuousEdge,
    ) -> Result<(), GraphError> {
        self.continuous_mut(addr)?.edges.push(edge);
        Ok(())
    }

    // --- Queries ---

    /// Look up a node; absence is a legitimate state, not an error.
    pub fn node(&self, addr: Address) -> Option<&Node> {
        self.nodes.get(&addr.encode())
    }

    /// All nodes in (top, level, basic) address order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All knobs in address order.
    pub fn knobs(&self) -> impl Iterator<Item = &TopNode> {
        self.nodes.values().filter_map(Node::as_top)
    }

    /// All basic nodes in address order.
    pub fn basics(&self) -> impl Iterator<Item = &BasicNode> {
        self.nodes.values().filter_map(Node::as_basic)
    }

    pub fn top(&self, addr: Address) -> Option<&TopNode> {
        self.node(addr).and_then(Node::as_top)
    }

    pub fn level(&self, addr: Address) -> Option<&LevelNode> {
        self.node(addr).and_then(Node::as_level)
    }

    pub fn basic(&self, addr: Address) -> Option<&BasicNode> {
        self.node(addr).and_then(Node::as_basic)
    }

    pub fn out_edge_groups(&self) -> &[OutEdgeGroup] {
        &self.out_edges
    }

    /// Resolve a knob or basic-node name to its address.
    pub fn resolve(&self, name: &str) -> Option<Address> {
        self.names.get(name).copied()
    }

    /// LP variable name for a node: the knob name for a Top address,
    /// `knob_<level-1>` for a Level (levels are 0-based externally),
    /// `knob_<level-1>_<basic>` for a Basic.
    pub fn variable_name(&self, addr: Address) -> Option<String> {
        let knob = self.top(addr.owner())?;
        if addr.is_top() {
            return Some(knob.name.clone());
        }
        // The addressed node must exist, not just its knob.
        self.node(addr)?;
        if addr.is_level() {
            Some(format!("{}_{}", knob.name, addr.level - 1))
        } else {
            Some(format!("{}_{}_{}", knob.name, addr.level - 1, addr.basic))
        }
    }

    // --- Private mutable access (construction only) ---

    fn top_mut(&mut self, addr: Address) -> Result<&mut TopNode, GraphError> {
        match self.nodes.get_mut(&addr.encode()) {
            Some(Node::Top(n)) => Ok(n),
            Some(_) => Err(GraphError::WrongVariant {
                addr,
                expected: "knob",
            }),
            None => Err(GraphError::ParentNotFound(addr)),
        }
    }

    fn level_mut(&mut self, addr: Address) -> Result<&mut LevelNode, GraphError> {
        match self.nodes.get_mut(&addr.encode()) {
            Some(Node::Level(n)) => Ok(n),
            Some(_) => Err(GraphError::WrongVariant {
                addr,
                expected: "level",
            }),
            None => Err(GraphError::ParentNotFound(addr)),
        }
    }

    fn basic_mut(&mut self, addr: Address) -> Result<&mut BasicNode, GraphError> {
        match self.nodes.get_mut(&addr.encode()) {
            Some(Node::Basic(n)) => Ok(n),
            Some(_) => Err(GraphError::WrongVariant {
                addr,
                expected: "basic",
            }),
            None => Err(GraphError::ParentNotFound(addr)),
        }
    }

    fn continuous_mut(&mut self, addr: Address) -> Result<&mut ContinuousSpec, GraphError> {
        Ok(self
            .basic_mut(addr)?
            .continuous
            .get_or_insert_with(ContinuousSpec::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuous::LinearPiece;

    fn two_level_knob() -> (DependencyGraph, Address, Address) {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("K").unwrap();
        let l1 = graph.add_level(k).unwrap();
        let l2 = graph.add_level(k).unwrap();
        let b1 = graph.add_basic(l1, "K_0").unwrap();
        let b2 = graph.add_basic(l2, "K_1").unwrap();
        (graph, b1, b2)
    }

    #[test]
    fn construction_assigns_sequential_addresses() {
        let (graph, b1, b2) = two_level_knob();
        assert_eq!(b1, Address::basic(1, 1, 1));
        assert_eq!(b2, Address::basic(1, 2, 1));
        assert_eq!(graph.top(Address::knob(1)).unwrap().levels.len(), 2);
    }

    #[test]
    fn iteration_follows_address_order() {
        let mut graph = DependencyGraph::new("app");
        let k2 = graph.add_knob("B").unwrap();
        let l = graph.add_level(k2).unwrap();
        graph.add_basic(l, "B_0").unwrap();
        graph.add_knob("C").unwrap();

        let addrs: Vec<Address> = graph.nodes().map(Node::addr).collect();
        let mut sorted = addrs.clone();
        sorted.sort();
        assert_eq!(addrs, sorted);
    }

    #[test]
    fn missing_node_is_none_not_error() {
        let (graph, _, _) = two_level_knob();
        assert!(graph.node(Address::basic(5, 1, 1)).is_none());
        assert!(graph.basic(Address::knob(1)).is_none());
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let mut graph = DependencyGraph::new("app");
        let err = graph.add_level(Address::knob(9)).unwrap_err();
        assert!(matches!(err, GraphError::ParentNotFound(_)));
    }

    #[test]
    fn resolve_names() {
        let (graph, b1, _) = two_level_knob();
        assert_eq!(graph.resolve("K"), Some(Address::knob(1)));
        assert_eq!(graph.resolve("K_0"), Some(b1));
        assert_eq!(graph.resolve("missing"), None);
    }

    #[test]
    fn variable_names_use_zero_based_levels() {
        let (graph, b1, b2) = two_level_knob();
        assert_eq!(graph.variable_name(Address::knob(1)).unwrap(), "K");
        assert_eq!(graph.variable_name(Address::level(1, 1)).unwrap(), "K_0");
        assert_eq!(graph.variable_name(b1).unwrap(), "K_0_1");
        assert_eq!(graph.variable_name(b2).unwrap(), "K_1_1");
        assert_eq!(graph.variable_name(Address::basic(1, 3, 1)), None);
    }

    #[test]
    fn edge_weights_attach_to_declared_edges_only() {
        let (mut graph, _, b2) = two_level_knob();
        let e = graph.add_knob("E").unwrap();
        graph.add_mandatory_edge(b2, EdgeRef::new(e)).unwrap();

        assert!(graph.set_edge_weights(b2, e, 0.5, 0.25).unwrap());
        let group = &graph.basic(b2).unwrap().groups[0];
        assert_eq!(group.sources[0].value_weight, 0.5);
        assert_eq!(group.sources[0].cost_weight, 0.25);

        let ghost = Address::basic(9, 1, 1);
        assert!(!graph.set_edge_weights(b2, ghost, 1.0, 0.0).unwrap());
    }

    #[test]
    fn alternative_group_must_be_non_empty() {
        let (mut graph, b1, _) = two_level_knob();
        let err = graph.add_alternative_edges(b1, vec![]).unwrap_err();
        assert!(matches!(err, GraphError::EmptyAlternativeGroup(_)));
    }

    #[test]
    fn continuous_modes_are_mutually_exclusive() {
        let (mut graph, b1, b2) = two_level_knob();

        graph
            .set_cost_polynomial(b1, Polynomial::new(1.0, 2.0, 0.0))
            .unwrap();
        let err = graph
            .add_segment(
                b1,
                Segment {
                    name: "s1".to_string(),
                    range: Interval::new(0.0, 1.0),
                    cost: LinearPiece::default(),
                    value: LinearPiece::default(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::ConflictingContinuousMode(_)));

        graph
            .add_segment(
                b2,
                Segment {
                    name: "s1".to_string(),
                    range: Interval::new(0.0, 1.0),
                    cost: LinearPiece::default(),
                    value: LinearPiece::default(),
                },
            )
            .unwrap();
        let err = graph
            .set_value_polynomial(b2, Polynomial::new(0.0, 1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, GraphError::ConflictingContinuousMode(_)));
    }

    #[test]
    fn edges_attach_to_basics() {
        let (mut graph, b1, b2) = two_level_knob();
        graph.add_mandatory_edge(b2, EdgeRef::new(b1)).unwrap();
        graph
            .add_alternative_edges(b1, vec![EdgeRef::new(b2), EdgeRef::new(Address::knob(1))])
            .unwrap();

        let node = graph.basic(b2).unwrap();
        assert_eq!(node.groups.len(), 1);
        assert!(node.groups[0].is_mandatory());

        let node = graph.basic(b1).unwrap();
        assert!(!node.groups[0].is_mandatory());
    }
}
