//! Node variants: Top (knob), Level, and Basic.
//!
//! The original design used a polymorphic class hierarchy with
//! downcasts keyed on address depth; here the variant is a tagged enum
//! and call sites pattern-match.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::continuous::ContinuousSpec;
use crate::edge::DependencyGroup;

/// A knob: one configurable choice point, the logical sum of its levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNode {
    pub addr: Address,
    pub name: String,
    /// Child Level addresses, in creation order.
    pub levels: Vec<Address>,
}

/// One implementation alternative for a knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelNode {
    pub addr: Address,
    /// Child Basic addresses, in creation order.
    pub basics: Vec<Address>,
}

/// The smallest modeled unit: discrete cost/quality scalars or a
/// continuous cost model, plus outgoing dependency groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicNode {
    pub addr: Address,
    pub name: String,
    pub cost: f64,
    pub quality: f64,
    pub groups: Vec<DependencyGroup>,
    pub continuous: Option<ContinuousSpec>,
}

impl BasicNode {
    pub fn new(addr: Address, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
            cost: 0.0,
            quality: 0.0,
            groups: Vec::new(),
            continuous: None,
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous.is_some()
    }
}

/// A node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Top(TopNode),
    Level(LevelNode),
    Basic(BasicNode),
}

impl Node {
    pub fn addr(&self) -> Address {
        match self {
            Node::Top(n) => n.addr,
            Node::Level(n) => n.addr,
            Node::Basic(n) => n.addr,
        }
    }

    pub fn as_top(&self) -> Option<&TopNode> {
        match self {
            Node::Top(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<&LevelNode> {
        match self {
            Node::Level(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_basic(&self) -> Option<&BasicNode> {
        match self {
            Node::Basic(n) => Some(n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_accessors() {
        let node = Node::Basic(BasicNode::new(Address::basic(1, 1, 1), "b"));
        assert!(node.as_basic().is_some());
        assert!(node.as_top().is_none());
        assert!(node.as_level().is_none());
        assert_eq!(node.addr(), Address::basic(1, 1, 1));
    }

    #[test]
    fn new_basic_is_discrete_and_free() {
        let basic = BasicNode::new(Address::basic(1, 1, 1), "b");
        assert!(!basic.is_continuous());
        assert_eq!(basic.cost, 0.0);
        assert_eq!(basic.quality, 0.0);
        assert!(basic.groups.is_empty());
    }
}
