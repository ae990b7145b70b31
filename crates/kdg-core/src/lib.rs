//! Core data structures for the knob dependency graph (KDG).
//!
//! A configurable application is modeled as a set of knobs (Top nodes),
//! each offering alternative implementation levels (Level nodes), each
//! composed of basic units (Basic nodes) carrying cost/quality scalars
//! or continuous cost-function data, plus AND/OR/out-edge dependency
//! structure between basics.
//!
//! The graph is built once by a front end and is read-only afterwards;
//! the LP generator walks it in address order.

pub mod address;
pub mod continuous;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;

pub use address::Address;
pub use continuous::{ContinuousSpec, LinearPiece, Polynomial, Segment, EPSILON};
pub use edge::{ContinuousEdge, DependencyGroup, EdgeRef, Interval, OutEdgeGroup, RangePair};
pub use error::GraphError;
pub use graph::DependencyGraph;
pub use node::{BasicNode, LevelNode, Node, TopNode};
