//! LP/MIP model generation from a knob dependency graph.
//!
//! Walks an immutable [`kdg_core::DependencyGraph`] and produces an
//! optimization model: a maximize-quality (or minimize-cost) objective,
//! the constraint families encoding AND/OR/choice semantics, continuous
//! range and piecewise segment couplings, the global budget bound, and
//! forced assignments. The model is then rendered in one of two solver
//! text dialects.

mod constraints;
mod names;
mod objective;

pub mod emit;
pub mod error;
pub mod generator;
pub mod linear;
pub mod model;
pub mod stats;

pub use emit::Dialect;
pub use error::LpGenError;
pub use generator::{generate, GeneratedLp, GeneratorConfig};
pub use linear::{LinearExpr, QuadExpr};
pub use model::{Bound, Constraint, ConstraintKind, Direction, LpModel, Sense};
pub use stats::ModelStats;
