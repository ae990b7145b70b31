//! The assembled optimization model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::linear::{LinearExpr, QuadExpr};

/// Objective direction; term construction is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    MaximizeValue,
    MinimizeCost,
}

/// Comparison sense of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn symbol(&self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// One emitted constraint row.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    /// Plain linear row; rendered structurally (unit coefficients bare).
    Linear {
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    },
    /// `var = active -> expr sense rhs`.
    Indicator {
        var: String,
        active: bool,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    },
    /// The global budget row; rendered with explicit coefficients.
    Budget { expr: QuadExpr, rhs: f64 },
}

/// A constraint with its sequential, 1-based label.
///
/// Labels are stable for a fixed graph; they carry no meaning to the
/// solver but keep emitted files reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: usize,
    pub kind: ConstraintKind,
}

/// Range declaration for a continuous variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub var: String,
    pub min: f64,
    pub max: f64,
}

/// The complete model handed to the emitter.
#[derive(Debug, Clone)]
pub struct LpModel {
    pub direction: Direction,
    pub objective: QuadExpr,
    pub constraints: Vec<Constraint>,
    pub bounds: Vec<Bound>,
    pub binaries: BTreeSet<String>,
}
