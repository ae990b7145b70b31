//! Generation entry point and configuration.

use kdg_core::DependencyGraph;

use crate::constraints;
use crate::emit::{self, Dialect};
use crate::error::LpGenError;
use crate::model::{Direction, LpModel};
use crate::objective;
use crate::stats::ModelStats;

/// Configuration for one generation pass.
///
/// Two forced-on lists are kept: the persistent list survives
/// successive passes over the same graph, the transient list is cleared
/// by [`clear_transient`](Self::clear_transient) between passes.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub budget: f64,
    pub direction: Direction,
    pub dialect: Dialect,
    forced: Vec<String>,
    transient: Vec<String>,
}

impl GeneratorConfig {
    pub fn new(budget: f64) -> Self {
        Self {
            budget,
            direction: Direction::MaximizeValue,
            dialect: Dialect::Cplex,
            forced: Vec::new(),
            transient: Vec::new(),
        }
    }

    /// Force a knob/level/basic on, persistently.
    pub fn force(&mut self, name: impl Into<String>) {
        self.forced.push(name.into());
    }

    /// Force a node on for the next pass only.
    pub fn force_transient(&mut self, name: impl Into<String>) {
        self.transient.push(name.into());
    }

    /// Drop the transient forced-on list; the persistent list stays.
    pub fn clear_transient(&mut self) {
        self.transient.clear();
    }

    /// Both lists, persistent first.
    fn forced_names(&self) -> Vec<String> {
        let mut names = self.forced.clone();
        names.extend(self.transient.iter().cloned());
        names
    }
}

/// Output of one generation pass.
#[derive(Debug, Clone)]
pub struct GeneratedLp {
    pub model: LpModel,
    pub text: String,
    pub stats: ModelStats,
    /// Recoverable conditions absorbed during generation.
    pub warnings: Vec<String>,
}

/// Generate the optimization model and its rendered text.
pub fn generate(
    graph: &DependencyGraph,
    config: &GeneratorConfig,
) -> Result<GeneratedLp, LpGenError> {
    if !config.budget.is_finite() {
        return Err(LpGenError::InvalidBudget(config.budget));
    }

    let (value, cost) = objective::expressions(graph);
    let built = constraints::build(graph, &config.forced_names(), config.budget, &cost);

    let objective = match config.direction {
        Direction::MaximizeValue => value,
        Direction::MinimizeCost => cost,
    };

    let model = LpModel {
        direction: config.direction,
        objective,
        constraints: built.constraints,
        bounds: built.bounds,
        binaries: built.binaries,
    };
    let text = emit::render(&model, config.dialect);
    let stats = ModelStats::collect(graph, &model);

    Ok(GeneratedLp {
        model,
        text,
        stats,
        warnings: built.warnings,
    })
}
