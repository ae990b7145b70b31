//! Model summary for machine-readable output.

use serde::{Deserialize, Serialize};

use kdg_core::DependencyGraph;

use crate::model::LpModel;

/// Counts describing a generated model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelStats {
    pub app: String,
    pub knobs: usize,
    pub levels: usize,
    pub basics: usize,
    pub continuous_basics: usize,
    pub constraints: usize,
    pub binary_variables: usize,
    pub bounded_variables: usize,
}

impl ModelStats {
    pub(crate) fn collect(graph: &DependencyGraph, model: &LpModel) -> Self {
        let levels = graph.knobs().map(|k| k.levels.len()).sum();
        let continuous_basics = graph.basics().filter(|b| b.is_continuous()).count();
        Self {
            app: graph.app_name().to_string(),
            knobs: graph.knobs().count(),
            levels,
            basics: graph.basics().count(),
            continuous_basics,
            constraints: model.constraints.len(),
            binary_variables: model.binaries.len(),
            bounded_variables: model.bounds.len(),
        }
    }
}
