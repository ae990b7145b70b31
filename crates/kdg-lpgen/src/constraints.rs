//! Constraint generation.
//!
//! Walks the graph in address order and emits the constraint families,
//! always in the same family order and with sequential 1-based labels,
//! so a fixed graph always produces the same file:
//!
//! - level aggregation (levels sum to their knob)
//! - basic aggregation (basics sum to their level; continuous children
//!   get a level-implies-active indicator instead)
//! - continuous range coupling indicators
//! - piecewise segment indicators
//! - crossing-variable consistency, AND/OR satisfaction, crossing
//!   bounds, fan-out exclusivity
//! - the global budget row
//! - forced assignments
//!
//! Unresolvable edge references are skipped with a warning, never
//! fatal; the model degrades to best effort.

use std::collections::BTreeSet;

use kdg_core::{Address, DependencyGraph, Node};

use crate::linear::{LinearExpr, QuadExpr};
use crate::model::{Bound, Constraint, ConstraintKind, Sense};
use crate::names::{
    crossing_var, group_has_crossing, range_ind_var, segment_ind_var, segment_val_var,
};

/// Everything the constraint pass produces besides the objective.
pub(crate) struct BuiltConstraints {
    pub constraints: Vec<Constraint>,
    pub bounds: Vec<Bound>,
    pub binaries: BTreeSet<String>,
    pub warnings: Vec<String>,
}

pub(crate) fn build(
    graph: &DependencyGraph,
    forced: &[String],
    budget: f64,
    cost: &QuadExpr,
) -> BuiltConstraints {
    let mut b = Builder {
        graph,
        constraints: Vec::new(),
        bounds: Vec::new(),
        binaries: BTreeSet::new(),
        warnings: Vec::new(),
        next_id: 1,
    };

    b.declare_variables();
    b.level_aggregation();
    b.basic_aggregation();
    b.continuous_ranges();
    b.piecewise_segments();
    b.edge_consistency();
    b.and_satisfaction();
    b.or_satisfaction();
    b.crossing_bounds();
    b.out_edge_exclusivity();
    b.budget(budget, cost);
    b.forced(forced);

    BuiltConstraints {
        constraints: b.constraints,
        bounds: b.bounds,
        binaries: b.binaries,
        warnings: b.warnings,
    }
}

struct Builder<'g> {
    graph: &'g DependencyGraph,
    constraints: Vec<Constraint>,
    bounds: Vec<Bound>,
    binaries: BTreeSet<String>,
    warnings: Vec<String>,
    next_id: usize,
}

impl<'g> Builder<'g> {
    fn push(&mut self, kind: ConstraintKind) {
        self.constraints.push(Constraint {
            id: self.next_id,
            kind,
        });
        self.next_id += 1;
    }

    fn linear(&mut self, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.push(ConstraintKind::Linear { expr, sense, rhs });
    }

    fn indicator(&mut self, var: String, active: bool, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.push(ConstraintKind::Indicator {
            var,
            active,
            expr,
            sense,
            rhs,
        });
    }

    fn var(&self, addr: Address) -> Option<String> {
        self.graph.variable_name(addr)
    }

    fn unresolved(&mut self, addr: Address) {
        self.warnings
            .push(format!("unresolved edge reference {addr}, edge dropped"));
    }

    /// Activation variables are binary; continuous basics are ranged
    /// in the bounds section instead.
    fn declare_variables(&mut self) {
        for node in self.graph.nodes() {
            let Some(var) = self.var(node.addr()) else {
                continue;
            };
            match node {
                Node::Top(_) | Node::Level(_) => {
                    self.binaries.insert(var);
                }
                Node::Basic(basic) => match &basic.continuous {
                    Some(spec) => {
                        if let Some(range) = spec.bounds() {
                            self.bounds.push(Bound {
                                var,
                                min: range.min,
                                max: range.max,
                            });
                        }
                    }
                    None => {
                        self.binaries.insert(var);
                    }
                },
            }
        }
    }

    /// Family A: sum of level activations equals the knob activation.
    fn level_aggregation(&mut self) {
        for knob in self.graph.knobs() {
            if knob.levels.is_empty() {
                continue;
            }
            let mut expr = LinearExpr::zero();
            for level in &knob.levels {
                if let Some(var) = self.var(*level) {
                    expr.add_term(var, 1.0);
                }
            }
            expr.add_term(knob.name.clone(), -1.0);
            self.linear(expr, Sense::Eq, 0.0);
        }
    }

    /// Family B: sum of discrete basics equals their level; continuous
    /// children get `level = 1 -> basic >= 0` instead (a continuous
    /// child has no upper-bounded activation variable to aggregate).
    fn basic_aggregation(&mut self) {
        for knob in self.graph.knobs() {
            for level_addr in &knob.levels {
                let Some(level) = self.graph.level(*level_addr) else {
                    continue;
                };
                let Some(level_var) = self.var(*level_addr) else {
                    continue;
                };

                let mut expr = LinearExpr::zero();
                let mut continuous = Vec::new();
                for basic_addr in &level.basics {
                    let Some(basic) = self.graph.basic(*basic_addr) else {
                        continue;
                    };
                    let Some(var) = self.var(*basic_addr) else {
                        continue;
                    };
                    if basic.is_continuous() {
                        continuous.push(var);
                    } else {
                        expr.add_term(var, 1.0);
                    }
                }

                if !expr.is_empty() {
                    expr.add_term(level_var.clone(), -1.0);
                    self.linear(expr, Sense::Eq, 0.0);
                }
                for var in continuous {
                    self.indicator(
                        level_var.clone(),
                        true,
                        LinearExpr::from_var(var, 1.0),
                        Sense::Ge,
                        0.0,
                    );
                }
            }
        }
    }

    /// Family C: one indicator per continuous range pair, four
    /// implications each, plus at-most-one-segment per edge bounded by
    /// the owning knob's activation.
    fn continuous_ranges(&mut self) {
        for basic in self.graph.basics() {
            let Some(spec) = &basic.continuous else {
                continue;
            };
            let Some(sink_var) = self.var(basic.addr) else {
                continue;
            };
            let Some(top_var) = self.var(basic.addr.owner()) else {
                continue;
            };

            let mut index = 0;
            for edge in &spec.edges {
                let Some(src_var) = self.var(edge.target) else {
                    self.unresolved(edge.target);
                    continue;
                };

                let mut at_most_one = LinearExpr::zero();
                for pair in &edge.ranges {
                    let ind = range_ind_var(&sink_var, index);
                    index += 1;
                    self.binaries.insert(ind.clone());
                    at_most_one.add_term(ind.clone(), 1.0);

                    let sink = LinearExpr::from_var(sink_var.clone(), 1.0);
                    let src = LinearExpr::from_var(src_var.clone(), 1.0);
                    self.indicator(ind.clone(), true, sink.clone(), Sense::Ge, pair.sink.min);
                    self.indicator(ind.clone(), true, sink, Sense::Le, pair.sink.max);
                    self.indicator(ind.clone(), true, src.clone(), Sense::Ge, pair.source.min);
                    self.indicator(ind, true, src, Sense::Le, pair.source.max);
                }

                if !at_most_one.is_empty() {
                    at_most_one.add_term(top_var.clone(), -1.0);
                    self.linear(at_most_one, Sense::Le, 0.0);
                }
            }
        }
    }

    /// Family D: piecewise segment indicators with the auxiliary
    /// segment-value variable pinned to the node value inside the
    /// active segment and to zero outside, plus exactly-one-active.
    fn piecewise_segments(&mut self) {
        for basic in self.graph.basics() {
            let Some(spec) = &basic.continuous else {
                continue;
            };
            if spec.segments.is_empty() {
                continue;
            }
            let Some(var) = self.var(basic.addr) else {
                continue;
            };

            let mut exactly_one = LinearExpr::zero();
            for seg in &spec.segments {
                let ind = segment_ind_var(&var, &seg.name);
                let val = segment_val_var(&var, &seg.name);
                self.binaries.insert(ind.clone());
                self.bounds.push(Bound {
                    var: val.clone(),
                    min: seg.range.min.min(0.0),
                    max: seg.range.max.max(0.0),
                });
                exactly_one.add_term(ind.clone(), 1.0);

                let node = LinearExpr::from_var(var.clone(), 1.0);
                self.indicator(ind.clone(), true, node.clone(), Sense::Le, seg.range.max);
                self.indicator(ind.clone(), true, node, Sense::Ge, seg.range.min);

                let mut tie = LinearExpr::from_var(val.clone(), 1.0);
                tie.add_term(var.clone(), -1.0);
                self.indicator(ind.clone(), true, tie, Sense::Eq, 0.0);
                self.indicator(ind, false, LinearExpr::from_var(val, 1.0), Sense::Eq, 0.0);
            }
            self.linear(exactly_one, Sense::Eq, 1.0);
        }
    }

    /// Family E: a sink equals the sum of its crossing variables, per
    /// dependency group that carries them.
    fn edge_consistency(&mut self) {
        for basic in self.graph.basics() {
            let Some(sink_var) = self.var(basic.addr) else {
                continue;
            };
            for group in &basic.groups {
                if !group_has_crossing(self.graph, basic.addr, group) {
                    continue;
                }
                let mut expr = LinearExpr::from_var(sink_var.clone(), 1.0);
                let mut crossed = false;
                for edge in &group.sources {
                    let Some(src_var) = self.var(edge.target) else {
                        self.unresolved(edge.target);
                        continue;
                    };
                    let x = crossing_var(&sink_var, &src_var);
                    self.binaries.insert(x.clone());
                    expr.add_term(x, -1.0);
                    crossed = true;
                }
                if crossed {
                    self.linear(expr, Sense::Eq, 0.0);
                }
            }
        }
    }

    /// Family F: mandatory dependency, `source - sink >= 0`.
    fn and_satisfaction(&mut self) {
        for basic in self.graph.basics() {
            let Some(sink_var) = self.var(basic.addr) else {
                continue;
            };
            for group in &basic.groups {
                if !group.is_mandatory() {
                    continue;
                }
                let Some(edge) = group.sources.first() else {
                    continue;
                };
                let Some(src_var) = self.var(edge.target) else {
                    self.unresolved(edge.target);
                    continue;
                };
                let mut expr = LinearExpr::from_var(src_var, 1.0);
                expr.add_term(sink_var.clone(), -1.0);
                self.linear(expr, Sense::Ge, 0.0);
            }
        }
    }

    /// Family G: alternatives, `sum(sources) - sink >= 0`.
    fn or_satisfaction(&mut self) {
        for basic in self.graph.basics() {
            let Some(sink_var) = self.var(basic.addr) else {
                continue;
            };
            for group in &basic.groups {
                if group.is_mandatory() {
                    continue;
                }
                let mut expr = LinearExpr::zero();
                for edge in &group.sources {
                    match self.var(edge.target) {
                        Some(src_var) => expr.add_term(src_var, 1.0),
                        None => self.unresolved(edge.target),
                    }
                }
                if expr.is_empty() {
                    continue;
                }
                expr.add_term(sink_var.clone(), -1.0);
                self.linear(expr, Sense::Ge, 0.0);
            }
        }
    }

    /// Family H: a crossing cannot exceed its source's activation.
    fn crossing_bounds(&mut self) {
        for basic in self.graph.basics() {
            let Some(sink_var) = self.var(basic.addr) else {
                continue;
            };
            for group in &basic.groups {
                if !group_has_crossing(self.graph, basic.addr, group) {
                    continue;
                }
                for edge in &group.sources {
                    let Some(src_var) = self.var(edge.target) else {
                        continue;
                    };
                    let mut expr =
                        LinearExpr::from_var(crossing_var(&sink_var, &src_var), 1.0);
                    expr.add_term(src_var, -1.0);
                    self.linear(expr, Sense::Le, 0.0);
                }
            }
        }
    }

    /// Family I: fan-out exclusivity, sum of crossings into a shared
    /// source over all registered sinks at most one.
    fn out_edge_exclusivity(&mut self) {
        let graph = self.graph;
        for group in graph.out_edge_groups() {
            let Some(src_var) = self.var(group.source) else {
                self.unresolved(group.source);
                continue;
            };
            let mut expr = LinearExpr::zero();
            for sink in &group.sinks {
                let references_source = self
                    .graph
                    .basic(*sink)
                    .map(|b| {
                        b.groups
                            .iter()
                            .flat_map(|g| &g.sources)
                            .any(|e| e.target == group.source)
                    })
                    .unwrap_or(false);
                if !references_source {
                    self.unresolved(*sink);
                    continue;
                }
                if let Some(sink_var) = self.var(*sink) {
                    expr.add_term(crossing_var(&sink_var, &src_var), 1.0);
                }
            }
            if !expr.is_empty() {
                self.linear(expr, Sense::Le, 1.0);
            }
        }
    }

    /// Family J: the single global resource constraint.
    fn budget(&mut self, budget: f64, cost: &QuadExpr) {
        self.push(ConstraintKind::Budget {
            expr: cost.clone(),
            rhs: budget,
        });
    }

    /// Family K: explicit forced assignments, `var = 1`.
    fn forced(&mut self, forced: &[String]) {
        for name in forced {
            let var = self
                .graph
                .resolve(name)
                .and_then(|addr| self.var(addr));
            match var {
                Some(var) => self.linear(LinearExpr::from_var(var, 1.0), Sense::Eq, 1.0),
                None => self
                    .warnings
                    .push(format!("forced name {name:?} not present in the graph")),
            }
        }
    }
}
