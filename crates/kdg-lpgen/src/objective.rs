//! Objective expression assembly.
//!
//! Builds one expression for value (quality, to maximize) and one for
//! cost (to minimize or bound by the budget). Which one becomes the
//! objective is a configuration choice; the cost expression always also
//! feeds the budget constraint.

use kdg_core::continuous::significant;
use kdg_core::{BasicNode, DependencyGraph};

use crate::linear::QuadExpr;
use crate::names::{crossing_var, group_has_crossing, segment_ind_var, segment_val_var};

/// Walk the graph once and build the (value, cost) expression pair.
pub(crate) fn expressions(graph: &DependencyGraph) -> (QuadExpr, QuadExpr) {
    let mut value = QuadExpr::zero();
    let mut cost = QuadExpr::zero();

    for basic in graph.basics() {
        let Some(var) = graph.variable_name(basic.addr) else {
            continue;
        };

        match &basic.continuous {
            Some(spec) => {
                let top_var = graph
                    .variable_name(basic.addr.owner())
                    .unwrap_or_else(|| var.clone());

                if let Some(poly) = spec.cost_poly {
                    add_polynomial(&mut cost, &var, &top_var, poly);
                }
                if let Some(poly) = spec.value_poly {
                    add_polynomial(&mut value, &var, &top_var, poly);
                }

                for seg in &spec.segments {
                    let ind = segment_ind_var(&var, &seg.name);
                    let val = segment_val_var(&var, &seg.name);
                    add_piece(&mut cost, &val, &ind, seg.cost.linear, seg.cost.constant);
                    add_piece(&mut value, &val, &ind, seg.value.linear, seg.value.constant);
                }

                for (other, coeff) in &spec.cost_coupling {
                    if significant(*coeff) {
                        cost.add_bilinear(var.clone(), other.clone(), *coeff);
                    }
                }
                for (other, coeff) in &spec.value_coupling {
                    if significant(*coeff) {
                        value.add_bilinear(var.clone(), other.clone(), *coeff);
                    }
                }
            }
            None => {
                if basic.quality != 0.0 {
                    value.linear.add_term(var.clone(), basic.quality);
                }
                if basic.cost != 0.0 {
                    cost.linear.add_term(var.clone(), basic.cost);
                }
            }
        }

        add_edge_weights(graph, basic, &var, &mut value, &mut cost);
    }

    (value, cost)
}

fn add_polynomial(expr: &mut QuadExpr, var: &str, top_var: &str, poly: kdg_core::Polynomial) {
    if significant(poly.quadratic) {
        expr.add_square(var, poly.quadratic);
    }
    if significant(poly.linear) {
        expr.linear.add_term(var, poly.linear);
    }
    if significant(poly.indicator) {
        // Fixed charge paid whenever the owning knob is active.
        expr.linear.add_term(top_var, poly.indicator);
    }
}

fn add_piece(expr: &mut QuadExpr, val_var: &str, ind_var: &str, linear: f64, constant: f64) {
    if significant(linear) {
        expr.linear.add_term(val_var, linear);
    }
    if significant(constant) {
        expr.linear.add_term(ind_var, constant);
    }
}

/// Weighted-edge contributions via the crossing auxiliary variables.
fn add_edge_weights(
    graph: &DependencyGraph,
    basic: &BasicNode,
    sink_var: &str,
    value: &mut QuadExpr,
    cost: &mut QuadExpr,
) {
    for group in &basic.groups {
        if !group_has_crossing(graph, basic.addr, group) {
            continue;
        }
        for edge in &group.sources {
            let Some(src_var) = graph.variable_name(edge.target) else {
                continue;
            };
            let x = crossing_var(sink_var, &src_var);
            if edge.value_weight != 0.0 {
                value.linear.add_term(x.clone(), edge.value_weight);
            }
            if edge.cost_weight != 0.0 {
                cost.linear.add_term(x, edge.cost_weight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdg_core::{EdgeRef, Interval, LinearPiece, Polynomial, Segment};

    fn continuous_knob(quadratic: f64) -> DependencyGraph {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("C").unwrap();
        let l = graph.add_level(k).unwrap();
        let b = graph.add_basic(l, "C_0").unwrap();
        graph
            .set_cost_polynomial(b, Polynomial::new(quadratic, 2.0, 0.0))
            .unwrap();
        graph
    }

    #[test]
    fn discrete_terms() {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("K").unwrap();
        let l = graph.add_level(k).unwrap();
        let b = graph.add_basic(l, "K_0").unwrap();
        graph.set_cost(b, 1.5).unwrap();
        graph.set_quality(b, 2.0).unwrap();

        let (value, cost) = expressions(&graph);
        assert_eq!(value.linear.coeff("K_0_1"), 2.0);
        assert_eq!(cost.linear.coeff("K_0_1"), 1.5);
    }

    #[test]
    fn epsilon_filters_quadratic_coefficient() {
        let (_, cost) = expressions(&continuous_knob(5e-15));
        assert!(!cost.is_quadratic());

        let (_, cost) = expressions(&continuous_knob(5e-13));
        assert!(cost.is_quadratic());
        assert_eq!(cost.squares().next(), Some(("C_0_1", 5e-13)));
    }

    #[test]
    fn indicator_coefficient_lands_on_knob_variable() {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("C").unwrap();
        let l = graph.add_level(k).unwrap();
        let b = graph.add_basic(l, "C_0").unwrap();
        graph
            .set_value_polynomial(b, Polynomial::new(0.0, 0.0, 4.0))
            .unwrap();

        let (value, _) = expressions(&graph);
        assert_eq!(value.linear.coeff("C"), 4.0);
    }

    #[test]
    fn piecewise_terms_use_segment_variables() {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("P").unwrap();
        let l = graph.add_level(k).unwrap();
        let b = graph.add_basic(l, "P_0").unwrap();
        graph
            .add_segment(
                b,
                Segment {
                    name: "s1".to_string(),
                    range: Interval::new(0.0, 2.0),
                    cost: LinearPiece::new(3.0, 1.0),
                    value: LinearPiece::new(0.5, 0.0),
                },
            )
            .unwrap();

        let (value, cost) = expressions(&graph);
        assert_eq!(cost.linear.coeff("sv_P_0_1_s1"), 3.0);
        assert_eq!(cost.linear.coeff("s_P_0_1_s1"), 1.0);
        assert_eq!(value.linear.coeff("sv_P_0_1_s1"), 0.5);
        assert_eq!(value.linear.coeff("s_P_0_1_s1"), 0.0);
    }

    #[test]
    fn coupling_contributes_bilinear_terms() {
        let mut graph = continuous_knob(0.0);
        let b = kdg_core::Address::basic(1, 1, 1);
        graph.set_cost_coupling(b, "OTHER", 0.25).unwrap();
        graph.set_value_coupling(b, "OTHER", 5e-15).unwrap();

        let (value, cost) = expressions(&graph);
        assert_eq!(
            cost.bilinear().collect::<Vec<_>>(),
            vec![("C_0_1", "OTHER", 0.25)]
        );
        assert!(value.bilinear().next().is_none());
    }

    #[test]
    fn weighted_edges_contribute_through_crossing_variables() {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("K").unwrap();
        let l = graph.add_level(k).unwrap();
        let b = graph.add_basic(l, "K_0").unwrap();
        let e = graph.add_knob("E").unwrap();
        graph
            .add_mandatory_edge(b, EdgeRef::with_weights(e, 0.5, 0.25))
            .unwrap();

        let (value, cost) = expressions(&graph);
        assert_eq!(value.linear.coeff("x_K_0_1_E"), 0.5);
        assert_eq!(cost.linear.coeff("x_K_0_1_E"), 0.25);
    }

    #[test]
    fn unweighted_edges_leave_no_auxiliary_terms() {
        let mut graph = DependencyGraph::new("app");
        let k = graph.add_knob("K").unwrap();
        let l = graph.add_level(k).unwrap();
        let b = graph.add_basic(l, "K_0").unwrap();
        let e = graph.add_knob("E").unwrap();
        graph.add_mandatory_edge(b, EdgeRef::new(e)).unwrap();

        let (value, cost) = expressions(&graph);
        assert!(value.is_empty());
        assert!(cost.is_empty());
    }
}
