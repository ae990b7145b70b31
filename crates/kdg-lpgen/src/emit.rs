//! Model rendering.
//!
//! Two textual dialects are supported; the switch changes section
//! keywords and statement punctuation only, never constraint content.
//! Structural rows (aggregation, AND/OR, exclusivity) render unit
//! coefficients bare (`E - K_1_1`); the objective and the budget row
//! render every coefficient explicitly (`1 K_0_1 + 3 K_1_1`) because
//! there the number is data, not structure.

use crate::linear::{LinearExpr, QuadExpr};
use crate::model::{Constraint, ConstraintKind, Direction, LpModel};

/// Output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Classic solver-file dialect: section keywords, bare statements.
    #[default]
    Cplex,
    /// Alternate dialect: lower-case keywords, `;` terminators.
    LpSolve,
}

/// Render the complete model text.
pub fn render(model: &LpModel, dialect: Dialect) -> String {
    match dialect {
        Dialect::Cplex => render_cplex(model),
        Dialect::LpSolve => render_lpsolve(model),
    }
}

fn render_cplex(model: &LpModel) -> String {
    let mut out = String::new();
    match model.direction {
        Direction::MaximizeValue => out.push_str("Maximize\n"),
        Direction::MinimizeCost => out.push_str("Minimize\n"),
    }
    out.push_str(" obj: ");
    out.push_str(&fmt_quad(&model.objective));
    out.push('\n');

    out.push_str("Subject To\n");
    for c in &model.constraints {
        out.push(' ');
        out.push_str(&constraint_line(c));
        out.push('\n');
    }

    if !model.bounds.is_empty() {
        out.push_str("Bounds\n");
        for b in &model.bounds {
            out.push_str(&format!(
                " {} <= {} <= {}\n",
                fmt_num(b.min),
                b.var,
                fmt_num(b.max)
            ));
        }
    }

    if !model.binaries.is_empty() {
        out.push_str("Binary\n");
        for var in &model.binaries {
            out.push(' ');
            out.push_str(var);
            out.push('\n');
        }
    }

    out.push_str("End\n");
    out
}

fn render_lpsolve(model: &LpModel) -> String {
    let mut out = String::new();
    match model.direction {
        Direction::MaximizeValue => out.push_str("max: "),
        Direction::MinimizeCost => out.push_str("min: "),
    }
    out.push_str(&fmt_quad(&model.objective));
    out.push_str(";\n");

    for c in &model.constraints {
        out.push_str(&constraint_line(c));
        out.push_str(";\n");
    }

    for b in &model.bounds {
        out.push_str(&format!(
            "{} <= {} <= {};\n",
            fmt_num(b.min),
            b.var,
            fmt_num(b.max)
        ));
    }

    if !model.binaries.is_empty() {
        out.push_str("bin ");
        let vars: Vec<&str> = model.binaries.iter().map(String::as_str).collect();
        out.push_str(&vars.join(", "));
        out.push_str(";\n");
    }

    out
}

fn constraint_line(c: &Constraint) -> String {
    match &c.kind {
        ConstraintKind::Linear { expr, sense, rhs } => format!(
            "c{}: {} {} {}",
            c.id,
            fmt_linear(expr, false),
            sense.symbol(),
            fmt_num(*rhs)
        ),
        ConstraintKind::Indicator {
            var,
            active,
            expr,
            sense,
            rhs,
        } => format!(
            "c{}: {} = {} -> {} {} {}",
            c.id,
            var,
            u8::from(*active),
            fmt_linear(expr, false),
            sense.symbol(),
            fmt_num(*rhs)
        ),
        ConstraintKind::Budget { expr, rhs } => {
            format!("c{}: {} <= {}", c.id, fmt_quad(expr), fmt_num(*rhs))
        }
    }
}

/// Integer-valued numbers render without a decimal point.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn push_term(out: &mut String, negative: bool, body: &str) {
    if out.is_empty() {
        if negative {
            out.push_str("- ");
        }
    } else if negative {
        out.push_str(" - ");
    } else {
        out.push_str(" + ");
    }
    out.push_str(body);
}

fn term_body(coeff: f64, var: &str, explicit: bool) -> String {
    let magnitude = coeff.abs();
    if !explicit && magnitude == 1.0 {
        var.to_string()
    } else {
        format!("{} {}", fmt_num(magnitude), var)
    }
}

/// Positive terms first, then negative, both in variable order.
fn fmt_linear(expr: &LinearExpr, explicit: bool) -> String {
    let mut out = String::new();
    for (var, coeff) in expr.terms().filter(|(_, c)| *c > 0.0) {
        push_term(&mut out, false, &term_body(coeff, var, explicit));
    }
    for (var, coeff) in expr.terms().filter(|(_, c)| *c < 0.0) {
        push_term(&mut out, true, &term_body(coeff, var, explicit));
    }
    let constant = expr.constant();
    if constant != 0.0 {
        push_term(&mut out, constant < 0.0, &fmt_num(constant.abs()));
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

/// Linear part with explicit coefficients, then the quadratic terms in
/// a bracketed block.
fn fmt_quad(expr: &QuadExpr) -> String {
    let mut out = fmt_linear(&expr.linear, true);
    if !expr.is_quadratic() {
        return out;
    }

    let mut block = String::new();
    for (var, coeff) in expr.squares().filter(|(_, c)| *c > 0.0) {
        push_term(&mut block, false, &format!("{} {} ^2", fmt_num(coeff), var));
    }
    for (a, b, coeff) in expr.bilinear().filter(|(_, _, c)| *c > 0.0) {
        push_term(&mut block, false, &format!("{} {} * {}", fmt_num(coeff), a, b));
    }
    for (var, coeff) in expr.squares().filter(|(_, c)| *c < 0.0) {
        push_term(
            &mut block,
            true,
            &format!("{} {} ^2", fmt_num(coeff.abs()), var),
        );
    }
    for (a, b, coeff) in expr.bilinear().filter(|(_, _, c)| *c < 0.0) {
        push_term(
            &mut block,
            true,
            &format!("{} {} * {}", fmt_num(coeff.abs()), a, b),
        );
    }

    if out == "0" {
        out.clear();
        out.push_str(&format!("[ {} ]", block));
    } else {
        out.push_str(&format!(" + [ {} ]", block));
    }
    out
}
