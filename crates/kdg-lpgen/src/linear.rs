//! Linear and quadratic expression types.
//!
//! Terms live in `BTreeMap`s so every walk over an expression is
//! deterministic, which keeps constraint numbering and emitted text
//! diff-stable across runs.

use std::collections::BTreeMap;

/// Terms whose accumulated coefficient drops below this are pruned.
const PRUNE_EPS: f64 = 1e-12;

/// A linear expression: a variable/coefficient map plus a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<String, f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_var(var: impl Into<String>, coeff: f64) -> Self {
        let mut e = Self::zero();
        e.add_term(var, coeff);
        e
    }

    /// Accumulate `coeff * var`, pruning cancelled terms.
    pub fn add_term(&mut self, var: impl Into<String>, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        let var = var.into();
        let entry = self.terms.entry(var.clone()).or_insert(0.0);
        *entry += coeff;
        if entry.abs() < PRUNE_EPS {
            self.terms.remove(&var);
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn add_inplace(&mut self, other: &LinearExpr) {
        self.constant += other.constant;
        for (var, coeff) in &other.terms {
            self.add_term(var.clone(), *coeff);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Terms in variable-name order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(v, c)| (v.as_str(), *c))
    }

    pub fn coeff(&self, var: &str) -> f64 {
        self.terms.get(var).copied().unwrap_or(0.0)
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }
}

/// A quadratic expression: a linear part plus square and bilinear terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadExpr {
    pub linear: LinearExpr,
    squares: BTreeMap<String, f64>,
    bilinear: BTreeMap<(String, String), f64>,
}

impl QuadExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Accumulate `coeff * var^2`.
    pub fn add_square(&mut self, var: impl Into<String>, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        let var = var.into();
        let entry = self.squares.entry(var.clone()).or_insert(0.0);
        *entry += coeff;
        if entry.abs() < PRUNE_EPS {
            self.squares.remove(&var);
        }
    }

    /// Accumulate `coeff * a * b`; the pair is stored in canonical
    /// order so `a*b` and `b*a` merge.
    pub fn add_bilinear(&mut self, a: impl Into<String>, b: impl Into<String>, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        let (a, b) = (a.into(), b.into());
        if a == b {
            self.add_square(a, coeff);
            return;
        }
        let key = if a <= b { (a, b) } else { (b, a) };
        let entry = self.bilinear.entry(key.clone()).or_insert(0.0);
        *entry += coeff;
        if entry.abs() < PRUNE_EPS {
            self.bilinear.remove(&key);
        }
    }

    pub fn is_quadratic(&self) -> bool {
        !self.squares.is_empty() || !self.bilinear.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_empty() && !self.is_quadratic()
    }

    pub fn squares(&self) -> impl Iterator<Item = (&str, f64)> {
        self.squares.iter().map(|(v, c)| (v.as_str(), *c))
    }

    pub fn bilinear(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.bilinear
            .iter()
            .map(|((a, b), c)| (a.as_str(), b.as_str(), *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_accumulate_and_prune() {
        let mut e = LinearExpr::zero();
        e.add_term("x", 1.0);
        e.add_term("x", 2.0);
        assert_eq!(e.coeff("x"), 3.0);

        e.add_term("x", -3.0);
        assert!(e.is_empty());
    }

    #[test]
    fn term_iteration_is_sorted() {
        let mut e = LinearExpr::zero();
        e.add_term("z", 1.0);
        e.add_term("a", 1.0);
        e.add_term("m", 1.0);
        let vars: Vec<&str> = e.terms().map(|(v, _)| v).collect();
        assert_eq!(vars, ["a", "m", "z"]);
    }

    #[test]
    fn add_inplace_merges() {
        let mut a = LinearExpr::from_var("x", 1.0);
        let mut b = LinearExpr::from_var("y", 2.0);
        b.add_constant(5.0);
        a.add_inplace(&b);
        assert_eq!(a.coeff("x"), 1.0);
        assert_eq!(a.coeff("y"), 2.0);
        assert_eq!(a.constant(), 5.0);
    }

    #[test]
    fn bilinear_pairs_are_canonical() {
        let mut q = QuadExpr::zero();
        q.add_bilinear("b", "a", 1.0);
        q.add_bilinear("a", "b", 2.0);
        let terms: Vec<(&str, &str, f64)> = q.bilinear().collect();
        assert_eq!(terms, vec![("a", "b", 3.0)]);
    }

    #[test]
    fn self_bilinear_becomes_square() {
        let mut q = QuadExpr::zero();
        q.add_bilinear("x", "x", 2.0);
        assert_eq!(q.squares().collect::<Vec<_>>(), vec![("x", 2.0)]);
        assert!(q.bilinear().next().is_none());
    }

    #[test]
    fn quadratic_detection() {
        let mut q = QuadExpr::zero();
        assert!(!q.is_quadratic());
        q.linear.add_term("x", 1.0);
        assert!(!q.is_quadratic());
        q.add_square("x", 1.0);
        assert!(q.is_quadratic());
    }
}
