//! Cost/value models for continuous basic nodes.
//!
//! A continuous node's activation is a bounded real value rather than a
//! 0/1 choice. Its cost and value are described either by polynomial
//! coefficients or by a piecewise-linear segment table; the two modes
//! are mutually exclusive. Cross-knob coupling tables add bilinear
//! terms that depend on the product of two knobs' activation levels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::edge::{ContinuousEdge, Interval};

/// Coefficients below this magnitude are treated as exactly zero and
/// omitted from emitted expressions.
pub const EPSILON: f64 = 1e-14;

/// Whether a coefficient survives the epsilon filter.
pub fn significant(coeff: f64) -> bool {
    coeff.abs() >= EPSILON
}

/// Quadratic/linear/indicator coefficients of one polynomial.
///
/// `indicator` is a fixed charge applied whenever the owning knob is
/// active (it multiplies the knob's Top variable, not the continuous
/// value itself).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Polynomial {
    pub quadratic: f64,
    pub linear: f64,
    pub indicator: f64,
}

impl Polynomial {
    pub fn new(quadratic: f64, linear: f64, indicator: f64) -> Self {
        Self {
            quadratic,
            linear,
            indicator,
        }
    }
}

/// `linear * x + constant` over one segment's domain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearPiece {
    pub linear: f64,
    pub constant: f64,
}

impl LinearPiece {
    pub fn new(linear: f64, constant: f64) -> Self {
        Self { linear, constant }
    }
}

/// One piece of a piecewise-linear cost/value function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub range: Interval,
    pub cost: LinearPiece,
    pub value: LinearPiece,
}

/// Continuous-mode data attached to a basic node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinuousSpec {
    pub cost_poly: Option<Polynomial>,
    pub value_poly: Option<Polynomial>,
    /// Domain bounds of the activation value, when declared.
    pub domain: Option<Interval>,
    /// Piecewise segment table; mutually exclusive with the polynomials.
    pub segments: Vec<Segment>,
    /// Other-knob variable name -> bilinear cost coefficient.
    pub cost_coupling: BTreeMap<String, f64>,
    /// Other-knob variable name -> bilinear value coefficient.
    pub value_coupling: BTreeMap<String, f64>,
    /// If-then range couplings to other continuous knobs.
    pub edges: Vec<ContinuousEdge>,
}

impl ContinuousSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_piecewise(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn has_polynomial(&self) -> bool {
        self.cost_poly.is_some() || self.value_poly.is_some()
    }

    /// Activation bounds: the declared domain, else the span of the
    /// segment table, else nothing.
    pub fn bounds(&self) -> Option<Interval> {
        if let Some(domain) = self.domain {
            return Some(domain);
        }
        let first = self.segments.first()?;
        let mut span = first.range;
        for seg in &self.segments[1..] {
            span.min = span.min.min(seg.range.min);
            span.max = span.max.max(seg.range.max);
        }
        Some(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_filter() {
        assert!(!significant(5e-15));
        assert!(!significant(-5e-15));
        assert!(significant(5e-13));
        assert!(significant(-5e-13));
        assert!(!significant(0.0));
    }

    #[test]
    fn bounds_prefer_domain_over_segments() {
        let mut spec = ContinuousSpec::new();
        spec.segments.push(Segment {
            name: "s1".to_string(),
            range: Interval::new(1.0, 2.0),
            cost: LinearPiece::default(),
            value: LinearPiece::default(),
        });
        spec.segments.push(Segment {
            name: "s2".to_string(),
            range: Interval::new(2.0, 5.0),
            cost: LinearPiece::default(),
            value: LinearPiece::default(),
        });
        assert_eq!(spec.bounds(), Some(Interval::new(1.0, 5.0)));

        spec.domain = Some(Interval::new(0.0, 10.0));
        assert_eq!(spec.bounds(), Some(Interval::new(0.0, 10.0)));
    }

    #[test]
    fn empty_spec_has_no_bounds() {
        assert_eq!(ContinuousSpec::new().bounds(), None);
    }
}
