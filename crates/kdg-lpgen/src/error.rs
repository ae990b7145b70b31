//! LP generation errors.

use thiserror::Error;

/// Errors that can occur while generating the optimization model.
#[derive(Debug, Error)]
pub enum LpGenError {
    #[error("budget must be a finite number, got {0}")]
    InvalidBudget(f64),
}
