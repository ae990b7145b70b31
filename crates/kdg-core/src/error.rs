//! Error types for graph construction.

use thiserror::Error;

use crate::address::Address;

/// Errors that can occur while building or addressing the graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed index token: {token:?}")]
    MalformedIndex { token: String },

    #[error("parent node not found: {0}")]
    ParentNotFound(Address),

    #[error("node at {addr} is not a {expected}")]
    WrongVariant {
        addr: Address,
        expected: &'static str,
    },

    #[error("too many {component} nodes: index would exceed 16 bits")]
    AddressOverflow { component: &'static str },

    #[error("alternative edge group for {0} must contain at least one source")]
    EmptyAlternativeGroup(Address),

    #[error("node {0} mixes polynomial and piecewise continuous modes")]
    ConflictingContinuousMode(Address),
}
