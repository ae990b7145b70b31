//! Three-level addresses and the packed index codec.
//!
//! Every node in the graph is identified by an ordered triple
//! (top, level, basic). Components are 1-based; a zero level or basic
//! component means "absent", so `(3, 0, 0)` addresses a Top node and
//! `(3, 1, 0)` its first Level. The packed 48-bit key preserves
//! (top, level, basic) ordering, which makes a `BTreeMap` keyed by it
//! iterate in exactly the traversal order the generators require.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Delimiter between address components in textual form.
pub const DELIMITER: char = '_';

/// Start marker prefixing the textual form of an address.
pub const START_MARKER: char = 'n';

/// An ordered (top, level, basic) triple identifying a node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Address {
    pub top: u16,
    pub level: u16,
    pub basic: u16,
}

impl Address {
    /// Address of a Top node (knob).
    pub fn knob(top: u16) -> Self {
        Self {
            top,
            level: 0,
            basic: 0,
        }
    }

    /// Address of a Level node.
    pub fn level(top: u16, level: u16) -> Self {
        Self {
            top,
            level,
            basic: 0,
        }
    }

    /// Address of a Basic node.
    pub fn basic(top: u16, level: u16, basic: u16) -> Self {
        Self { top, level, basic }
    }

    pub fn is_top(&self) -> bool {
        self.level == 0
    }

    pub fn is_level(&self) -> bool {
        self.level != 0 && self.basic == 0
    }

    pub fn is_basic(&self) -> bool {
        self.level != 0 && self.basic != 0
    }

    /// Address of the enclosing node, or `None` for a Top address.
    pub fn parent(&self) -> Option<Address> {
        if self.is_basic() {
            Some(Address::level(self.top, self.level))
        } else if self.is_level() {
            Some(Address::knob(self.top))
        } else {
            None
        }
    }

    /// Address of the owning knob.
    pub fn owner(&self) -> Address {
        Address::knob(self.top)
    }

    /// Pack into the 48-bit-class integer key:
    /// `(top << 32) | (level << 16) | basic`.
    pub fn encode(&self) -> u64 {
        ((self.top as u64) << 32) | ((self.level as u64) << 16) | self.basic as u64
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(key: u64) -> Self {
        Self {
            top: ((key >> 32) & 0xffff) as u16,
            level: ((key >> 16) & 0xffff) as u16,
            basic: (key & 0xffff) as u16,
        }
    }

    /// Parse the textual form, e.g. `n3`, `n3_1` or `n3_1_2`.
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        let (addr, rest) = parse_prefix(text)?;
        if !rest.is_empty() {
            return Err(GraphError::MalformedIndex {
                token: text.to_string(),
            });
        }
        Ok(addr)
    }

    /// Parse an address optionally followed by a second, edge-target
    /// address in the same token stream, e.g. `n1_2_1_n2_1_1`.
    pub fn parse_edge_ref(text: &str) -> Result<(Self, Option<Self>), GraphError> {
        let (addr, rest) = parse_prefix(text)?;
        if rest.is_empty() {
            return Ok((addr, None));
        }
        let (target, tail) = parse_prefix(rest)?;
        if !tail.is_empty() {
            return Err(GraphError::MalformedIndex {
                token: text.to_string(),
            });
        }
        Ok((addr, Some(target)))
    }
}

/// Consume one address from the front of an underscore-delimited token
/// stream. Returns the address and the unconsumed remainder (which, if
/// non-empty, begins with another start marker).
fn parse_prefix(text: &str) -> Result<(Address, &str), GraphError> {
    let stripped = text
        .strip_prefix(START_MARKER)
        .ok_or_else(|| GraphError::MalformedIndex {
            token: text.to_string(),
        })?;

    let mut components = [0u16; 3];
    let mut filled = 0;
    let mut rest = "";
    let mut offset = 0;

    for token in stripped.split(DELIMITER) {
        if offset > 0 && token.starts_with(START_MARKER) {
            // Trailing edge reference; hand the remainder back.
            rest = &stripped[offset..];
            break;
        }
        if filled == 3 {
            return Err(GraphError::MalformedIndex {
                token: token.to_string(),
            });
        }
        components[filled] = token.parse().map_err(|_| GraphError::MalformedIndex {
            token: token.to_string(),
        })?;
        filled += 1;
        offset += token.len() + 1;
    }

    if filled == 0 || components[0] == 0 {
        return Err(GraphError::MalformedIndex {
            token: text.to_string(),
        });
    }

    Ok((
        Address::basic(components[0], components[1], components[2]),
        rest,
    ))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", START_MARKER, self.top)?;
        if self.level != 0 {
            write!(f, "{}{}", DELIMITER, self.level)?;
            if self.basic != 0 {
                write!(f, "{}{}", DELIMITER, self.basic)?;
            }
        }
        Ok(())
    }
}
