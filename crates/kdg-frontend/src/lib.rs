//! Description front ends for the knob dependency graph.
//!
//! Two input formats build the same [`kdg_core::DependencyGraph`]: a
//! line-oriented list description ([`parse_list_str`]/[`load_list`])
//! and an XML dialect ([`parse_xml_str`]/[`load_xml`]). Both are
//! best-effort: malformed numeric fields become zero and dangling
//! references are dropped, with every repair recorded in the returned
//! [`ParseReport`]. Only an unopenable input (or a missing structural
//! root) is fatal.

mod context;
mod error;
mod list;
mod numeric;
mod report;
mod xml;

pub use error::FrontendError;
pub use list::{load_list, parse_list_str};
pub use numeric::{parse_float, parse_float_or};
pub use report::{ParseReport, ParseWarning};
pub use xml::{load_xml, parse_xml_str};
