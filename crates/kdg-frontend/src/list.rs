//! The line-oriented list description front end.
//!
//! A description is the application name on the first non-blank line
//! followed by marked sections:
//!
//! ```text
//! streamcluster
//! <Knobs>
//! K [(1.0-2.0),(3.0-5.0)]
//! E [(0.0-0.0)]
//! <Dependencies>
//! K.1 <- [E.0]
//! <Weights>
//! n1_1_1 7.5
//! n1_2_1_n2_1_1 0.25 0.1
//! ```
//!
//! A `<Knobs>` entry declares one knob and one `(cost-quality)` pair
//! per level; each level carries a single basic node named
//! `<knob>_<lvl>` with levels numbered from zero. A `<Dependencies>`
//! entry is one alternative group per line, `sink.lvl <- [src.lvl,
//! ...]`; a single source makes the group mandatory by the sizing
//! rule. `<Weights>` entries use the positional address form to set a
//! node's quality (`n<addr> <value>`) or an already-declared edge's
//! weights (`n<addr>_n<addr> <value> [<cost weight>]`).
//!
//! Bad numeric fields are substituted with zero and bad references are
//! dropped; both land in the returned [`ParseReport`].

use std::fs;
use std::path::Path;

use kdg_core::{Address, DependencyGraph, EdgeRef};

use crate::context::TokenCursor;
use crate::error::FrontendError;
use crate::report::ParseReport;

const KNOBS_MARKER: &str = "<Knobs>";
const DEPENDENCIES_MARKER: &str = "<Dependencies>";
const WEIGHTS_MARKER: &str = "<Weights>";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Knobs,
    Dependencies,
    Weights,
}

/// Read a list description from a file.
pub fn load_list(path: impl AsRef<Path>) -> Result<(DependencyGraph, ParseReport), FrontendError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| FrontendError::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    parse_list_str(&text)
}

/// Parse a list description held in memory.
pub fn parse_list_str(text: &str) -> Result<(DependencyGraph, ParseReport), FrontendError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let app = lines.next().ok_or(FrontendError::MissingAppName)?;

    let mut parser = ListParser {
        graph: DependencyGraph::new(app),
        report: ParseReport::new(),
        section: Section::Preamble,
    };
    for line in lines {
        parser.line(line);
    }
    Ok((parser.graph, parser.report))
}

struct ListParser {
    graph: DependencyGraph,
    report: ParseReport,
    section: Section,
}

impl ListParser {
    fn line(&mut self, line: &str) {
        match line {
            KNOBS_MARKER => self.section = Section::Knobs,
            DEPENDENCIES_MARKER => self.section = Section::Dependencies,
            WEIGHTS_MARKER => self.section = Section::Weights,
            _ => match self.section {
                Section::Preamble => self
                    .report
                    .malformed(line, "entry before the first section marker"),
                Section::Knobs => self.knob_entry(line),
                Section::Dependencies => self.dependency_entry(line),
                Section::Weights => self.weight_entry(line),
            },
        }
    }

    /// `K [(1.0-2.0),(3.0-5.0)]`: a knob with one level per pair.
    fn knob_entry(&mut self, line: &str) {
        let Some((name, pairs)) = line.split_once(char::is_whitespace) else {
            return self.report.malformed(line, "missing level list");
        };
        let pairs = pairs.trim();
        let Some(pairs) = pairs
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        else {
            return self
                .report
                .malformed(line, "level list is not bracketed");
        };

        let top = match self.graph.add_knob(name) {
            Ok(addr) => addr,
            Err(err) => return self.report.malformed(line, err.to_string()),
        };
        for (lvl, pair) in pairs.split(',').enumerate() {
            let pair = pair.trim();
            let Some(pair) = pair
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
            else {
                self.report
                    .malformed(line, format!("bad level pair {pair:?}"));
                continue;
            };
            let (cost_text, quality_text) = pair.split_once('-').unwrap_or((pair, ""));
            let cost = self.report.float_or("cost", cost_text, 0.0);
            let quality = self.report.float_or("quality", quality_text, 0.0);
            if let Err(err) = self.declare_level(top, name, lvl, cost, quality) {
                self.report.malformed(line, err.to_string());
            }
        }
    }

    fn declare_level(
        &mut self,
        top: Address,
        knob: &str,
        lvl: usize,
        cost: f64,
        quality: f64,
    ) -> Result<(), kdg_core::GraphError> {
        let level = self.graph.add_level(top)?;
        let basic = self.graph.add_basic(level, format!("{knob}_{lvl}"))?;
        self.graph.set_cost(basic, cost)?;
        self.graph.set_quality(basic, quality)?;
        Ok(())
    }

    /// `K.1 <- [E.0, F.2]`: one alternative group on the sink node; a
    /// single source makes the group mandatory by its size.
    fn dependency_entry(&mut self, line: &str) {
        let Some((sink_text, sources_text)) = line.split_once("<-") else {
            return self.report.malformed(line, "missing `<-` separator");
        };
        let Some(sink) = self.resolve_ref(sink_text.trim()) else {
            return;
        };
        let sources_text = sources_text.trim();
        let Some(sources_text) = sources_text
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        else {
            return self
                .report
                .malformed(line, "source list is not bracketed");
        };

        let mut sources = Vec::new();
        for source_text in sources_text.split(',') {
            if let Some(source) = self.resolve_ref(source_text.trim()) {
                sources.push(EdgeRef::new(source));
            }
        }
        if sources.is_empty() {
            // Every source was dropped; nothing to attach.
            return;
        }
        if let Err(err) = self.graph.add_alternative_edges(sink, sources) {
            self.report.malformed(line, err.to_string());
        }
    }

    /// Resolve a `knob.lvl` reference to the level's basic node.
    /// Failures are reported and the reference dropped.
    fn resolve_ref(&mut self, text: &str) -> Option<Address> {
        let parsed = text.split_once('.').and_then(|(knob, lvl)| {
            let lvl: usize = lvl.trim().parse().ok()?;
            Some(format!("{}_{lvl}", knob.trim()))
        });
        let Some(name) = parsed else {
            self.report
                .malformed(text, "expected a knob.lvl reference");
            return None;
        };
        match self.graph.resolve(&name) {
            Some(addr) => Some(addr),
            None => {
                self.report.unresolved(text);
                None
            }
        }
    }

    /// `n<addr> <value>` sets a node's quality; `n<addr>_n<addr>
    /// <value> [<cost weight>]` sets an edge's weights.
    fn weight_entry(&mut self, line: &str) {
        let mut cursor = TokenCursor::new(line);
        let Some(reference) = cursor.next() else { return };
        let (addr, target) = match Address::parse_edge_ref(reference) {
            Ok(parsed) => parsed,
            Err(err) => return self.report.malformed(line, err.to_string()),
        };
        let value = self
            .report
            .float_or("weight", cursor.next().unwrap_or("0"), 0.0);

        match target {
            None => {
                if self.graph.basic(addr).is_none() {
                    return self.report.unresolved(reference);
                }
                if let Err(err) = self.graph.set_quality(addr, value) {
                    self.report.malformed(line, err.to_string());
                }
            }
            Some(target) => {
                let cost = self
                    .report
                    .float_or("edge cost weight", cursor.next().unwrap_or("0"), 0.0);
                match self.graph.set_edge_weights(addr, target, value, cost) {
                    Ok(true) => {}
                    Ok(false) => self.report.unresolved(reference),
                    Err(err) => self.report.malformed(line, err.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ParseWarning;
    use std::io::Write;

    const BASIC: &str = "\
demo
<Knobs>
K [(1.0-2.0),(3.0-5.0)]
E [(0.0-0.0)]
<Dependencies>
K.1 <- [E.0]
<Weights>
n1_1_1 7.5
n1_2_1_n2_1_1 0.25 0.1
";

    #[test]
    fn builds_the_declared_graph() {
        let (graph, report) = parse_list_str(BASIC).unwrap();
        assert!(report.is_empty(), "{:?}", report.warnings());

        assert_eq!(graph.app_name(), "demo");
        let b1 = Address::basic(1, 1, 1);
        let b2 = Address::basic(1, 2, 1);
        assert_eq!(graph.resolve("K_1"), Some(b2));
        assert_eq!(graph.resolve("E_0"), Some(Address::basic(2, 1, 1)));
        assert_eq!(graph.basic(b1).unwrap().cost, 1.0);
        assert_eq!(graph.basic(b2).unwrap().cost, 3.0);
        assert_eq!(graph.basic(b2).unwrap().quality, 5.0);

        let groups = &graph.basic(b2).unwrap().groups;
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_mandatory());
        let edge = &groups[0].sources[0];
        assert_eq!(edge.target, Address::basic(2, 1, 1));
        assert_eq!(edge.value_weight, 0.25);
        assert_eq!(edge.cost_weight, 0.1);
    }

    #[test]
    fn regular_weight_overrides_quality() {
        let (graph, _) = parse_list_str(BASIC).unwrap();
        assert_eq!(graph.basic(Address::basic(1, 1, 1)).unwrap().quality, 7.5);
    }

    #[test]
    fn malformed_cost_substitutes_zero() {
        let text = "demo\n<Knobs>\nK [(fast-2.0)]\n";
        let (graph, report) = parse_list_str(text).unwrap();
        let b1 = Address::basic(1, 1, 1);
        assert_eq!(graph.basic(b1).unwrap().cost, 0.0);
        assert_eq!(graph.basic(b1).unwrap().quality, 2.0);
        assert!(matches!(
            report.warnings()[0],
            ParseWarning::MalformedNumericField { .. }
        ));
    }

    #[test]
    fn unresolved_dependency_is_dropped() {
        let text = "\
demo
<Knobs>
K [(1-1),(2-2)]
<Dependencies>
K.1 <- [ghost.0]
";
        let (graph, report) = parse_list_str(text).unwrap();
        let sink = Address::basic(1, 2, 1);
        assert!(graph.basic(sink).unwrap().groups.is_empty());
        assert!(matches!(
            report.warnings()[0],
            ParseWarning::UnresolvedReference { .. }
        ));
    }

    #[test]
    fn alternative_group_keeps_surviving_sources() {
        let text = "\
demo
<Knobs>
K [(1-1),(2-2)]
E [(0-0)]
<Dependencies>
K.1 <- [E.0, ghost.3]
";
        let (graph, report) = parse_list_str(text).unwrap();
        let groups = &graph.basic(Address::basic(1, 2, 1)).unwrap().groups;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sources.len(), 1);
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn edge_weight_on_undeclared_edge_is_dropped() {
        let text = "\
demo
<Knobs>
K [(1-1)]
E [(0-0)]
<Weights>
n1_1_1_n2_1_1 0.5
";
        let (_, report) = parse_list_str(text).unwrap();
        assert!(matches!(
            report.warnings()[0],
            ParseWarning::UnresolvedReference { .. }
        ));
    }

    #[test]
    fn empty_input_has_no_app_name() {
        assert!(matches!(
            parse_list_str(""),
            Err(FrontendError::MissingAppName)
        ));
    }

    #[test]
    fn load_reports_open_failure() {
        let err = load_list("/nonexistent/demo.desc").unwrap_err();
        assert!(matches!(err, FrontendError::InputOpen { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BASIC.as_bytes()).unwrap();
        let (graph, _) = load_list(file.path()).unwrap();
        assert_eq!(graph.app_name(), "demo");
    }
}
