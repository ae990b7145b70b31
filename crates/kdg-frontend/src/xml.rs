//! The XML description front end.
//!
//! The document is a `<resource>` root holding `<knob>` elements; each
//! knob has a `<knobname>` and a list of `<knoblayer>` elements whose
//! `<basicnode>` children carry the node fields:
//!
//! ```text
//! <resource>
//!   <knob>
//!     <knobname>K</knobname>
//!     <knoblayer>
//!       <basicnode>
//!         <nodename>K_0</nodename>
//!         <cost>1.0</cost>
//!         <quality>2.0</quality>
//!         <and>E_0</and>
//!       </basicnode>
//!     </knoblayer>
//!   </knob>
//! </resource>
//! ```
//!
//! Discrete fields are `nodename`, `cost`, `quality` and the edge
//! declarations `and` (one source, optionally `NAME:vw:cw` with
//! weights), `or` (comma-separated alternatives) and `outedge`
//! (comma-separated sinks sharing this node as source). Continuous
//! fields are `contcostquad`/`contcostlinear`/`contcostind` and their
//! `contvalue*` counterparts, `contmin`/`contmax`, a `<piecewise>`
//! segment table, `costcoupling`/`valuecoupling` entries (`NAME:coeff`)
//! and `<contedge>` range couplings.
//!
//! Edge declarations are resolved by node name in a second pass, after
//! every node exists; unresolved names drop the reference with a
//! warning. There is no XML library underneath, just a literal-tag
//! scanner: the dialect never nests a tag inside itself and carries no
//! attributes, so matching `<tag>`/`</tag>` pairs is enough.

use std::fs;
use std::path::Path;

use kdg_core::{
    Address, ContinuousEdge, DependencyGraph, EdgeRef, Interval, LinearPiece, Polynomial,
    RangePair, Segment,
};

use crate::error::FrontendError;
use crate::report::ParseReport;

/// Read an XML description from a file.
pub fn load_xml(
    app: &str,
    path: impl AsRef<Path>,
) -> Result<(DependencyGraph, ParseReport), FrontendError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| FrontendError::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    parse_xml_str(app, &text)
}

/// Parse an XML description held in memory. The application name comes
/// from the caller; the document does not carry one.
pub fn parse_xml_str(
    app: &str,
    xml: &str,
) -> Result<(DependencyGraph, ParseReport), FrontendError> {
    let root = element_body(xml, "resource").ok_or(FrontendError::MissingRoot)?;

    let mut parser = XmlParser {
        graph: DependencyGraph::new(app),
        report: ParseReport::new(),
        pending: Vec::new(),
    };
    for knob in elements(root, "knob") {
        parser.knob(knob);
    }
    parser.resolve_pending();
    Ok((parser.graph, parser.report))
}

/// Edge declarations held until every node has been created.
enum Pending {
    And { sink: Address, spec: String },
    Or { sink: Address, spec: String },
    Out { source: Address, spec: String },
    Cont { sink: Address, block: String },
}

struct XmlParser {
    graph: DependencyGraph,
    report: ParseReport,
    pending: Vec<Pending>,
}

impl XmlParser {
    fn knob(&mut self, block: &str) {
        let Some(name) = element_text(block, "knobname") else {
            return self.report.malformed("<knob>", "missing <knobname>");
        };
        let top = match self.graph.add_knob(name) {
            Ok(addr) => addr,
            Err(err) => return self.report.malformed("<knob>", err.to_string()),
        };
        for layer in elements(block, "knoblayer") {
            let level = match self.graph.add_level(top) {
                Ok(addr) => addr,
                Err(err) => {
                    self.report.malformed("<knoblayer>", err.to_string());
                    continue;
                }
            };
            for bnode in elements(layer, "basicnode") {
                self.basic_node(level, bnode);
            }
        }
    }

    fn basic_node(&mut self, level: Address, block: &str) {
        let name = element_text(block, "nodename").unwrap_or_default();
        let addr = match self.graph.add_basic(level, name) {
            Ok(addr) => addr,
            Err(err) => return self.report.malformed("<basicnode>", err.to_string()),
        };

        if let Some(text) = element_text(block, "cost") {
            let cost = self.report.float_or("cost", &text, 0.0);
            let result = self.graph.set_cost(addr, cost);
            self.apply_res("<basicnode>", result);
        }
        if let Some(text) = element_text(block, "quality") {
            let quality = self.report.float_or("quality", &text, 0.0);
            let result = self.graph.set_quality(addr, quality);
            self.apply_res("<basicnode>", result);
        }

        self.continuous_fields(addr, block);

        for spec in element_texts(block, "and") {
            self.pending.push(Pending::And { sink: addr, spec });
        }
        for spec in element_texts(block, "or") {
            self.pending.push(Pending::Or { sink: addr, spec });
        }
        for spec in element_texts(block, "outedge") {
            self.pending.push(Pending::Out { source: addr, spec });
        }
        for cont in elements(block, "contedge") {
            self.pending.push(Pending::Cont {
                sink: addr,
                block: cont.to_string(),
            });
        }
    }

    fn continuous_fields(&mut self, addr: Address, block: &str) {
        if let Some(poly) = self.polynomial(block, "contcost") {
            let result = self.graph.set_cost_polynomial(addr, poly);
            self.apply_res("<contcost>", result);
        }
        if let Some(poly) = self.polynomial(block, "contvalue") {
            let result = self.graph.set_value_polynomial(addr, poly);
            self.apply_res("<contvalue>", result);
        }

        let min = element_text(block, "contmin");
        let max = element_text(block, "contmax");
        if min.is_some() || max.is_some() {
            let min = self
                .report
                .float_or("contmin", min.as_deref().unwrap_or("0"), 0.0);
            let max = self
                .report
                .float_or("contmax", max.as_deref().unwrap_or("0"), 0.0);
            let result = self.graph.set_domain(addr, Interval::new(min, max));
            self.apply_res("<contmin>", result);
        }

        for piecewise in elements(block, "piecewise") {
            for segment in elements(piecewise, "segment") {
                if let Some(segment) = self.segment(segment) {
                    let result = self.graph.add_segment(addr, segment);
                    self.apply_res("<piecewise>", result);
                }
            }
        }

        for entry in element_texts(block, "costcoupling") {
            if let Some((other, coeff)) = self.coupling_entry(&entry) {
                let result = self.graph.set_cost_coupling(addr, other, coeff);
                self.apply_res(&entry, result);
            }
        }
        for entry in element_texts(block, "valuecoupling") {
            if let Some((other, coeff)) = self.coupling_entry(&entry) {
                let result = self.graph.set_value_coupling(addr, other, coeff);
                self.apply_res(&entry, result);
            }
        }
    }

    /// Collect `<{prefix}quad>`, `<{prefix}linear>`, `<{prefix}ind>`
    /// into a polynomial, if any of the three is present.
    fn polynomial(&mut self, block: &str, prefix: &str) -> Option<Polynomial> {
        let quad = element_text(block, &format!("{prefix}quad"));
        let linear = element_text(block, &format!("{prefix}linear"));
        let ind = element_text(block, &format!("{prefix}ind"));
        if quad.is_none() && linear.is_none() && ind.is_none() {
            return None;
        }
        let mut field = |tag: &str, text: Option<String>| {
            text.map(|t| self.report.float_or(tag, &t, 0.0)).unwrap_or(0.0)
        };
        Some(Polynomial::new(
            field("quad", quad),
            field("linear", linear),
            field("ind", ind),
        ))
    }

    fn segment(&mut self, block: &str) -> Option<Segment> {
        let name = element_text(block, "segmentname")?;
        let mut field = |tag: &str| {
            let text = element_text(block, tag).unwrap_or_default();
            self.report.float_or(tag, &text, 0.0)
        };
        Some(Segment {
            name,
            range: Interval::new(field("segmentmin"), field("segmentmax")),
            cost: LinearPiece::new(field("costlinear"), field("costconst")),
            value: LinearPiece::new(field("valuelinear"), field("valueconst")),
        })
    }

    /// `NAME:coeff` coupling entry.
    fn coupling_entry(&mut self, entry: &str) -> Option<(String, f64)> {
        let Some((name, coeff)) = entry.rsplit_once(':') else {
            self.report.malformed(entry, "expected NAME:coeff");
            return None;
        };
        let coeff = self.report.float_or("coupling coefficient", coeff, 0.0);
        Some((name.trim().to_string(), coeff))
    }

    fn resolve_pending(&mut self) {
        for pending in std::mem::take(&mut self.pending) {
            match pending {
                Pending::And { sink, spec } => {
                    if let Some(edge) = self.edge_ref(&spec) {
                        let result = self.graph.add_mandatory_edge(sink, edge);
                        self.apply_res(&spec, result);
                    }
                }
                Pending::Or { sink, spec } => {
                    let sources: Vec<EdgeRef> = spec
                        .split(',')
                        .filter_map(|entry| self.edge_ref(entry.trim()))
                        .collect();
                    if sources.is_empty() {
                        continue;
                    }
                    let result = self.graph.add_alternative_edges(sink, sources);
                    self.apply_res(&spec, result);
                }
                Pending::Out { source, spec } => {
                    let sinks: Vec<Address> = spec
                        .split(',')
                        .filter_map(|entry| self.named_node(entry.trim()))
                        .collect();
                    if !sinks.is_empty() {
                        self.graph.add_out_edge_group(source, sinks);
                    }
                }
                Pending::Cont { sink, block } => self.continuous_edge(sink, &block),
            }
        }
    }

    /// `NAME[:value_weight[:cost_weight]]` edge entry; the target must
    /// already exist by name.
    fn edge_ref(&mut self, spec: &str) -> Option<EdgeRef> {
        let mut parts = spec.split(':');
        let name = parts.next().unwrap_or("").trim();
        let target = self.named_node(name)?;
        let mut weight = |field: &str| match parts.next() {
            Some(text) => self.report.float_or(field, text, 0.0),
            None => 0.0,
        };
        let value_weight = weight("edge value weight");
        let cost_weight = weight("edge cost weight");
        Some(EdgeRef::with_weights(target, value_weight, cost_weight))
    }

    fn named_node(&mut self, name: &str) -> Option<Address> {
        match self.graph.resolve(name) {
            Some(addr) => Some(addr),
            None => {
                self.report.unresolved(name);
                None
            }
        }
    }

    /// `<contedge><target>NAME</target><range>smin,smax,kmin,kmax</range>...</contedge>`
    fn continuous_edge(&mut self, sink: Address, block: &str) {
        let Some(name) = element_text(block, "target") else {
            return self.report.malformed("<contedge>", "missing <target>");
        };
        let Some(target) = self.named_node(&name) else {
            return;
        };
        let mut ranges = Vec::new();
        for entry in element_texts(block, "range") {
            let fields: Vec<f64> = entry
                .split(',')
                .map(|text| self.report.float_or("range bound", text, 0.0))
                .collect();
            if fields.len() != 4 {
                self.report
                    .malformed(&entry, "expected smin,smax,kmin,kmax");
                continue;
            }
            ranges.push(RangePair {
                source: Interval::new(fields[0], fields[1]),
                sink: Interval::new(fields[2], fields[3]),
            });
        }
        if ranges.is_empty() {
            return;
        }
        let result = self
            .graph
            .add_continuous_edge(sink, ContinuousEdge { target, ranges });
        self.apply_res("<contedge>", result);
    }

    fn apply_res(&mut self, entry: &str, result: Result<(), kdg_core::GraphError>) {
        if let Err(err) = result {
            self.report.malformed(entry, err.to_string());
        }
    }
}

// --- literal-tag scanning ---

/// Iterate the bodies of every non-nested `<tag>...</tag>` occurrence.
fn elements<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut bodies = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let body_start = start + open.len();
        let Some(len) = rest[body_start..].find(&close) else {
            break;
        };
        bodies.push(&rest[body_start..body_start + len]);
        rest = &rest[body_start + len + close.len()..];
    }
    bodies
}

/// Body of the first `<tag>...</tag>` occurrence.
fn element_body<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    elements(xml, tag).into_iter().next()
}

/// Decoded, trimmed text of the first `<tag>` child.
fn element_text(xml: &str, tag: &str) -> Option<String> {
    element_body(xml, tag).map(|body| decode_entities(body.trim()))
}

/// Decoded, trimmed texts of every `<tag>` child.
fn element_texts(xml: &str, tag: &str) -> Vec<String> {
    elements(xml, tag)
        .into_iter()
        .map(|body| decode_entities(body.trim()))
        .collect()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ParseWarning;
    use std::io::Write;

    const BASIC: &str = r#"
<resource>
  <knob>
    <knobname>K</knobname>
    <knoblayer>
      <basicnode>
        <nodename>K_0</nodename>
        <cost>1.0</cost>
        <quality>2.0</quality>
      </basicnode>
    </knoblayer>
    <knoblayer>
      <basicnode>
        <nodename>K_1</nodename>
        <cost>3.0</cost>
        <quality>5.0</quality>
        <and>E_0</and>
      </basicnode>
    </knoblayer>
  </knob>
  <knob>
    <knobname>E</knobname>
    <knoblayer>
      <basicnode>
        <nodename>E_0</nodename>
        <cost>0</cost>
        <quality>0</quality>
      </basicnode>
    </knoblayer>
  </knob>
</resource>
"#;

    #[test]
    fn builds_the_declared_graph() {
        let (graph, report) = parse_xml_str("demo", BASIC).unwrap();
        assert!(report.is_empty(), "{:?}", report.warnings());

        assert_eq!(graph.app_name(), "demo");
        let b2 = Address::basic(1, 2, 1);
        assert_eq!(graph.resolve("K_1"), Some(b2));
        assert_eq!(graph.basic(b2).unwrap().cost, 3.0);
        assert_eq!(graph.basic(b2).unwrap().quality, 5.0);

        let groups = &graph.basic(b2).unwrap().groups;
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_mandatory());
        assert_eq!(groups[0].sources[0].target, Address::basic(2, 1, 1));
    }

    #[test]
    fn forward_references_resolve_in_the_second_pass() {
        // K_1 depends on E_0 although E is declared after K.
        let (graph, report) = parse_xml_str("demo", BASIC).unwrap();
        assert!(report.is_empty());
        assert!(!graph.basic(Address::basic(1, 2, 1)).unwrap().groups.is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        assert!(matches!(
            parse_xml_str("demo", "<knob></knob>"),
            Err(FrontendError::MissingRoot)
        ));
    }

    #[test]
    fn malformed_cost_substitutes_zero() {
        let xml = "\
<resource><knob><knobname>K</knobname><knoblayer><basicnode>\
<nodename>K_0</nodename><cost>fast</cost><quality>2.0</quality>\
</basicnode></knoblayer></knob></resource>";
        let (graph, report) = parse_xml_str("demo", xml).unwrap();
        let b1 = Address::basic(1, 1, 1);
        assert_eq!(graph.basic(b1).unwrap().cost, 0.0);
        assert_eq!(graph.basic(b1).unwrap().quality, 2.0);
        assert!(matches!(
            report.warnings()[0],
            ParseWarning::MalformedNumericField { .. }
        ));
    }

    #[test]
    fn unresolved_edge_is_dropped() {
        let xml = "\
<resource><knob><knobname>K</knobname><knoblayer><basicnode>\
<nodename>K_0</nodename><and>ghost</and>\
</basicnode></knoblayer></knob></resource>";
        let (graph, report) = parse_xml_str("demo", xml).unwrap();
        assert!(graph.basic(Address::basic(1, 1, 1)).unwrap().groups.is_empty());
        assert!(matches!(
            report.warnings()[0],
            ParseWarning::UnresolvedReference { .. }
        ));
    }

    #[test]
    fn weighted_and_alternative_edges() {
        let xml = "\
<resource>\
<knob><knobname>K</knobname><knoblayer><basicnode>\
<nodename>K_0</nodename><and>E_0:0.5:0.25</and><or>E_0,F_0</or>\
</basicnode></knoblayer></knob>\
<knob><knobname>E</knobname><knoblayer><basicnode>\
<nodename>E_0</nodename></basicnode></knoblayer></knob>\
<knob><knobname>F</knobname><knoblayer><basicnode>\
<nodename>F_0</nodename></basicnode></knoblayer></knob>\
</resource>";
        let (graph, report) = parse_xml_str("demo", xml).unwrap();
        assert!(report.is_empty(), "{:?}", report.warnings());

        let groups = &graph.basic(Address::basic(1, 1, 1)).unwrap().groups;
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_mandatory());
        assert_eq!(groups[0].sources[0].value_weight, 0.5);
        assert_eq!(groups[0].sources[0].cost_weight, 0.25);
        assert!(!groups[1].is_mandatory());
        assert_eq!(groups[1].sources.len(), 2);
    }

    #[test]
    fn continuous_fields_populate_the_spec() {
        let xml = "\
<resource><knob><knobname>C</knobname><knoblayer><basicnode>\
<nodename>C_0</nodename>\
<contcostquad>2.0</contcostquad><contcostlinear>1.5</contcostlinear>\
<contvaluelinear>0.5</contvaluelinear>\
<contmin>0.5</contmin><contmax>4.0</contmax>\
<costcoupling>K:0.1</costcoupling>\
</basicnode></knoblayer></knob></resource>";
        let (graph, report) = parse_xml_str("demo", xml).unwrap();
        assert!(report.is_empty(), "{:?}", report.warnings());

        let spec = graph
            .basic(Address::basic(1, 1, 1))
            .unwrap()
            .continuous
            .as_ref()
            .unwrap();
        assert_eq!(spec.cost_poly, Some(Polynomial::new(2.0, 1.5, 0.0)));
        assert_eq!(spec.value_poly, Some(Polynomial::new(0.0, 0.5, 0.0)));
        assert_eq!(spec.domain, Some(Interval::new(0.5, 4.0)));
        assert_eq!(spec.cost_coupling.get("K"), Some(&0.1));
    }

    #[test]
    fn piecewise_segments_and_polynomials_conflict() {
        let xml = "\
<resource><knob><knobname>P</knobname><knoblayer><basicnode>\
<nodename>P_0</nodename>\
<piecewise><segment>\
<segmentname>s1</segmentname><segmentmin>0</segmentmin><segmentmax>2</segmentmax>\
<costlinear>1</costlinear><costconst>0.5</costconst>\
<valuelinear>2</valuelinear><valueconst>0</valueconst>\
</segment></piecewise>\
<contcostlinear>1.0</contcostlinear>\
</basicnode></knoblayer></knob></resource>";
        let (graph, report) = parse_xml_str("demo", xml).unwrap();

        let spec = graph
            .basic(Address::basic(1, 1, 1))
            .unwrap()
            .continuous
            .as_ref()
            .unwrap();
        assert_eq!(spec.segments.len(), 1);
        assert_eq!(spec.segments[0].cost, LinearPiece::new(1.0, 0.5));
        // The conflicting polynomial is dropped with a warning.
        assert_eq!(spec.cost_poly, None);
        assert!(!report.is_empty());
    }

    #[test]
    fn continuous_edge_ranges() {
        let xml = "\
<resource>\
<knob><knobname>A</knobname><knoblayer><basicnode>\
<nodename>A_0</nodename><contmin>0</contmin><contmax>10</contmax>\
<contedge><target>B_0</target>\
<range>0,1,0,5</range><range>1,2,5,10</range></contedge>\
</basicnode></knoblayer></knob>\
<knob><knobname>B</knobname><knoblayer><basicnode>\
<nodename>B_0</nodename><contmin>0</contmin><contmax>10</contmax>\
</basicnode></knoblayer></knob>\
</resource>";
        let (graph, report) = parse_xml_str("demo", xml).unwrap();
        assert!(report.is_empty(), "{:?}", report.warnings());

        let spec = graph
            .basic(Address::basic(1, 1, 1))
            .unwrap()
            .continuous
            .as_ref()
            .unwrap();
        assert_eq!(spec.edges.len(), 1);
        assert_eq!(spec.edges[0].target, Address::basic(2, 1, 1));
        assert_eq!(spec.edges[0].ranges.len(), 2);
        assert_eq!(spec.edges[0].ranges[1].source, Interval::new(1.0, 2.0));
        assert_eq!(spec.edges[0].ranges[1].sink, Interval::new(5.0, 10.0));
    }

    #[test]
    fn entities_are_decoded() {
        let xml = "\
<resource><knob><knobname>a&amp;b</knobname><knoblayer><basicnode>\
<nodename>n0</nodename></basicnode></knoblayer></knob></resource>";
        let (graph, _) = parse_xml_str("demo", xml).unwrap();
        assert!(graph.resolve("a&b").is_some());
    }

    #[test]
    fn load_reports_open_failure() {
        let err = load_xml("demo", "/nonexistent/demo.xml").unwrap_err();
        assert!(matches!(err, FrontendError::InputOpen { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BASIC.as_bytes()).unwrap();
        let (graph, _) = load_xml("demo", file.path()).unwrap();
        assert_eq!(graph.resolve("K_1"), Some(Address::basic(1, 2, 1)));
    }
}
