//! Visual export: a Graphviz DOT rendering of a KAMI graph.
//!
//! Rendering runs in two phases. Every agent and everything it contains is
//! emitted first, then the relationships. Graphviz takes a node's label and
//! style from its first mention, so a relationship edge must never be the
//! first thing to reference a node. [`NodePhase`] and [`EdgePhase`] make the
//! order a type-level guarantee.

use kami_core::graph::KamiGraph;
use kami_core::model::{AnnotationKind, CLAUSE_SEPARATOR, ComponentKind, Endpoints, Node};
use kami_core::{KamiError, NodeId};
use std::collections::HashSet;
use std::fmt;

type Style = &'static [(&'static str, &'static str)];

const AGENT_STYLE: Style = &[
    ("color", "lightgrey"),
    ("style", "filled"),
    ("fontname", "arial"),
];
const SITE_STYLE: Style = &[("color", "red"), ("style", "filled"), ("fontname", "arial")];
const KEY_RESIDUE_STYLE: Style = &[("color", "green"), ("style", "filled"), ("fontname", "arial")];
const FLAG_STYLE: Style = &[
    ("color", "pink"),
    ("style", "filled"),
    ("shape", "component"),
    ("fontname", "arial"),
    ("fontsize", "10"),
];
const ATTRIBUTE_STYLE: Style = &[
    ("color", "sandybrown"),
    ("style", "filled"),
    ("shape", "component"),
    ("fontname", "arial"),
    ("fontsize", "10"),
];
const DIRECTED_STYLE: Style = &[
    ("shape", "diamond"),
    ("fontname", "arial"),
    ("color", "lightblue"),
    ("style", "filled"),
    ("fontsize", "10"),
];
const UNDIRECTED_STYLE: Style = &[
    ("shape", "square"),
    ("fontname", "arial"),
    ("color", "lightblue"),
    ("style", "filled"),
    ("fontsize", "10"),
];
const CONTAINMENT_EDGE_STYLE: Style = &[("fontname", "arial"), ("fontsize", "9")];
const RELATIONSHIP_EDGE_STYLE: Style = &[
    ("fontname", "arial"),
    ("fontsize", "9"),
    ("style", "dotted"),
];

/// A node with its DOT attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotNode {
    pub id: String,
    pub attrs: Vec<(&'static str, String)>,
}

impl DotNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A directed edge with its DOT attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotEdge {
    pub source: String,
    pub target: String,
    pub attrs: Vec<(&'static str, String)>,
}

impl DotEdge {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A named group of nodes drawn inside one boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotCluster {
    pub name: String,
    pub nodes: Vec<String>,
}

/// Abstract node/edge/cluster structure handed to Graphviz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotGraph {
    pub name: String,
    pub nodes: Vec<DotNode>,
    pub edges: Vec<DotEdge>,
    pub clusters: Vec<DotCluster>,
}

impl DotGraph {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&DotNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn cluster(&self, name: &str) -> Option<&DotCluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    fn push_node(&mut self, id: String, label: String, style: Style) {
        let mut attrs = vec![("label", label)];
        attrs.extend(style.iter().map(|&(k, v)| (k, v.to_string())));
        self.nodes.push(DotNode { id, attrs });
    }

    fn push_edge(&mut self, source: String, target: String, label: Option<&str>, style: Style) {
        let mut attrs = Vec::new();
        if let Some(label) = label {
            attrs.push(("label", label.to_string()));
        }
        attrs.extend(style.iter().map(|&(k, v)| (k, v.to_string())));
        self.edges.push(DotEdge {
            source,
            target,
            attrs,
        });
    }
}

/// Quote a DOT identifier or attribute value. A newline becomes the DOT
/// line-break escape `\n`.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_attrs(f: &mut fmt::Formatter<'_>, attrs: &[(&'static str, String)]) -> fmt::Result {
    if attrs.is_empty() {
        return Ok(());
    }
    let rendered: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!("{}={}", k, quote(v)))
        .collect();
    write!(f, " [{}]", rendered.join(", "))
}

impl fmt::Display for DotGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {} {{", quote(&self.name))?;
        for node in &self.nodes {
            write!(f, "  {}", quote(&node.id))?;
            write_attrs(f, &node.attrs)?;
            writeln!(f, ";")?;
        }
        for cluster in &self.clusters {
            writeln!(f, "  subgraph {} {{", quote(&cluster.name))?;
            for id in &cluster.nodes {
                writeln!(f, "    {};", quote(id))?;
            }
            writeln!(f, "  }}")?;
        }
        for edge in &self.edges {
            write!(f, "  {} -> {}", quote(&edge.source), quote(&edge.target))?;
            write_attrs(f, &edge.attrs)?;
            writeln!(f, ";")?;
        }
        writeln!(f, "}}")
    }
}

/// First phase: agents and everything they contain.
pub struct NodePhase<'g> {
    graph: &'g KamiGraph,
    dot: DotGraph,
    rendered: HashSet<NodeId>,
}

impl<'g> NodePhase<'g> {
    pub fn new(graph: &'g KamiGraph) -> Self {
        Self {
            graph,
            dot: DotGraph::new(&graph.name),
            rendered: HashSet::new(),
        }
    }

    /// Render an agent's subtree and wrap it in `cluster_<agent-id>`.
    pub fn render_agent(&mut self, agent: NodeId) -> Result<(), KamiError> {
        let members = self.render_subtree(agent)?;
        self.dot.clusters.push(DotCluster {
            name: format!("cluster_{}", agent),
            nodes: members,
        });
        Ok(())
    }

    fn render_subtree(&mut self, id: NodeId) -> Result<Vec<String>, KamiError> {
        let graph = self.graph;
        let node = graph.model().node(id)?;
        let (label, style) = match node {
            Node::Component(c) => (c.name.clone(), component_style(c.kind)),
            Node::Annotation(a) => {
                let label = match a.formula() {
                    Some(formula) => format!(
                        "{}: {}",
                        a.name,
                        formula.replace(CLAUSE_SEPARATOR, ",\n")
                    ),
                    None => a.name.clone(),
                };
                (label, annotation_style(a.kind))
            }
            Node::Relationship(_) => {
                return Err(KamiError::WrongNodeKind {
                    id,
                    expected: "component or annotation",
                });
            }
        };

        let key = id.to_string();
        self.dot.push_node(key.clone(), label, style);
        self.rendered.insert(id);
        let mut members = vec![key.clone()];

        if let Node::Component(c) = node {
            for (slot, child) in c.children() {
                members.extend(self.render_subtree(child)?);
                self.dot.push_edge(
                    key.clone(),
                    child.to_string(),
                    Some(slot.label()),
                    CONTAINMENT_EDGE_STYLE,
                );
            }
        }
        Ok(members)
    }

    /// Close the node phase. No further nodes can be added.
    pub fn finish(self) -> EdgePhase<'g> {
        EdgePhase {
            graph: self.graph,
            dot: self.dot,
            rendered: self.rendered,
        }
    }
}

/// Second phase: relationships between nodes that already exist.
pub struct EdgePhase<'g> {
    graph: &'g KamiGraph,
    dot: DotGraph,
    rendered: HashSet<NodeId>,
}

impl EdgePhase<'_> {
    /// Render a relationship as an intermediate node wired to its endpoints.
    pub fn render_relationship(&mut self, id: NodeId) -> Result<(), KamiError> {
        let graph = self.graph;
        let rel = graph.model().relationship(id)?;
        let key = rel.key();
        for endpoint in rel.participants() {
            if !self.rendered.contains(&endpoint) {
                return Err(KamiError::DanglingEndpoint {
                    relationship: key,
                    endpoint,
                });
            }
        }

        match rel.endpoints() {
            Endpoints::Directed { source, target } => {
                self.dot.push_node(key.clone(), key.clone(), DIRECTED_STYLE);
                self.dot
                    .push_edge(source.to_string(), key.clone(), None, RELATIONSHIP_EDGE_STYLE);
                self.dot
                    .push_edge(key, target.to_string(), None, RELATIONSHIP_EDGE_STYLE);
            }
            Endpoints::Undirected(participants) => {
                self.dot.push_node(key.clone(), key.clone(), UNDIRECTED_STYLE);
                for p in participants {
                    self.dot
                        .push_edge(p.to_string(), key.clone(), None, RELATIONSHIP_EDGE_STYLE);
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> DotGraph {
        self.dot
    }
}

fn component_style(kind: ComponentKind) -> Style {
    match kind {
        ComponentKind::Agent => AGENT_STYLE,
        ComponentKind::Site => SITE_STYLE,
        ComponentKind::KeyResidue => KEY_RESIDUE_STYLE,
    }
}

fn annotation_style(kind: AnnotationKind) -> Style {
    match kind {
        AnnotationKind::Flag => FLAG_STYLE,
        AnnotationKind::Attribute => ATTRIBUTE_STYLE,
    }
}

/// Build the DOT structure: all agents first, then all relationships.
pub fn render(graph: &KamiGraph) -> Result<DotGraph, KamiError> {
    let mut nodes = NodePhase::new(graph);
    for agent in graph.agents() {
        nodes.render_agent(agent)?;
    }
    let mut edges = nodes.finish();
    for &rel in graph.relationships() {
        edges.render_relationship(rel)?;
    }
    Ok(edges.finish())
}

/// Render the graph as DOT text.
pub fn export_dot(graph: &KamiGraph) -> Result<String, KamiError> {
    Ok(render(graph)?.to_string())
}
