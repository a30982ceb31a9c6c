//! Structured export: the action-graph JSON document read by the rule engine.
//!
//! Every node is addressed by its path, the identifiers from its root agent
//! down to itself. Each relationship becomes an action with binder stubs that
//! edges attach to by role, and a context describing both endpoints and their
//! ancestors in the state the action expects before it fires.

use kami_core::graph::KamiGraph;
use kami_core::model::{Endpoints, Model, Node, NodeKind, Relationship};
use kami_core::{KamiError, NodeId};
use serde::{Deserialize, Serialize};

pub const FORMAT_NAME: &str = "kami_action_graph";
pub const FORMAT_VERSION: &str = "1.0";
const GENERATOR: &str = "kami";

/// Value every flag and attribute in an action context takes before the action.
pub const UNMODIFIED_VALUE: &str = "unphos";

/// Fixed metadata header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infos {
    pub format: String,
    pub version: String,
    pub generator: String,
    pub graph: String,
}

/// An agent, region, key residue, flag, or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub label: String,
    pub path: Vec<String>,
    /// Set on flags and attributes whose value has been determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,
}

/// One node visited while walking up from an action endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Binder role of the endpoint this entry was reached from.
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub label: String,
    pub path: Vec<String>,
    pub context: Vec<ContextEntry>,
}

/// A role stub on an action that edges can attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinderRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub label: String,
    pub action: String,
    pub path: Vec<String>,
}

/// Connects a binder to the node it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub from: Vec<String>,
    pub to: Vec<String>,
}

/// The complete document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGraph {
    pub infos: Infos,
    pub agents: Vec<NodeRecord>,
    pub regions: Vec<NodeRecord>,
    pub key_rs: Vec<NodeRecord>,
    pub attributes: Vec<NodeRecord>,
    pub flags: Vec<NodeRecord>,
    pub actions: Vec<ActionRecord>,
    pub actions_binder: Vec<BinderRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl ActionGraph {
    fn empty(graph_name: &str) -> Self {
        Self {
            infos: Infos {
                format: FORMAT_NAME.to_string(),
                version: FORMAT_VERSION.to_string(),
                generator: GENERATOR.to_string(),
                graph: graph_name.to_string(),
            },
            agents: Vec::new(),
            regions: Vec::new(),
            key_rs: Vec::new(),
            attributes: Vec::new(),
            flags: Vec::new(),
            actions: Vec::new(),
            actions_binder: Vec::new(),
            edges: Vec::new(),
        }
    }
}

fn type_tag(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Agent => "agent",
        NodeKind::Site => "region",
        NodeKind::KeyResidue => "key_residue",
        NodeKind::Flag => "flag",
        NodeKind::Attribute => "attribute",
        NodeKind::DirectedBinary | NodeKind::UndirectedNAry => "action",
    }
}

fn path_of(model: &Model, id: NodeId) -> Result<Vec<String>, KamiError> {
    Ok(model.path(id)?.iter().map(ToString::to_string).collect())
}

fn node_record(model: &Model, id: NodeId) -> Result<NodeRecord, KamiError> {
    let node = model.node(id)?;
    let (formula, is_abstract) = match node {
        Node::Component(c) => (None, c.is_abstract),
        Node::Annotation(a) => (a.formula().map(str::to_string), false),
        Node::Relationship(_) => (None, false),
    };
    Ok(NodeRecord {
        kind: type_tag(node.kind()).to_string(),
        id: id.to_string(),
        label: node.label(),
        path: path_of(model, id)?,
        formula,
        is_abstract,
    })
}

fn context_entry(model: &Model, role: &str, id: NodeId) -> Result<ContextEntry, KamiError> {
    let kind = model.node(id)?.kind();
    let value = matches!(kind, NodeKind::Flag | NodeKind::Attribute)
        .then(|| UNMODIFIED_VALUE.to_string());
    Ok(ContextEntry {
        role: role.to_string(),
        kind: type_tag(kind).to_string(),
        path: path_of(model, id)?,
        value,
    })
}

/// The endpoint itself, then each ancestor up to its agent.
fn push_walk(
    model: &Model,
    role: &str,
    start: NodeId,
    out: &mut Vec<ContextEntry>,
) -> Result<(), KamiError> {
    for id in model.ancestors(start)? {
        out.push(context_entry(model, role, id)?);
    }
    Ok(())
}

fn binder(key: &str, role: &str, id: String) -> BinderRecord {
    BinderRecord {
        kind: "binder".to_string(),
        path: vec![key.to_string(), id.clone()],
        id,
        label: role.to_string(),
        action: key.to_string(),
    }
}

fn push_action(model: &Model, rel: &Relationship, doc: &mut ActionGraph) -> Result<(), KamiError> {
    let key = rel.key();
    let mut context = Vec::new();

    match rel.endpoints() {
        Endpoints::Directed { source, target } => {
            push_walk(model, "left", *source, &mut context)?;
            // The flags this action sets are part of the target's precondition.
            for flag in model.flags_set_by(rel.id())? {
                if flag != *target {
                    context.push(context_entry(model, "right", flag)?);
                }
            }
            push_walk(model, "right", *target, &mut context)?;

            let left = binder(&key, "left", format!("{}_left", key));
            let right = binder(&key, "right", format!("{}_right", key));
            doc.edges.push(EdgeRecord {
                kind: "edge".to_string(),
                from: right.path.clone(),
                to: path_of(model, *target)?,
            });
            doc.actions_binder.push(left);
            doc.actions_binder.push(right);
        }
        Endpoints::Undirected(participants) => {
            for (i, &p) in participants.iter().enumerate() {
                push_walk(model, "partner", p, &mut context)?;
                let partner = binder(&key, "partner", format!("{}_partner{}", key, i));
                doc.edges.push(EdgeRecord {
                    kind: "edge".to_string(),
                    from: partner.path.clone(),
                    to: path_of(model, p)?,
                });
                doc.actions_binder.push(partner);
            }
        }
    }

    doc.actions.push(ActionRecord {
        kind: rel.kind().as_str().to_string(),
        id: key.clone(),
        label: key.clone(),
        path: vec![key],
        context,
    });
    Ok(())
}

/// Walk the graph once and fill every bucket.
///
/// Fails with [`KamiError::DanglingEndpoint`] if a relationship reaches a
/// node whose agent is not in the graph.
pub fn build_action_graph(graph: &KamiGraph) -> Result<ActionGraph, KamiError> {
    graph.validate()?;
    let model = graph.model();
    let mut doc = ActionGraph::empty(&graph.name);

    for agent in graph.agents() {
        for id in model.descendants(agent)? {
            let record = node_record(model, id)?;
            match model.node(id)?.kind() {
                NodeKind::Agent => doc.agents.push(record),
                NodeKind::Site => doc.regions.push(record),
                NodeKind::KeyResidue => doc.key_rs.push(record),
                NodeKind::Flag => doc.flags.push(record),
                NodeKind::Attribute => doc.attributes.push(record),
                NodeKind::DirectedBinary | NodeKind::UndirectedNAry => {}
            }
        }
    }

    for &id in graph.relationships() {
        push_action(model, model.relationship(id)?, &mut doc)?;
    }
    Ok(doc)
}

/// Render the action graph as pretty-printed JSON.
pub fn export_action_graph(graph: &KamiGraph) -> anyhow::Result<String> {
    let doc = build_action_graph(graph)?;
    Ok(serde_json::to_string_pretty(&doc)?)
}
