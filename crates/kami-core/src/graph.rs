//! Graph container: the root agents and relationships handed to the exporters.

use crate::config::ResidueContainer;
use crate::convert::FactConverter;
use crate::error::KamiError;
use crate::fact::Fact;
use crate::ids::NodeId;
use crate::model::{ComponentKind, Model, Node, NodeKind};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// A named KAMI graph: a model plus the agents and relationships selected for export.
#[derive(Debug, Clone)]
pub struct KamiGraph {
    pub name: String,
    pub created_at: DateTime<Utc>,
    model: Model,
    /// Root agents, deduplicated by name.
    agents: BTreeMap<String, NodeId>,
    /// Relationships in creation order.
    relationships: Vec<NodeId>,
}

/// Node counts by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub agents: usize,
    pub sites: usize,
    pub key_residues: usize,
    pub flags: usize,
    pub attributes: usize,
    pub directed: usize,
    pub undirected: usize,
}

impl KamiGraph {
    /// Build a container from the nodes touched while converting facts.
    ///
    /// Agents and relationships are kept; sites, residues, and annotations
    /// are reached through their agents. Duplicate ids collapse.
    pub fn new(
        name: impl Into<String>,
        model: Model,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<Self, KamiError> {
        let selected: BTreeSet<NodeId> = nodes.into_iter().collect();
        let mut agents: BTreeMap<String, NodeId> = BTreeMap::new();
        let mut relationships = Vec::new();

        for id in selected {
            match model.node(id)? {
                Node::Component(c) if c.kind == ComponentKind::Agent => {
                    if let Some(&first) = agents.get(&c.name)
                        && first != id
                    {
                        return Err(KamiError::DuplicateAgent {
                            name: c.name.clone(),
                            first,
                            second: id,
                        });
                    }
                    agents.insert(c.name.clone(), id);
                }
                Node::Relationship(_) => relationships.push(id),
                _ => {}
            }
        }

        Ok(Self {
            name: name.into(),
            created_at: Utc::now(),
            model,
            agents,
            relationships,
        })
    }

    /// Convert `facts` in order and collect everything they touch. Halts on
    /// the first rejected fact.
    pub fn from_facts<'a>(
        name: impl Into<String>,
        facts: impl IntoIterator<Item = &'a Fact>,
        residue_container: ResidueContainer,
    ) -> Result<Self, KamiError> {
        let mut converter = FactConverter::with_residue_container(residue_container);
        let mut touched = BTreeSet::new();
        for fact in facts {
            touched.extend(converter.convert(fact)?);
        }
        Self::new(name, converter.into_model(), touched)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Root agents ordered by name.
    pub fn agents(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.agents.values().copied()
    }

    pub fn agent(&self, name: &str) -> Option<NodeId> {
        self.agents.get(name).copied()
    }

    pub fn relationships(&self) -> &[NodeId] {
        &self.relationships
    }

    /// Check that every relationship endpoint hangs off an agent in this graph.
    pub fn validate(&self) -> Result<(), KamiError> {
        let roots: BTreeSet<NodeId> = self.agents().collect();
        for &rel_id in &self.relationships {
            let rel = self.model.relationship(rel_id)?;
            for endpoint in rel.participants() {
                let root = self.model.root_of(endpoint)?;
                if !roots.contains(&root) {
                    return Err(KamiError::DanglingEndpoint {
                        relationship: rel.key(),
                        endpoint,
                    });
                }
            }
        }
        Ok(())
    }

    /// Count the nodes reachable from the root agents, plus the relationships.
    pub fn stats(&self) -> Result<GraphStats, KamiError> {
        let mut stats = GraphStats::default();
        for agent in self.agents() {
            for id in self.model.descendants(agent)? {
                match self.model.node(id)?.kind() {
                    NodeKind::Agent => stats.agents += 1,
                    NodeKind::Site => stats.sites += 1,
                    NodeKind::KeyResidue => stats.key_residues += 1,
                    NodeKind::Flag => stats.flags += 1,
                    NodeKind::Attribute => stats.attributes += 1,
                    NodeKind::DirectedBinary | NodeKind::UndirectedNAry => {}
                }
            }
        }
        for &id in &self.relationships {
            match self.model.node(id)?.kind() {
                NodeKind::DirectedBinary => stats.directed += 1,
                _ => stats.undirected += 1,
            }
        }
        Ok(stats)
    }
}
