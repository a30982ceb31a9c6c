//! Model arena: agents, sites, key residues, their flags and attributes, and
//! the relationships between them.
//!
//! Every node lives in a single [`Model`] keyed by its [`NodeId`]. Parent
//! links are plain identifiers used only to rebuild paths; ownership sits with
//! the arena. Children are reached through per-component name registries, which
//! are also the only deduplication mechanism in the model.

use crate::error::KamiError;
use crate::ids::{IdAllocator, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between the relationships that can set a flag.
pub const OR_SEPARATOR: &str = " or ";

/// Separator between activity conditions: a comma followed by the two
/// characters `\` and `n`, which the DOT renderer turns into a line break.
pub const CLAUSE_SEPARATOR: &str = ",\\n";

/// Agent → site → key residue → flag is the deepest legal chain.
const MAX_DEPTH: usize = 4;

/// Role of a component in the containment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Agent,
    Site,
    KeyResidue,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Agent => "agent",
            ComponentKind::Site => "site",
            ComponentKind::KeyResidue => "key residue",
        }
    }
}

/// Flags and attributes behave identically; only their rendering differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Flag,
    Attribute,
}

impl AnnotationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Flag => "flag",
            AnnotationKind::Attribute => "attribute",
        }
    }
}

/// The concrete relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Directed binary: an enzyme modifies its target.
    Phosphorylation,
    /// Undirected, exactly two participants.
    Bind,
    /// Undirected, two or more participants.
    Complex,
}

impl RelationshipKind {
    /// Prefix that keeps relationship identifiers apart from component ids.
    pub fn tag(self) -> &'static str {
        match self {
            RelationshipKind::Phosphorylation => "p",
            RelationshipKind::Bind => "b",
            RelationshipKind::Complex => "cplx",
        }
    }

    pub fn is_directed(self) -> bool {
        matches!(self, RelationshipKind::Phosphorylation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Phosphorylation => "phosphorylation",
            RelationshipKind::Bind => "bind",
            RelationshipKind::Complex => "complex",
        }
    }
}

/// Flat tag over every node type, used by the exporters to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Agent,
    Site,
    KeyResidue,
    Flag,
    Attribute,
    DirectedBinary,
    UndirectedNAry,
}

/// Which registry of a component a child lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildSlot {
    Site,
    KeyResidue,
    Flag,
    Attribute,
}

impl ChildSlot {
    /// Label of the containment edge from parent to child.
    pub fn label(self) -> &'static str {
        match self {
            ChildSlot::Site => "site",
            ChildSlot::KeyResidue => "kr",
            ChildSlot::Flag => "flag",
            ChildSlot::Attribute => "attr",
        }
    }

    fn child_name(self) -> &'static str {
        match self {
            ChildSlot::Site => "site",
            ChildSlot::KeyResidue => "key residue",
            ChildSlot::Flag => "flag",
            ChildSlot::Attribute => "attribute",
        }
    }

    fn construct(self, id: NodeId, name: &str, parent: NodeId) -> Node {
        match self {
            ChildSlot::Site => {
                Node::Component(Component::new(id, ComponentKind::Site, name, Some(parent)))
            }
            ChildSlot::KeyResidue => Node::Component(Component::new(
                id,
                ComponentKind::KeyResidue,
                name,
                Some(parent),
            )),
            ChildSlot::Flag => {
                Node::Annotation(Annotation::new(id, AnnotationKind::Flag, name, parent))
            }
            ChildSlot::Attribute => {
                Node::Annotation(Annotation::new(id, AnnotationKind::Attribute, name, parent))
            }
        }
    }
}

/// An agent, site, or key residue.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: NodeId,
    pub kind: ComponentKind,
    pub name: String,
    /// Absent for agents.
    pub parent: Option<NodeId>,
    pub is_abstract: bool,
    /// Only populated on agents.
    pub sites: BTreeMap<String, NodeId>,
    /// Populated on agents and sites.
    pub key_residues: BTreeMap<String, NodeId>,
    pub flags: BTreeMap<String, NodeId>,
    pub attributes: BTreeMap<String, NodeId>,
    /// Opaque payloads carried through to callers untouched.
    pub annotations: Vec<serde_json::Value>,
}

impl Component {
    fn new(id: NodeId, kind: ComponentKind, name: &str, parent: Option<NodeId>) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            parent,
            is_abstract: false,
            sites: BTreeMap::new(),
            key_residues: BTreeMap::new(),
            flags: BTreeMap::new(),
            attributes: BTreeMap::new(),
            annotations: Vec::new(),
        }
    }

    fn registry(&self, slot: ChildSlot) -> Option<&BTreeMap<String, NodeId>> {
        match (self.kind, slot) {
            (ComponentKind::Agent, ChildSlot::Site) => Some(&self.sites),
            (ComponentKind::Agent | ComponentKind::Site, ChildSlot::KeyResidue) => {
                Some(&self.key_residues)
            }
            (_, ChildSlot::Flag) => Some(&self.flags),
            (_, ChildSlot::Attribute) => Some(&self.attributes),
            _ => None,
        }
    }

    fn registry_mut(&mut self, slot: ChildSlot) -> Option<&mut BTreeMap<String, NodeId>> {
        match (self.kind, slot) {
            (ComponentKind::Agent, ChildSlot::Site) => Some(&mut self.sites),
            (ComponentKind::Agent | ComponentKind::Site, ChildSlot::KeyResidue) => {
                Some(&mut self.key_residues)
            }
            (_, ChildSlot::Flag) => Some(&mut self.flags),
            (_, ChildSlot::Attribute) => Some(&mut self.attributes),
            _ => None,
        }
    }

    /// All direct children in rendering order: sites, key residues, flags, attributes.
    pub fn children(&self) -> impl Iterator<Item = (ChildSlot, NodeId)> + '_ {
        let sites = self.sites.values().map(|&id| (ChildSlot::Site, id));
        let residues = self
            .key_residues
            .values()
            .map(|&id| (ChildSlot::KeyResidue, id));
        let flags = self.flags.values().map(|&id| (ChildSlot::Flag, id));
        let attributes = self.attributes.values().map(|&id| (ChildSlot::Attribute, id));
        sites.chain(residues).chain(flags).chain(attributes)
    }
}

/// A flag or attribute: a named formula holder attached to a component.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: NodeId,
    pub kind: AnnotationKind,
    pub name: String,
    pub parent: NodeId,
    formula: Option<String>,
}

impl Annotation {
    fn new(id: NodeId, kind: AnnotationKind, name: &str, parent: NodeId) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            parent,
            formula: None,
        }
    }

    /// `None` means the value has not been determined by any fact yet.
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Set the formula to `term` if empty, otherwise append `separator` and `term`.
    pub fn accumulate(&mut self, term: &str, separator: &str) {
        match &mut self.formula {
            Some(formula) => {
                formula.push_str(separator);
                formula.push_str(term);
            }
            None => self.formula = Some(term.to_string()),
        }
    }

    /// Terms of an `or`-joined formula.
    pub fn disjuncts(&self) -> impl Iterator<Item = &str> {
        self.formula
            .as_deref()
            .into_iter()
            .flat_map(|f| f.split(OR_SEPARATOR))
    }
}

/// Fixed endpoints of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoints {
    Directed { source: NodeId, target: NodeId },
    Undirected(Vec<NodeId>),
}

/// An edge or hyperedge. Endpoints are fixed at construction.
#[derive(Debug, Clone)]
pub struct Relationship {
    id: NodeId,
    kind: RelationshipKind,
    endpoints: Endpoints,
}

impl Relationship {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Type-tagged identifier, e.g. `p7`, `b12`, `cplx3`.
    pub fn key(&self) -> String {
        format!("{}{}", self.kind.tag(), self.id)
    }

    /// Every endpoint in order (source then target for directed relationships).
    pub fn participants(&self) -> Vec<NodeId> {
        match &self.endpoints {
            Endpoints::Directed { source, target } => vec![*source, *target],
            Endpoints::Undirected(nodes) => nodes.clone(),
        }
    }
}

/// Any node stored in the arena.
#[derive(Debug, Clone)]
pub enum Node {
    Component(Component),
    Annotation(Annotation),
    Relationship(Relationship),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Component(c) => c.id,
            Node::Annotation(a) => a.id,
            Node::Relationship(r) => r.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Component(c) => match c.kind {
                ComponentKind::Agent => NodeKind::Agent,
                ComponentKind::Site => NodeKind::Site,
                ComponentKind::KeyResidue => NodeKind::KeyResidue,
            },
            Node::Annotation(a) => match a.kind {
                AnnotationKind::Flag => NodeKind::Flag,
                AnnotationKind::Attribute => NodeKind::Attribute,
            },
            Node::Relationship(r) if r.kind.is_directed() => NodeKind::DirectedBinary,
            Node::Relationship(_) => NodeKind::UndirectedNAry,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Component(c) => c.parent,
            Node::Annotation(a) => Some(a.parent),
            Node::Relationship(_) => None,
        }
    }

    /// Display label: the name of a component or annotation, the key of a relationship.
    pub fn label(&self) -> String {
        match self {
            Node::Component(c) => c.name.clone(),
            Node::Annotation(a) => a.name.clone(),
            Node::Relationship(r) => r.key(),
        }
    }
}

/// Optional initial children for a newly created agent or site.
///
/// Each entry goes through the same get-or-create path as lazy creation, so
/// duplicate names collapse onto one child.
#[derive(Debug, Clone, Default)]
pub struct ComponentInit {
    pub is_abstract: bool,
    pub sites: Vec<String>,
    pub key_residues: Vec<String>,
    pub flags: Vec<String>,
    pub attributes: Vec<String>,
    pub annotations: Vec<serde_json::Value>,
}

/// Owning arena for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct Model {
    ids: IdAllocator,
    nodes: BTreeMap<NodeId, Node>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, KamiError> {
        self.nodes.get(&id).ok_or(KamiError::UnknownNode(id))
    }

    pub fn component(&self, id: NodeId) -> Result<&Component, KamiError> {
        match self.node(id)? {
            Node::Component(c) => Ok(c),
            _ => Err(KamiError::WrongNodeKind {
                id,
                expected: "component",
            }),
        }
    }

    pub fn annotation(&self, id: NodeId) -> Result<&Annotation, KamiError> {
        match self.node(id)? {
            Node::Annotation(a) => Ok(a),
            _ => Err(KamiError::WrongNodeKind {
                id,
                expected: "flag or attribute",
            }),
        }
    }

    pub fn relationship(&self, id: NodeId) -> Result<&Relationship, KamiError> {
        match self.node(id)? {
            Node::Relationship(r) => Ok(r),
            _ => Err(KamiError::WrongNodeKind {
                id,
                expected: "relationship",
            }),
        }
    }

    fn component_mut(&mut self, id: NodeId) -> Result<&mut Component, KamiError> {
        match self.nodes.get_mut(&id) {
            Some(Node::Component(c)) => Ok(c),
            Some(_) => Err(KamiError::WrongNodeKind {
                id,
                expected: "component",
            }),
            None => Err(KamiError::UnknownNode(id)),
        }
    }

    fn annotation_mut(&mut self, id: NodeId) -> Result<&mut Annotation, KamiError> {
        match self.nodes.get_mut(&id) {
            Some(Node::Annotation(a)) => Ok(a),
            Some(_) => Err(KamiError::WrongNodeKind {
                id,
                expected: "flag or attribute",
            }),
            None => Err(KamiError::UnknownNode(id)),
        }
    }

    /// Create a new root agent. Agents are not deduplicated here; the fact
    /// converter keeps the name registry.
    pub fn create_agent(&mut self, name: &str) -> NodeId {
        let id = self.ids.next_id();
        self.nodes.insert(
            id,
            Node::Component(Component::new(id, ComponentKind::Agent, name, None)),
        );
        tracing::debug!(id, name, "created agent");
        id
    }

    /// Create a new root agent with initial children.
    pub fn create_agent_with(&mut self, name: &str, init: ComponentInit) -> Result<NodeId, KamiError> {
        let id = self.create_agent(name);
        self.apply_init(id, init)?;
        Ok(id)
    }

    pub fn get_or_create_site(&mut self, agent: NodeId, name: &str) -> Result<NodeId, KamiError> {
        self.get_or_create_child(agent, ChildSlot::Site, name)
    }

    /// Get or create a site, then register `init`'s children on it.
    pub fn get_or_create_site_with(
        &mut self,
        agent: NodeId,
        name: &str,
        init: ComponentInit,
    ) -> Result<NodeId, KamiError> {
        if !init.sites.is_empty() {
            return Err(KamiError::InvalidContainment {
                parent: ComponentKind::Site.as_str(),
                child: ChildSlot::Site.child_name(),
            });
        }
        let id = self.get_or_create_site(agent, name)?;
        self.apply_init(id, init)?;
        Ok(id)
    }

    /// `parent` must be an agent or a site.
    pub fn get_or_create_key_residue(
        &mut self,
        parent: NodeId,
        name: &str,
    ) -> Result<NodeId, KamiError> {
        self.get_or_create_child(parent, ChildSlot::KeyResidue, name)
    }

    pub fn get_or_create_flag(&mut self, component: NodeId, name: &str) -> Result<NodeId, KamiError> {
        self.get_or_create_child(component, ChildSlot::Flag, name)
    }

    pub fn get_or_create_attribute(
        &mut self,
        component: NodeId,
        name: &str,
    ) -> Result<NodeId, KamiError> {
        self.get_or_create_child(component, ChildSlot::Attribute, name)
    }

    /// Return the child registered under `name` in `parent`'s `slot`
    /// registry, creating and registering it first if absent.
    pub fn get_or_create_child(
        &mut self,
        parent: NodeId,
        slot: ChildSlot,
        name: &str,
    ) -> Result<NodeId, KamiError> {
        let component = self.component(parent)?;
        let Some(registry) = component.registry(slot) else {
            return Err(KamiError::InvalidContainment {
                parent: component.kind.as_str(),
                child: slot.child_name(),
            });
        };
        if let Some(&existing) = registry.get(name) {
            return Ok(existing);
        }

        let id = self.ids.next_id();
        if let Some(registry) = self.component_mut(parent)?.registry_mut(slot) {
            registry.insert(name.to_string(), id);
        }
        self.nodes.insert(id, slot.construct(id, name, parent));
        tracing::debug!(id, parent, name, kind = slot.child_name(), "created child");
        Ok(id)
    }

    fn apply_init(&mut self, id: NodeId, init: ComponentInit) -> Result<(), KamiError> {
        for site in &init.sites {
            self.get_or_create_site(id, site)?;
        }
        for residue in &init.key_residues {
            self.get_or_create_key_residue(id, residue)?;
        }
        for flag in &init.flags {
            self.get_or_create_flag(id, flag)?;
        }
        for attribute in &init.attributes {
            self.get_or_create_attribute(id, attribute)?;
        }
        let component = self.component_mut(id)?;
        component.is_abstract |= init.is_abstract;
        component.annotations.extend(init.annotations);
        Ok(())
    }

    pub fn set_abstract(&mut self, component: NodeId, is_abstract: bool) -> Result<(), KamiError> {
        self.component_mut(component)?.is_abstract = is_abstract;
        Ok(())
    }

    /// Attach an opaque payload to a component.
    pub fn annotate(
        &mut self,
        component: NodeId,
        payload: serde_json::Value,
    ) -> Result<(), KamiError> {
        self.component_mut(component)?.annotations.push(payload);
        Ok(())
    }

    /// Fold `term` into a flag or attribute formula. See [`Annotation::accumulate`].
    pub fn accumulate_formula(
        &mut self,
        annotation: NodeId,
        term: &str,
        separator: &str,
    ) -> Result<(), KamiError> {
        self.annotation_mut(annotation)?.accumulate(term, separator);
        Ok(())
    }

    /// Directed edge from `source` to `target`. Either end may be a component
    /// or an annotation.
    pub fn add_phosphorylation(&mut self, source: NodeId, target: NodeId) -> Result<NodeId, KamiError> {
        for endpoint in [source, target] {
            if let Node::Relationship(_) = self.node(endpoint)? {
                return Err(KamiError::WrongNodeKind {
                    id: endpoint,
                    expected: "component or annotation",
                });
            }
        }
        Ok(self.insert_relationship(
            RelationshipKind::Phosphorylation,
            Endpoints::Directed { source, target },
        ))
    }

    pub fn add_bind(&mut self, first: NodeId, second: NodeId) -> Result<NodeId, KamiError> {
        self.component(first)?;
        self.component(second)?;
        Ok(self.insert_relationship(
            RelationshipKind::Bind,
            Endpoints::Undirected(vec![first, second]),
        ))
    }

    /// Hyperedge over two or more components, in the given order.
    pub fn add_complex(&mut self, participants: &[NodeId]) -> Result<NodeId, KamiError> {
        if participants.len() < 2 {
            return Err(KamiError::TooFewParticipants(participants.len()));
        }
        for &p in participants {
            self.component(p)?;
        }
        Ok(self.insert_relationship(
            RelationshipKind::Complex,
            Endpoints::Undirected(participants.to_vec()),
        ))
    }

    fn insert_relationship(&mut self, kind: RelationshipKind, endpoints: Endpoints) -> NodeId {
        let id = self.ids.next_id();
        let relationship = Relationship {
            id,
            kind,
            endpoints,
        };
        tracing::debug!(key = %relationship.key(), "created relationship");
        self.nodes.insert(id, Node::Relationship(relationship));
        id
    }

    /// `id` followed by each ancestor up to the root.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>, KamiError> {
        let mut chain = vec![id];
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent() {
            if chain.len() > MAX_DEPTH {
                return Err(KamiError::AncestorCycle(id));
            }
            chain.push(parent);
            current = self.node(parent)?;
        }
        Ok(chain)
    }

    /// Identifiers from the root agent down to `id`, inclusive.
    pub fn path(&self, id: NodeId) -> Result<Vec<NodeId>, KamiError> {
        let mut chain = self.ancestors(id)?;
        chain.reverse();
        Ok(chain)
    }

    /// The agent at the top of `id`'s containment chain.
    pub fn root_of(&self, id: NodeId) -> Result<NodeId, KamiError> {
        let chain = self.ancestors(id)?;
        Ok(chain.last().copied().unwrap_or(id))
    }

    /// `id` and everything it contains, parents before children.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, KamiError> {
        let mut out = Vec::new();
        self.collect_descendants(id, 0, &mut out)?;
        Ok(out)
    }

    fn collect_descendants(
        &self,
        id: NodeId,
        depth: usize,
        out: &mut Vec<NodeId>,
    ) -> Result<(), KamiError> {
        if depth > MAX_DEPTH {
            return Err(KamiError::AncestorCycle(id));
        }
        out.push(id);
        if let Node::Component(c) = self.node(id)? {
            for (_, child) in c.children() {
                self.collect_descendants(child, depth + 1, out)?;
            }
        }
        Ok(())
    }

    /// Flags whose formula names `relationship` as one of its causes.
    pub fn flags_set_by(&self, relationship: NodeId) -> Result<Vec<NodeId>, KamiError> {
        let rel = self.relationship(relationship)?;
        let key = rel.key();
        let Endpoints::Directed { target, .. } = rel.endpoints else {
            return Ok(Vec::new());
        };
        let candidates: Vec<NodeId> = match self.node(target)? {
            Node::Component(c) => c.flags.values().copied().collect(),
            Node::Annotation(a) => vec![a.id],
            Node::Relationship(_) => Vec::new(),
        };
        let mut out = Vec::new();
        for id in candidates {
            if self.annotation(id)?.disjuncts().any(|d| d == key) {
                out.push(id);
            }
        }
        Ok(out)
    }
}
