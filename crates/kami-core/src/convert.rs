//! Fact conversion: fold parsed facts into a [`Model`].

use crate::config::ResidueContainer;
use crate::error::KamiError;
use crate::fact::{ActivityModificationFact, ComplexFact, Fact, PhosphorylationFact};
use crate::ids::NodeId;
use crate::model::{CLAUSE_SEPARATOR, Model, OR_SEPARATOR};
use std::collections::HashMap;

/// Converts facts one at a time, deduplicating agents by name.
///
/// Every conversion validates its fact before touching the model, so a
/// rejected fact leaves no trace.
#[derive(Debug, Default)]
pub struct FactConverter {
    model: Model,
    agents: HashMap<String, NodeId>,
    residue_container: ResidueContainer,
}

impl FactConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor positioned phosphorylations on sites or key residues.
    pub fn with_residue_container(residue_container: ResidueContainer) -> Self {
        Self {
            residue_container,
            ..Self::default()
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Look up an agent by name without creating it.
    pub fn agent(&self, name: &str) -> Option<NodeId> {
        self.agents.get(name).copied()
    }

    pub fn get_or_create_agent(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.agents.get(name) {
            return id;
        }
        let id = self.model.create_agent(name);
        self.agents.insert(name.to_string(), id);
        id
    }

    /// Convert any fact. Returns the nodes it touched.
    pub fn convert(&mut self, fact: &Fact) -> Result<Vec<NodeId>, KamiError> {
        let touched = match fact {
            Fact::Phosphorylation(f) => self.phosphorylation(f),
            Fact::ActivityModification(f) => self.activity_modification(f),
            Fact::Complex(f) => self.complex(f),
        }?;
        tracing::debug!(kind = fact.kind_name(), touched = touched.len(), "converted fact");
        Ok(touched)
    }

    /// Enzyme phosphorylates substrate, at a residue if the position is known.
    ///
    /// The flag the modification sets accumulates an `or` over every
    /// phosphorylation that can set it.
    pub fn phosphorylation(&mut self, fact: &PhosphorylationFact) -> Result<Vec<NodeId>, KamiError> {
        if fact.enzyme.is_empty() {
            return Err(KamiError::MissingField("enzyme"));
        }
        if fact.substrate.is_empty() {
            return Err(KamiError::MissingField("substrate"));
        }

        let enzyme = self.get_or_create_agent(&fact.enzyme);
        let substrate = self.get_or_create_agent(&fact.substrate);
        let flag_name = fact.kind.flag_name();
        let mut touched = vec![enzyme, substrate];

        let target = match fact.known_position() {
            Some(position) => {
                let residue_name = fact.kind.residue_name(position);
                let residue = match self.residue_container {
                    ResidueContainer::KeyResidue => {
                        self.model.get_or_create_key_residue(substrate, &residue_name)?
                    }
                    ResidueContainer::Site => self.model.get_or_create_site(substrate, &residue_name)?,
                };
                touched.push(residue);
                residue
            }
            None => substrate,
        };

        let phos = self.model.add_phosphorylation(enzyme, target)?;
        let flag = self.model.get_or_create_flag(target, flag_name)?;
        let key = self.model.relationship(phos)?.key();
        self.model.accumulate_formula(flag, &key, OR_SEPARATOR)?;

        touched.push(flag);
        touched.push(phos);
        Ok(touched)
    }

    /// Modifications of an agent change its activity attribute.
    ///
    /// Each fact contributes one condition clause to `<activity>_active`.
    pub fn activity_modification(
        &mut self,
        fact: &ActivityModificationFact,
    ) -> Result<Vec<NodeId>, KamiError> {
        fact.validate()?;

        let agent = self.get_or_create_agent(&fact.agent);
        let attribute = self
            .model
            .get_or_create_attribute(agent, &format!("{}_active", fact.activity))?;

        let flag_name = fact
            .modifications
            .iter()
            .map(|m| m.flag_name())
            .collect::<Vec<_>>()
            .join(".");
        let condition = if fact.positions.is_empty() {
            format!("{}.{}", fact.agent, flag_name)
        } else {
            let residue_path = fact
                .modifications
                .iter()
                .zip(&fact.positions)
                .map(|(m, p)| m.residue_name(p))
                .collect::<Vec<_>>()
                .join(".");
            format!("{}.{}.{}", fact.agent, residue_path, flag_name)
        };
        let clause = format!("{}{}", fact.relationship.prefix(), condition);
        self.model
            .accumulate_formula(attribute, &clause, CLAUSE_SEPARATOR)?;

        Ok(vec![agent, attribute])
    }

    /// Members bind pairwise as a `Bind`; three or more form a `Complex`.
    pub fn complex(&mut self, fact: &ComplexFact) -> Result<Vec<NodeId>, KamiError> {
        if fact.members.len() < 2 {
            return Err(KamiError::TooFewParticipants(fact.members.len()));
        }
        if fact.members.iter().any(String::is_empty) {
            return Err(KamiError::MissingField("members"));
        }

        let mut touched: Vec<NodeId> = fact
            .members
            .iter()
            .map(|name| self.get_or_create_agent(name))
            .collect();
        let relationship = match touched.as_slice() {
            [first, second] => self.model.add_bind(*first, *second)?,
            members => self.model.add_complex(members)?,
        };
        touched.push(relationship);
        Ok(touched)
    }
}
