//! Parsed fact records: the input the converter consumes.
//!
//! Statement parsing happens upstream. A record arrives here already typed,
//! with closed enumerations for the modification kind and the relationship
//! qualifier. Unrecognized values fail to decode, so a rejected record never
//! reaches the model.

use crate::error::KamiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of post-translational modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModKind {
    Phosphorylation,
    PhosphorylationTyrosine,
    PhosphorylationSerine,
    PhosphorylationThreonine,
}

impl ModKind {
    /// Flag name the modification sets.
    pub fn flag_name(self) -> &'static str {
        match self {
            ModKind::Phosphorylation => "phos",
            ModKind::PhosphorylationTyrosine => "Yphos",
            ModKind::PhosphorylationSerine => "Sphos",
            ModKind::PhosphorylationThreonine => "Tphos",
        }
    }

    /// One-letter residue code, empty for an unqualified phosphorylation.
    pub fn residue_code(self) -> &'static str {
        match self {
            ModKind::Phosphorylation => "",
            ModKind::PhosphorylationTyrosine => "Y",
            ModKind::PhosphorylationSerine => "S",
            ModKind::PhosphorylationThreonine => "T",
        }
    }

    /// Residue name at `position`, e.g. `Y204`.
    pub fn residue_name(self, position: &str) -> String {
        format!("{}{}", self.residue_code(), position)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModKind::Phosphorylation => "Phosphorylation",
            ModKind::PhosphorylationTyrosine => "PhosphorylationTyrosine",
            ModKind::PhosphorylationSerine => "PhosphorylationSerine",
            ModKind::PhosphorylationThreonine => "PhosphorylationThreonine",
        }
    }
}

impl FromStr for ModKind {
    type Err = KamiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Phosphorylation" => Ok(ModKind::Phosphorylation),
            "PhosphorylationTyrosine" => Ok(ModKind::PhosphorylationTyrosine),
            "PhosphorylationSerine" => Ok(ModKind::PhosphorylationSerine),
            "PhosphorylationThreonine" => Ok(ModKind::PhosphorylationThreonine),
            other => Err(KamiError::UnknownModification(other.to_string())),
        }
    }
}

impl TryFrom<String> for ModKind {
    type Error = KamiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModKind> for String {
    fn from(kind: ModKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ModKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a modification affects an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Qualifier {
    Increases,
    Decreases,
    DirectlyIncreases,
    DirectlyDecreases,
}

impl Qualifier {
    /// Prefix applied to an activity condition. Only `directlyDecreases`
    /// negates; plain `decreases` is left unprefixed.
    pub fn prefix(self) -> &'static str {
        match self {
            Qualifier::DirectlyDecreases => "not ",
            Qualifier::Increases | Qualifier::Decreases | Qualifier::DirectlyIncreases => "",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Qualifier::Increases => "increases",
            Qualifier::Decreases => "decreases",
            Qualifier::DirectlyIncreases => "directlyIncreases",
            Qualifier::DirectlyDecreases => "directlyDecreases",
        }
    }
}

impl FromStr for Qualifier {
    type Err = KamiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increases" => Ok(Qualifier::Increases),
            "decreases" => Ok(Qualifier::Decreases),
            "directlyIncreases" => Ok(Qualifier::DirectlyIncreases),
            "directlyDecreases" => Ok(Qualifier::DirectlyDecreases),
            other => Err(KamiError::UnknownQualifier(other.to_string())),
        }
    }
}

impl TryFrom<String> for Qualifier {
    type Error = KamiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Qualifier> for String {
    fn from(q: Qualifier) -> Self {
        q.as_str().to_string()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `enzyme` phosphorylates `substrate`, optionally at a known residue position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhosphorylationFact {
    pub enzyme: String,
    pub substrate: String,
    #[serde(rename = "modification")]
    pub kind: ModKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl PhosphorylationFact {
    pub fn new(enzyme: &str, substrate: &str, kind: ModKind, position: Option<&str>) -> Self {
        Self {
            enzyme: enzyme.to_string(),
            substrate: substrate.to_string(),
            kind,
            position: position.map(str::to_string),
        }
    }

    /// The position, treating an empty string as unknown.
    pub fn known_position(&self) -> Option<&str> {
        self.position.as_deref().filter(|p| !p.is_empty())
    }
}

/// Modifications of `agent` change its `activity`.
///
/// `positions`, when non-empty, pairs up with `modifications` index by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityModificationFact {
    pub agent: String,
    pub activity: String,
    pub modifications: Vec<ModKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<String>,
    pub relationship: Qualifier,
}

impl ActivityModificationFact {
    /// Reject records whose modification and position lists cannot be paired.
    pub fn validate(&self) -> Result<(), KamiError> {
        if self.agent.is_empty() {
            return Err(KamiError::MissingField("agent"));
        }
        if self.activity.is_empty() {
            return Err(KamiError::MissingField("activity"));
        }
        if !self.positions.is_empty() && self.positions.len() != self.modifications.len() {
            return Err(KamiError::MismatchedModifications {
                modifications: self.modifications.len(),
                positions: self.positions.len(),
            });
        }
        Ok(())
    }
}

/// The listed agents form a complex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexFact {
    pub members: Vec<String>,
}

/// One parsed fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fact {
    Phosphorylation(PhosphorylationFact),
    ActivityModification(ActivityModificationFact),
    Complex(ComplexFact),
}

impl Fact {
    /// Decode one raw JSON record.
    pub fn from_record(record: serde_json::Value) -> Result<Self, KamiError> {
        serde_json::from_value(record).map_err(|e| KamiError::InvalidFact(e.to_string()))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Fact::Phosphorylation(_) => "phosphorylation",
            Fact::ActivityModification(_) => "activity_modification",
            Fact::Complex(_) => "complex",
        }
    }
}
