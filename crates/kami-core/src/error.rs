//! Error type shared by the model, the fact converter, and the exporters.

use crate::ids::NodeId;

/// Errors raised while building or walking a KAMI model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KamiError {
    #[error("unknown modification kind: {0}")]
    UnknownModification(String),
    #[error("unknown relationship qualifier: {0}")]
    UnknownQualifier(String),
    #[error("fact is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("{modifications} modification(s) but {positions} position(s)")]
    MismatchedModifications { modifications: usize, positions: usize },
    #[error("a complex needs at least two members, got {0}")]
    TooFewParticipants(usize),
    #[error("invalid fact record: {0}")]
    InvalidFact(String),
    #[error("no node with id {0}")]
    UnknownNode(NodeId),
    #[error("node {id} is not a {expected}")]
    WrongNodeKind { id: NodeId, expected: &'static str },
    #[error("a {parent} cannot contain a {child}")]
    InvalidContainment {
        parent: &'static str,
        child: &'static str,
    },
    #[error("agent name `{name}` is bound to both {first} and {second}")]
    DuplicateAgent {
        name: String,
        first: NodeId,
        second: NodeId,
    },
    #[error("relationship {relationship} references {endpoint}, which is not in the graph")]
    DanglingEndpoint {
        relationship: String,
        endpoint: NodeId,
    },
    #[error("ancestor walk from {0} did not terminate")]
    AncestorCycle(NodeId),
}
