//! Batch ingestion: decode raw fact records and fold them into a graph.

use crate::config::ResidueContainer;
use crate::convert::FactConverter;
use crate::error::KamiError;
use crate::graph::KamiGraph;
use crate::storage::decode_facts;
use std::collections::BTreeSet;

/// A record that failed to decode or convert, by position in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fact #{index} rejected: {error}")]
pub struct Rejected {
    pub index: usize,
    pub error: KamiError,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Rejected(#[from] Rejected),
    #[error(transparent)]
    Graph(#[from] KamiError),
}

/// A built graph plus the records skipped along the way.
#[derive(Debug)]
pub struct Ingested {
    pub graph: KamiGraph,
    pub facts: usize,
    pub rejected: Vec<Rejected>,
}

/// Decode and convert `records` in order.
///
/// With `skip_invalid` a rejected record is logged and skipped; otherwise the
/// first one halts ingestion. A rejected record never mutates the model.
pub fn ingest(
    name: &str,
    records: Vec<serde_json::Value>,
    residue_container: ResidueContainer,
    skip_invalid: bool,
) -> Result<Ingested, IngestError> {
    let mut converter = FactConverter::with_residue_container(residue_container);
    let mut touched = BTreeSet::new();
    let mut rejected = Vec::new();
    let mut facts = 0;

    for (index, decoded) in decode_facts(records) {
        let result = decoded.and_then(|fact| converter.convert(&fact));
        match result {
            Ok(nodes) => {
                facts += 1;
                touched.extend(nodes);
            }
            Err(error) => {
                let rejection = Rejected { index, error };
                if !skip_invalid {
                    return Err(rejection.into());
                }
                tracing::warn!("{}", rejection);
                rejected.push(rejection);
            }
        }
    }

    let graph = KamiGraph::new(name, converter.into_model(), touched)?;
    Ok(Ingested {
        graph,
        facts,
        rejected,
    })
}
