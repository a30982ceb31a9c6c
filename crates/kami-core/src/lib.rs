//! Core model for KAMI graphs.
//!
//! Provides the agent/site/key-residue containment model ([`model::Model`]),
//! flag and attribute formulas, relationships, the fact converter that folds
//! parsed biochemical facts into a model, and the graph container
//! ([`graph::KamiGraph`]) the exporters walk.

pub mod config;
pub mod convert;
pub mod error;
pub mod fact;
pub mod graph;
pub mod ids;
pub mod ingest;
pub mod model;
pub mod storage;

pub use error::KamiError;
pub use ids::NodeId;
