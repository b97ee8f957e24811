//! conjugraph-core: Statement model, level vocabulary, and sinks for the conjugraph converters.
//!
//! This crate provides the pieces shared by every converter:
//! - Cypher upsert statements (`MERGE` nodes and relationships) with literal
//!   and parameterized rendering
//! - The morphology levels (Root, Voice, Tense, ...) and their relationship types
//! - The `StatementSink` capability with file and in-memory implementations
//! - Common error types

pub mod cypher;
pub mod error;
pub mod sink;
pub mod types;

pub use cypher::{NodePattern, PropertyValue, Statement};
pub use error::SinkError;
pub use sink::{CypherWriter, MemorySink, StatementSink};
pub use types::Level;
