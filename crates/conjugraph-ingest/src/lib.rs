//! conjugraph-ingest: JSON-to-Cypher converters.
//!
//! Two walkers turn nested JSON into idempotent MERGE statements and hand
//! them to a statement sink (Cypher script, live Neo4j, or memory):
//! - `conjugation`: the schema-aware Arabic verb hierarchy
//!   (root → voice → tense → person → gender → number → form)
//! - `tree`: any labeled tree with `label`/`value`/`lineage`/`children`

pub mod config;
pub mod conjugation;
pub mod document;
pub mod error;
pub mod tree;
