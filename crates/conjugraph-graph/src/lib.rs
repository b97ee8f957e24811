//! conjugraph-graph: Neo4j client and live statement execution.
//!
//! Statements generated by the converters reach a live database only through
//! this crate. Each statement runs as its own parameterized query, in order,
//! against one shared client.

pub mod client;
pub mod sink;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use sink::GraphSink;
