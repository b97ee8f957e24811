//! Error types for the conjugraph-ingest crate.

use thiserror::Error;

use crate::document::DocumentError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Sink error: {0}")]
    Sink(#[from] conjugraph_core::SinkError),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
