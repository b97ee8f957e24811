//! Statement sinks: the sink trait with file and in-memory implementations.
//!
//! Converters never know where their statements go. They hand each statement
//! to a `StatementSink` in traversal order; the sink writes it to a `.cypher`
//! file, executes it against a live session, or just keeps it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;

use crate::cypher::Statement;
use crate::error::SinkError;

/// Consumer of generated statements.
///
/// Statements arrive one at a time, in order. Each is independently
/// idempotent, so a sink never needs to group them.
#[async_trait]
pub trait StatementSink: Send {
    /// Consume a single statement.
    async fn execute(&mut self, statement: &Statement) -> Result<(), SinkError>;

    /// Release the sink's resources once the run is over.
    async fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Execute a pre-built statement sequence in order, then finish the sink.
///
/// Returns the number of statements executed.
pub async fn drain(
    sink: &mut (dyn StatementSink + '_),
    statements: &[Statement],
) -> Result<usize, SinkError> {
    for statement in statements {
        sink.execute(statement).await?;
    }
    sink.finish().await?;
    Ok(statements.len())
}

// ── File Sink ────────────────────────────────────────────────────

/// Writes statements as a Cypher script: one statement per line, each
/// terminated by `;`.
pub struct CypherWriter<W: Write + Send> {
    writer: Option<W>,
    written: usize,
}

impl CypherWriter<BufWriter<File>> {
    /// Create (or truncate) a script file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Opened Cypher script");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> CypherWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            written: 0,
        }
    }

    /// Number of statements written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        let mut writer = self.writer.take().ok_or(SinkError::Finished)?;
        writer.flush()?;
        Ok(writer)
    }
}

#[async_trait]
impl<W: Write + Send> StatementSink for CypherWriter<W> {
    async fn execute(&mut self, statement: &Statement) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Finished)?;
        writeln!(writer, "{statement};")?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            tracing::debug!(statements = self.written, "Cypher script flushed");
        }
        Ok(())
    }
}

// ── In-Memory Sink ───────────────────────────────────────────────

/// Keeps every statement it receives, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    statements: Vec<Statement>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }

    /// Count node statements carrying the given label.
    pub fn count_nodes(&self, label: &str) -> usize {
        self.statements
            .iter()
            .filter(|s| s.node_label() == Some(label))
            .count()
    }

    /// Count relationship statements of the given type.
    pub fn count_relationships(&self, rel_type: &str) -> usize {
        self.statements
            .iter()
            .filter(|s| s.rel_type() == Some(rel_type))
            .count()
    }
}

#[async_trait]
impl StatementSink for MemorySink {
    async fn execute(&mut self, statement: &Statement) -> Result<(), SinkError> {
        self.statements.push(statement.clone());
        Ok(())
    }
}
