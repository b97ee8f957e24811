//! Live execution of generated statements against Neo4j.

use async_trait::async_trait;
use neo4rs::{query, Query};

use conjugraph_core::{PropertyValue, SinkError, Statement, StatementSink};

use crate::client::GraphClient;

/// Executes each statement as its own parameterized query, sequentially.
///
/// There is no transaction spanning statements: every statement is an
/// independent upsert and commits on its own.
pub struct GraphSink {
    client: GraphClient,
    executed: usize,
}

impl GraphSink {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client,
            executed: 0,
        }
    }

    /// Number of statements executed so far.
    pub fn executed(&self) -> usize {
        self.executed
    }
}

#[async_trait]
impl StatementSink for GraphSink {
    async fn execute(&mut self, statement: &Statement) -> Result<(), SinkError> {
        let q = to_query(statement);
        self.client.run(q).await.map_err(|e| SinkError::Backend {
            backend: "neo4j",
            message: e.to_string(),
        })?;
        self.executed += 1;
        tracing::debug!(executed = self.executed, %statement, "Statement executed");
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        tracing::info!(executed = self.executed, "Live session finished");
        Ok(())
    }
}

/// Build a neo4rs query from a statement, binding every value as a parameter.
pub fn to_query(statement: &Statement) -> Query {
    let (text, params) = statement.parameterized();
    params
        .into_iter()
        .fold(query(&text), |q, (name, value)| match value {
            PropertyValue::String(s) => q.param(&name, s),
            PropertyValue::List(items) => q.param(&name, items),
        })
}
