//! Neo4j connection management and shared graph client.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),
}

/// Configuration for connecting to Neo4j.
///
/// Loaded from the `[neo4j]` section of `conjugraph.toml` or
/// `CONJUGRAPH__NEO4J__` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    /// The local, unauthenticated instance.
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: String::new(),
            password: String::new(),
            max_connections: 1,
            fetch_size: 256,
        }
    }
}

impl GraphConfig {
    /// Settings for an authenticated remote instance
    /// (e.g. `neo4j+s://<database-id>.databases.neo4j.io`).
    pub fn remote(uri: &str, user: &str, password: &str) -> Self {
        Self {
            uri: uri.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.user.is_empty()
    }
}

/// Neo4j graph client.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(
            uri = %config.uri,
            authenticated = config.is_authenticated(),
            "Connected to Neo4j"
        );
        Ok(Self { graph })
    }

    /// Connect to an authenticated remote instance.
    pub async fn connect_remote(uri: &str, user: &str, password: &str) -> Result<Self, GraphError> {
        Self::connect(&GraphConfig::remote(uri, user, password)).await
    }

    /// Execute a write-only query (MERGE, SET).
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a read query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }
}
