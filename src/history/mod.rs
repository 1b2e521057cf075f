pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How a command ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Error(String),
}

/// One command sent to a session, and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Session name, or `echo` for the echo executor.
    pub session: String,
    pub command: String,
    pub response: String,
    pub outcome: Outcome,
}

impl HistoryEntry {
    pub fn success(session: &str, command: &str, response: &str) -> Self {
        Self {
            session: session.to_string(),
            command: command.to_string(),
            response: response.to_string(),
            outcome: Outcome::Success,
        }
    }

    pub fn failure(session: &str, command: &str, error: &str) -> Self {
        Self {
            session: session.to_string(),
            command: command.to_string(),
            response: String::new(),
            outcome: Outcome::Error(error.to_string()),
        }
    }
}

/// Where sent commands are remembered.
#[async_trait]
pub trait History: Send + Sync {
    async fn record(&self, entry: HistoryEntry) -> Result<()>;
    /// The last `limit` entries, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>>;
    async fn search(&self, query: &str) -> Result<Vec<HistoryEntry>>;
    async fn clear(&self) -> Result<()>;
}
