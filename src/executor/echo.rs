use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use super::{CommandHandle, Executor};
use crate::consts::{ECHO_DELAY, ECHO_PREFIX};

/// Placeholder backend: waits a moment, then echoes the command back.
#[derive(Debug, Clone)]
pub struct EchoExecutor {
    delay: Duration,
}

impl Default for EchoExecutor {
    fn default() -> Self {
        Self::new(ECHO_DELAY)
    }
}

impl EchoExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start echoing `command` on a worker task and return right away.
    pub fn execute_command(&self, command: impl Into<String>) -> CommandHandle {
        let command = command.into();
        let delay = self.delay;
        tracing::debug!(%command, ?delay, "echo dispatched");
        CommandHandle::new(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            format!("{ECHO_PREFIX}{command}")
        }))
    }
}

#[async_trait]
impl Executor for EchoExecutor {
    async fn execute(&self, command: &str) -> Result<String> {
        self.execute_command(command).await
    }
}
