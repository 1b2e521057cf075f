pub mod echo;

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// Something a line of REPL input can be sent to.
///
/// The echo service and live process sessions both sit behind this, so the
/// REPL loop doesn't care which one is active.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String>;
}

/// A response that is being produced on a worker task.
///
/// Returned immediately by [`echo::EchoExecutor::execute_command`]; await it
/// (or call [`CommandHandle::wait`]) to get the response.
#[derive(Debug)]
pub struct CommandHandle {
    inner: JoinHandle<String>,
}

impl CommandHandle {
    pub(crate) fn new(inner: JoinHandle<String>) -> Self {
        Self { inner }
    }

    /// Whether the response is available yet.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    pub async fn wait(self) -> Result<String> {
        self.await
    }
}

impl Future for CommandHandle {
    type Output = Result<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner)
            .poll(cx)
            .map(|joined| joined.map_err(|e| anyhow::anyhow!("command task failed: {e}")))
    }
}
