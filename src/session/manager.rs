use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::ReplSession;
use super::config::SessionConfig;
use crate::consts::session_name;
use crate::events::EventBus;

/// Owns every open session, keyed by name (`REPL-1`, `REPL-2`, ...).
pub struct SessionManager {
    events: Arc<EventBus>,
    defaults: SessionConfig,
    counter: AtomicUsize,
    sessions: RwLock<HashMap<String, Arc<ReplSession>>>,
}

impl SessionManager {
    pub fn new(events: Arc<EventBus>, defaults: SessionConfig) -> Self {
        Self {
            events,
            defaults,
            counter: AtomicUsize::new(0),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn defaults(&self) -> &SessionConfig {
        &self.defaults
    }

    /// How many sessions have been opened so far, closed ones included.
    pub fn opened(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    /// Launch a new session and return its name. Numbers are never reused,
    /// even after a session is closed.
    pub async fn open(&self, config: Option<SessionConfig>) -> Result<String> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let name = session_name(n);
        let config = config.unwrap_or_else(|| self.defaults.clone()).named(&name);

        let session = ReplSession::spawn(config, Arc::clone(&self.events))?;
        self.sessions
            .write()
            .await
            .insert(name.clone(), Arc::new(session));
        Ok(name)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<ReplSession>> {
        self.sessions.read().await.get(name).cloned()
    }

    /// Session names in numeric order.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        names.sort_by_key(|name| sequence_number(name));
        names
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Shut a session down and forget it.
    pub async fn close(&self, name: &str) -> Result<()> {
        let session = self.sessions.write().await.remove(name);
        match session {
            Some(session) => {
                session.shutdown().await;
                Ok(())
            }
            None => bail!("no such session: {name}"),
        }
    }

    /// Shut every session down in parallel.
    pub async fn shutdown_all(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        if sessions.is_empty() {
            return;
        }
        tracing::info!(count = sessions.len(), "shutting down sessions");
        futures::future::join_all(sessions.iter().map(|s| s.shutdown())).await;
    }
}

/// `REPL-12` -> 12; anything unparsable sorts last.
fn sequence_number(name: &str) -> usize {
    name.rsplit('-')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{ECHO_LOOP, fake_repl};

    fn manager() -> SessionManager {
        SessionManager::new(Arc::default(), fake_repl("unused", ECHO_LOOP))
    }

    #[test]
    fn sequence_numbers_sort_numerically() {
        assert_eq!(sequence_number("REPL-2"), 2);
        assert_eq!(sequence_number("REPL-10"), 10);
        assert_eq!(sequence_number("weird"), usize::MAX);
    }

    #[tokio::test]
    async fn open_names_sessions_in_order() {
        let mgr = manager();
        assert_eq!(mgr.open(None).await.unwrap(), "REPL-1");
        assert_eq!(mgr.open(None).await.unwrap(), "REPL-2");
        assert_eq!(mgr.names().await, vec!["REPL-1", "REPL-2"]);
        mgr.shutdown_all().await;
        assert!(mgr.is_empty().await);
    }

    #[tokio::test]
    async fn closed_numbers_are_not_reused() {
        let mgr = manager();
        let first = mgr.open(None).await.unwrap();
        mgr.close(&first).await.unwrap();
        assert_eq!(mgr.open(None).await.unwrap(), "REPL-2");
        mgr.shutdown_all().await;
    }

    #[tokio::test]
    async fn close_unknown_is_error() {
        let mgr = manager();
        let err = mgr.close("REPL-9").await.unwrap_err();
        assert!(err.to_string().contains("REPL-9"));
    }

    #[tokio::test]
    async fn open_applies_session_name_to_override() {
        let mgr = manager();
        let name = mgr
            .open(Some(fake_repl("ignored", ECHO_LOOP)))
            .await
            .unwrap();
        let session = mgr.get(&name).await.unwrap();
        assert_eq!(session.name(), "REPL-1");
        mgr.shutdown_all().await;
    }
}
