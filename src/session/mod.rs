//! A REPL child process driven over pipes.
//!
//! stdout and stderr share one OS pipe so prompts (usually on stderr) stay
//! ordered with output (usually on stdout). A monitor thread reads that pipe,
//! publishes [`Event`]s, and moves the session between [`SessionState`]s.
//! [`ReplSession::send`] only writes while the session is `Ready`, then waits
//! for the next prompt and returns everything printed before it.

pub mod config;
pub mod lines;
pub mod manager;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::watch;

use crate::events::{Event, EventBus};
use crate::executor::Executor;
use config::SessionConfig;
use lines::LineBuffer;

const READ_CHUNK: usize = 4096;

/// Lines kept for a response that hasn't reached its prompt yet; older ones
/// are dropped.
pub const MAX_PENDING_LINES: usize = 10_000;

/// Poisoning is ignored; the guarded values are plain buffers.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Launched, no prompt seen yet.
    Starting,
    /// At a prompt, accepting input.
    Ready,
    /// A command was sent and its prompt hasn't come back.
    Busy,
    /// The process closed its output.
    Exited,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} not ready for input, please wait")]
    NotReady(String),
    #[error("{0} process is not running")]
    NotRunning(String),
    #[error("{0} did not return to a prompt within {1:?}")]
    Timeout(String, Duration),
    #[error("failed to start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// State shared between the session handle and its monitor thread.
struct Shared {
    config: SessionConfig,
    events: Arc<EventBus>,
    state: watch::Sender<SessionState>,
    prompt_seen: AtomicBool,
    closing: AtomicBool,
    /// Set once `pending` has dropped lines for the current response.
    overflowed: AtomicBool,
    /// Lines printed since the last prompt, at most [`MAX_PENDING_LINES`].
    pending: Mutex<VecDeque<String>>,
    /// Output collected between the last two prompts.
    last_response: Mutex<Option<String>>,
}

impl Shared {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn on_line(&self, line: String) {
        let is_prompt = self.config.is_prompt_line(&line);
        self.events.emit(Event::Output {
            session: self.name().to_string(),
            line: line.clone(),
        });
        if is_prompt {
            self.on_prompt();
            return;
        }
        let mut pending = lock(&self.pending);
        if pending.len() == MAX_PENDING_LINES {
            pending.pop_front();
            if !self.overflowed.swap(true, Ordering::SeqCst) {
                tracing::warn!(
                    session = %self.name(),
                    limit = MAX_PENDING_LINES,
                    "response too long, dropping its oldest lines"
                );
            }
        }
        pending.push_back(line);
    }

    fn on_prompt(&self) {
        let response = lock(&self.pending).drain(..).collect::<Vec<_>>();
        *lock(&self.last_response) = Some(response.join("\n"));
        self.overflowed.store(false, Ordering::SeqCst);

        if !self.prompt_seen.swap(true, Ordering::SeqCst) {
            tracing::info!(session = %self.name(), "ready for input");
            self.events.emit(Event::Ready {
                session: self.name().to_string(),
            });
        }

        if self.closing.load(Ordering::SeqCst) {
            return;
        }
        self.state.send_if_modified(|state| match state {
            SessionState::Exited | SessionState::Ready => false,
            _ => {
                *state = SessionState::Ready;
                true
            }
        });
    }

    fn on_exit(&self) {
        tracing::info!(session = %self.name(), "output closed");
        // Publish before the state flips so waiters never beat the event.
        self.events.emit(Event::Exited {
            session: self.name().to_string(),
        });
        self.state.send_replace(SessionState::Exited);
    }

    /// Back to `Ready` if a send still holds the session.
    fn release(&self) {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Busy {
                *state = SessionState::Ready;
                true
            } else {
                false
            }
        });
    }
}

/// Holds a claimed session until the send settles. Dropped unsettled, it
/// hands the prompt back, even when the caller abandons the send future.
struct Claim<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Claim<'_> {
    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.release();
        }
    }
}

/// Reads the merged output pipe until EOF.
///
/// A trailing partial line is checked for a prompt after every read, since
/// interpreters print their prompt without a newline. A line that begins like
/// the prompt and happens to be split across two reads right after the prompt
/// text is therefore taken for a prompt too.
fn monitor(shared: Arc<Shared>, mut reader: io::PipeReader) {
    let mut lines = LineBuffer::default();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                for line in lines.push(&chunk[..n]) {
                    shared.on_line(line);
                }
                let at_prompt = shared.config.is_prompt_partial(&lines.partial());
                if at_prompt {
                    lines.clear_partial();
                    shared.on_prompt();
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(session = %shared.name(), error = %e, "output read failed");
                break;
            }
        }
    }
    if let Some(rest) = lines.finish() {
        shared.on_line(rest);
    }
    shared.on_exit();
}

/// A running REPL process.
pub struct ReplSession {
    shared: Arc<Shared>,
    stdin: tokio::sync::Mutex<Option<ChildStdin>>,
    child: tokio::sync::Mutex<Child>,
    pid: Option<u32>,
}

impl ReplSession {
    /// Launch the process described by `config` and start watching its output.
    pub fn spawn(config: SessionConfig, events: Arc<EventBus>) -> Result<Self, SessionError> {
        let (reader, writer) = io::pipe()?;
        let err_writer = writer.try_clone()?;

        // The command owns our copies of the write end; it must be dropped
        // after spawning or the monitor never sees EOF.
        let mut child = {
            let mut cmd = Command::new(&config.program);
            cmd.args(&config.args)
                .stdin(Stdio::piped())
                .stdout(writer)
                .stderr(err_writer)
                .kill_on_drop(true);
            if let Some(dir) = &config.working_dir {
                cmd.current_dir(dir);
            }
            cmd.spawn().map_err(|source| SessionError::Spawn {
                name: config.name.clone(),
                source,
            })?
        };

        let stdin = child.stdin.take();
        let pid = child.id();
        let command_line = config.command_line();
        tracing::info!(session = %config.name, %command_line, ?pid, "spawned");

        let (state, _) = watch::channel(SessionState::Starting);
        let shared = Arc::new(Shared {
            config,
            events,
            state,
            prompt_seen: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            overflowed: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
            last_response: Mutex::new(None),
        });

        shared.events.emit(Event::Started {
            session: shared.name().to_string(),
            command_line,
        });

        let monitor_shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name(format!("{}-output", shared.name()))
            .spawn(move || monitor(monitor_shared, reader))?;

        Ok(Self {
            shared,
            stdin: tokio::sync::Mutex::new(stdin),
            child: tokio::sync::Mutex::new(child),
            pid,
        })
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn command_line(&self) -> String {
        self.shared.config.command_line()
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    pub fn is_running(&self) -> bool {
        self.state() != SessionState::Exited
    }

    /// Wait until the session reaches a prompt or exits.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), SessionError> {
        match self.wait_settled(timeout).await {
            Some(SessionState::Exited) => Err(SessionError::NotRunning(self.name().to_string())),
            Some(_) => Ok(()),
            None => Err(SessionError::Timeout(self.name().to_string(), timeout)),
        }
    }

    /// Send one line and return the output printed before the next prompt.
    pub async fn send(&self, command: &str) -> Result<String, SessionError> {
        let claimed = self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Ready {
                *state = SessionState::Busy;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(match self.state() {
                SessionState::Exited => SessionError::NotRunning(self.name().to_string()),
                _ => SessionError::NotReady(self.name().to_string()),
            });
        }

        let claim = Claim {
            shared: &self.shared,
            armed: true,
        };

        lock(&self.shared.pending).clear();
        lock(&self.shared.last_response).take();

        tracing::debug!(session = %self.name(), %command, "sending");
        self.write_line(command).await?;

        let timeout = self.shared.config.response_timeout;
        let settled = self.wait_settled(timeout).await;
        match settled {
            Some(SessionState::Exited) => {
                claim.settle();
                Err(SessionError::NotRunning(self.name().to_string()))
            }
            Some(_) => {
                claim.settle();
                let response = lock(&self.shared.last_response).take();
                Ok(response.unwrap_or_default())
            }
            None => {
                tracing::warn!(session = %self.name(), ?timeout, "command timed out");
                Err(SessionError::Timeout(self.name().to_string(), timeout))
            }
        }
    }

    /// Stop the process: close stdin, give it the grace period, then kill it.
    pub async fn shutdown(&self) {
        self.shared.closing.store(true, Ordering::SeqCst);
        self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Ready {
                *state = SessionState::Busy;
                true
            } else {
                false
            }
        });

        drop(self.stdin.lock().await.take());

        let grace = self.shared.config.shutdown_grace;
        let mut child = self.child.lock().await;
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => tracing::info!(session = %self.name(), %status, "exited"),
            Ok(Err(e)) => tracing::warn!(session = %self.name(), error = %e, "wait failed"),
            Err(_) => {
                tracing::warn!(session = %self.name(), ?grace, "did not exit in time, killing");
                if let Err(e) = child.kill().await {
                    tracing::warn!(session = %self.name(), error = %e, "kill failed");
                }
            }
        }
    }

    async fn write_line(&self, command: &str) -> Result<(), SessionError> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| SessionError::NotRunning(self.name().to_string()))?;
        stdin.write_all(format!("{command}\n").as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Resolves to `Ready` or `Exited`, or `None` on timeout.
    async fn wait_settled(&self, timeout: Duration) -> Option<SessionState> {
        let mut rx = self.shared.state.subscribe();
        let settled = async move {
            rx.wait_for(|s| matches!(s, SessionState::Ready | SessionState::Exited))
                .await
                .map(|state| *state)
                .unwrap_or(SessionState::Exited)
        };
        tokio::time::timeout(timeout, settled).await.ok()
    }
}

#[async_trait]
impl Executor for ReplSession {
    async fn execute(&self, command: &str) -> Result<String> {
        Ok(self.send(command).await?)
    }
}
