//! Writes session events to the terminal from a background task.
//!
//! Output lines arrive on the [`EventBus`](crate::events::EventBus) while the
//! terminal loop is waiting on a command, so printing happens on its own task.
//! [`EventPrinter::flush`] lets the loop wait for everything already emitted
//! before it draws the next prompt.

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::events::Event;

/// Terminal lines for one event.
pub fn render(event: &Event) -> Vec<String> {
    match event {
        Event::Started {
            session,
            command_line,
        } => vec![
            format!("Starting {session}: {command_line}"),
            format!("Waiting for {session} to initialize..."),
        ],
        Event::Output { session, line } => vec![format!("{session} │ {line}")],
        Event::Ready { session } => vec![format!("{session} ready for input!")],
        Event::Exited { session } => vec![format!("{session} process exited.")],
    }
}

pub struct EventPrinter {
    flush: mpsc::UnboundedSender<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl EventPrinter {
    /// Start printing events from `rx`, handing each rendered line to `write`.
    pub fn spawn<W>(mut rx: broadcast::Receiver<Event>, mut write: W) -> Self
    where
        W: FnMut(String) + Send + 'static,
    {
        let (flush, mut flush_rx) = mpsc::unbounded_channel::<oneshot::Sender<()>>();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Ok(event) => render(&event).into_iter().for_each(&mut write),
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "event printer fell behind");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    Some(ack) = flush_rx.recv() => {
                        loop {
                            match rx.try_recv() {
                                Ok(event) => render(&event).into_iter().for_each(&mut write),
                                Err(TryRecvError::Lagged(n)) => {
                                    tracing::warn!(skipped = n, "event printer fell behind");
                                }
                                Err(_) => break,
                            }
                        }
                        let _ = ack.send(());
                    }
                }
            }
        });
        Self { flush, task }
    }

    /// Wait until every event emitted before this call has been written.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.flush.send(ack).is_ok() {
            let _ = done.await;
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}
