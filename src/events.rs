//! Session event bus.
//!
//! Output monitors emit events via [`EventBus::emit`]; the terminal front-end
//! (and tests) subscribe via [`EventBus::subscribe`]. Built on
//! [`tokio::sync::broadcast`] so several listeners can follow every session.

use tokio::sync::broadcast;

/// Things that happen to a REPL session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The child process was launched.
    Started { session: String, command_line: String },
    /// A complete line of output (stdout and stderr are merged).
    Output { session: String, line: String },
    /// The first prompt was seen; the session accepts input from now on.
    Ready { session: String },
    /// The child closed its output.
    Exited { session: String },
}

impl Event {
    /// Name of the session this event belongs to.
    pub fn session(&self) -> &str {
        match self {
            Event::Started { session, .. }
            | Event::Output { session, .. }
            | Event::Ready { session }
            | Event::Exited { session } => session,
        }
    }
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to future events. Past ones are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(name: &str) -> Event {
        Event::Ready {
            session: name.to_string(),
        }
    }

    #[tokio::test]
    async fn emit_reaches_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(Event::Output {
            session: "REPL-1".to_string(),
            line: "hello".to_string(),
        });

        match rx.recv().await.unwrap() {
            Event::Output { session, line } => {
                assert_eq!(session, "REPL-1");
                assert_eq!(line, "hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(ready("REPL-2"));

        assert_eq!(rx1.recv().await.unwrap(), ready("REPL-2"));
        assert_eq!(rx2.recv().await.unwrap(), ready("REPL-2"));
    }

    #[test]
    fn emit_without_subscribers_returns_zero() {
        let bus = EventBus::default();
        assert_eq!(bus.emit(ready("REPL-1")), 0);
    }

    #[test]
    fn session_accessor_covers_all_variants() {
        let events = [
            Event::Started {
                session: "a".into(),
                command_line: "sh".into(),
            },
            Event::Output {
                session: "a".into(),
                line: "x".into(),
            },
            ready("a"),
            Event::Exited {
                session: "a".into(),
            },
        ];
        for e in &events {
            assert_eq!(e.session(), "a");
        }
    }
}
