use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use replhost::events::{Event, EventBus};
use replhost::session::config::SessionConfig;
use replhost::session::manager::SessionManager;
use replhost::session::{ReplSession, SessionError, SessionState};

const ECHO_LOOP: &str =
    r#"printf '> '; while IFS= read -r line; do echo "out:$line"; printf '> '; done"#;

/// A `sh` script posing as a REPL with a `> ` prompt.
fn fake_repl(script: &str) -> SessionConfig {
    SessionConfig {
        name: "test".to_string(),
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        prompt: Regex::new(r"^> ").unwrap(),
        response_timeout: Duration::from_secs(5),
        shutdown_grace: Duration::from_millis(300),
        working_dir: None,
    }
}

async fn ready_session(config: SessionConfig) -> ReplSession {
    let session = ReplSession::spawn(config, Arc::default()).unwrap();
    session.wait_ready(Duration::from_secs(5)).await.unwrap();
    session
}

#[tokio::test]
async fn collects_multiline_response() {
    let session = ready_session(fake_repl(
        r#"printf '> '; while IFS= read -r l; do echo "1:$l"; echo "2:$l"; printf '> '; done"#,
    ))
    .await;

    assert_eq!(session.send("x").await.unwrap(), "1:x\n2:x");
    session.shutdown().await;
}

#[tokio::test]
async fn empty_response_when_nothing_printed() {
    let session = ready_session(fake_repl(
        r#"printf '> '; while IFS= read -r l; do printf '> '; done"#,
    ))
    .await;

    assert_eq!(session.send("pass").await.unwrap(), "");
    session.shutdown().await;
}

#[tokio::test]
async fn timeout_hands_prompt_back() {
    let mut config = fake_repl(r#"printf '> '; while IFS= read -r l; do echo "got $l"; done"#);
    config.response_timeout = Duration::from_millis(300);
    let session = ready_session(config).await;

    assert!(matches!(
        session.send("hang").await,
        Err(SessionError::Timeout(_, _))
    ));
    assert!(session.is_ready());
    session.shutdown().await;
}

#[tokio::test]
async fn abandoned_send_hands_prompt_back() {
    let mut config = fake_repl(r#"printf '> '; while IFS= read -r l; do echo "got $l"; done"#);
    config.response_timeout = Duration::from_millis(300);
    let session = ready_session(config).await;

    // Give up on the wait the way Ctrl+C does in the terminal loop.
    let abandoned = tokio::time::timeout(Duration::from_millis(50), session.send("hang")).await;
    assert!(abandoned.is_err());

    assert_eq!(session.state(), SessionState::Ready);
    assert!(matches!(
        session.send("next").await,
        Err(SessionError::Timeout(_, _))
    ));
    session.shutdown().await;
}

#[tokio::test]
async fn busy_session_rejects_second_command() {
    let session = ready_session(fake_repl(
        r#"printf '> '; while IFS= read -r l; do sleep 1; echo "out:$l"; printf '> '; done"#,
    ))
    .await;

    let (first, second) = tokio::join!(session.send("a"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.send("b").await
    });
    assert_eq!(first.unwrap(), "out:a");
    assert!(matches!(second, Err(SessionError::NotReady(_))));
    session.shutdown().await;
}

#[tokio::test]
async fn exit_during_command_reports_not_running() {
    let session = ready_session(fake_repl(r#"printf '> '; IFS= read -r l; echo "bye $l""#)).await;

    assert!(matches!(
        session.send("now").await,
        Err(SessionError::NotRunning(_))
    ));
    assert_eq!(session.state(), SessionState::Exited);
    assert!(!session.is_running());
    assert!(matches!(
        session.send("again").await,
        Err(SessionError::NotRunning(_))
    ));
    session.shutdown().await;
}

#[tokio::test]
async fn shutdown_kills_process_that_ignores_stdin() {
    let session = ready_session(fake_repl("printf '> '; exec sleep 30")).await;

    session.shutdown().await;
    assert!(matches!(
        session.wait_ready(Duration::from_secs(5)).await,
        Err(SessionError::NotRunning(_))
    ));
    // Idempotent
    session.shutdown().await;
}

#[tokio::test]
async fn events_follow_session_lifecycle() {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let session = ReplSession::spawn(fake_repl(ECHO_LOOP), Arc::clone(&bus)).unwrap();
    session.wait_ready(Duration::from_secs(5)).await.unwrap();
    session.send("ping").await.unwrap();
    session.shutdown().await;
    session.wait_ready(Duration::from_secs(5)).await.ok();

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }

    assert!(matches!(&seen[0], Event::Started { command_line, .. } if command_line.starts_with("sh -c")));
    assert_eq!(
        seen[1],
        Event::Ready {
            session: "test".to_string()
        }
    );
    assert!(seen.contains(&Event::Output {
        session: "test".to_string(),
        line: "out:ping".to_string()
    }));
    assert_eq!(
        seen.last(),
        Some(&Event::Exited {
            session: "test".to_string()
        })
    );
}

#[tokio::test]
async fn sessions_do_not_cross_talk() {
    let manager = SessionManager::new(Arc::default(), fake_repl(ECHO_LOOP));
    let a = manager.open(None).await.unwrap();
    let b = manager.open(None).await.unwrap();
    let sa = manager.get(&a).await.unwrap();
    let sb = manager.get(&b).await.unwrap();
    sa.wait_ready(Duration::from_secs(5)).await.unwrap();
    sb.wait_ready(Duration::from_secs(5)).await.unwrap();

    let (ra, rb) = tokio::join!(sa.send("alpha"), sb.send("beta"));
    assert_eq!(ra.unwrap(), "out:alpha");
    assert_eq!(rb.unwrap(), "out:beta");

    manager.shutdown_all().await;
    assert!(manager.is_empty().await);
    assert_eq!(manager.opened(), 2);
}

#[tokio::test]
async fn working_dir_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fake_repl(r#"printf '> '; while IFS= read -r l; do pwd; printf '> '; done"#);
    config.working_dir = Some(dir.path().to_path_buf());
    let session = ready_session(config).await;

    let cwd = session.send("where").await.unwrap();
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(
        std::path::Path::new(&cwd).canonicalize().unwrap(),
        expected
    );
    session.shutdown().await;
}
