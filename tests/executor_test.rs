use std::time::{Duration, Instant};

use replhost::executor::Executor;
use replhost::executor::echo::EchoExecutor;

#[tokio::test]
async fn concurrent_commands_keep_their_own_responses() {
    let exec = EchoExecutor::default();
    let first = exec.execute_command("first");
    let second = exec.execute_command("second");

    let (a, b) = tokio::join!(second, first);
    assert_eq!(a.unwrap(), "Echo : second");
    assert_eq!(b.unwrap(), "Echo : first");
}

#[tokio::test]
async fn many_handles_resolve_independently() {
    let exec = EchoExecutor::new(Duration::from_millis(20));
    let commands: Vec<String> = (0..32).map(|i| format!("cmd-{i}")).collect();
    let handles: Vec<_> = commands.iter().map(|c| exec.execute_command(c.clone())).collect();

    let responses = futures::future::join_all(handles).await;
    for (cmd, response) in commands.iter().zip(responses) {
        assert_eq!(response.unwrap(), format!("Echo : {cmd}"));
    }
}

#[tokio::test]
async fn caller_keeps_running_while_echo_waits() {
    let exec = EchoExecutor::new(Duration::from_millis(200));
    let start = Instant::now();
    let handle = exec.execute_command("slow");
    assert!(start.elapsed() < Duration::from_millis(200));
    assert!(!handle.is_finished());

    let response = handle.await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert_eq!(response, "Echo : slow");
}

#[tokio::test]
async fn works_through_trait_object() {
    let exec: Box<dyn Executor> = Box::new(EchoExecutor::default());
    assert_eq!(exec.execute("").await.unwrap(), "Echo : ");
    assert_eq!(exec.execute("ls").await.unwrap(), "Echo : ls");
}
