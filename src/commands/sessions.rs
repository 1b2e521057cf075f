use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};
use crate::session::SessionState;

pub struct SessionsCommand;

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Starting => "starting",
        SessionState::Ready => "ready",
        SessionState::Busy => "busy",
        SessionState::Exited => "exited",
    }
}

#[async_trait]
impl Command for SessionsCommand {
    fn name(&self) -> &str {
        "/sessions"
    }

    fn aliases(&self) -> &[&str] {
        &["/ls"]
    }

    fn description(&self) -> &str {
        "list open sessions (* marks the active one)"
    }

    async fn execute(&self, _args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let names = ctx.manager.names().await;
        if names.is_empty() {
            println!("  (no sessions, /new starts one)");
            return CommandResult::Handled;
        }

        for name in names {
            let Some(session) = ctx.manager.get(&name).await else {
                continue;
            };
            let marker = if ctx.active == Some(name.as_str()) { "*" } else { " " };
            let pid = session
                .pid()
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            println!(
                "  {marker} {name:<8} {:<8} pid {pid:<7} {}",
                state_label(session.state()),
                session.command_line()
            );
        }
        CommandResult::Handled
    }
}
