use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};

pub struct CloseCommand;

#[async_trait]
impl Command for CloseCommand {
    fn name(&self) -> &str {
        "/close"
    }

    fn usage(&self) -> &str {
        "[name]"
    }

    fn description(&self) -> &str {
        "shut down a session (default: the active one)"
    }

    async fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let target = if args.is_empty() { ctx.active } else { Some(args) };
        let Some(target) = target else {
            println!("  no active session to close");
            return CommandResult::Handled;
        };

        if let Err(e) = ctx.manager.close(target).await {
            eprintln!("  ✗ {e}");
            return CommandResult::Handled;
        }
        println!("  ✓ closed {target}");

        if ctx.active != Some(target) {
            return CommandResult::Handled;
        }
        // The active session is gone; fall back to the first one left.
        CommandResult::Switch(ctx.manager.names().await.into_iter().next())
    }
}
