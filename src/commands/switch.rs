use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};

pub struct SwitchCommand;

#[async_trait]
impl Command for SwitchCommand {
    fn name(&self) -> &str {
        "/switch"
    }

    fn aliases(&self) -> &[&str] {
        &["/s"]
    }

    fn usage(&self) -> &str {
        "<name>"
    }

    fn description(&self) -> &str {
        "send input to another session"
    }

    async fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        if args.is_empty() {
            println!("  usage: /switch <name>");
            return CommandResult::Handled;
        }
        if ctx.manager.get(args).await.is_none() {
            eprintln!("  ✗ no such session: {args}");
            return CommandResult::Handled;
        }
        CommandResult::Switch(Some(args.to_string()))
    }
}
