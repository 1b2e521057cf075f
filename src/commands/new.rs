use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};

pub struct NewCommand;

#[async_trait]
impl Command for NewCommand {
    fn name(&self) -> &str {
        "/new"
    }

    fn description(&self) -> &str {
        "start a new REPL session and switch to it"
    }

    async fn execute(&self, _args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        match ctx.manager.open(None).await {
            Ok(name) => {
                println!("  ✓ opened {name}");
                CommandResult::Switch(Some(name))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}
