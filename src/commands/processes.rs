use async_trait::async_trait;
use std::collections::HashMap;

use super::{Command, CommandContext, CommandResult};
use crate::inspect::processes::list_processes;

pub struct ProcessesCommand;

#[async_trait]
impl Command for ProcessesCommand {
    fn name(&self) -> &str {
        "/processes"
    }

    fn aliases(&self) -> &[&str] {
        &["/ps"]
    }

    fn usage(&self) -> &str {
        "[filter]"
    }

    fn description(&self) -> &str {
        "list processes, flagging the ones behind sessions"
    }

    async fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let processes = match list_processes().await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("  ✗ error listing processes: {e}");
                return CommandResult::Handled;
            }
        };

        let mut owners = HashMap::new();
        for name in ctx.manager.names().await {
            if let Some(pid) = ctx.manager.get(&name).await.and_then(|s| s.pid()) {
                owners.insert(pid, name);
            }
        }

        for p in processes
            .iter()
            .filter(|p| args.is_empty() || p.command.contains(args))
        {
            match owners.get(&p.pid) {
                Some(session) => println!("  {:>7}  {}  <- {session}", p.pid, p.command),
                None => println!("  {:>7}  {}", p.pid, p.command),
            }
        }
        CommandResult::Handled
    }
}
