use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};
use crate::inspect::sockets::list_sockets;

pub struct SocketsCommand;

#[async_trait]
impl Command for SocketsCommand {
    fn name(&self) -> &str {
        "/sockets"
    }

    fn description(&self) -> &str {
        "list listening and established sockets"
    }

    async fn execute(&self, _args: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        match list_sockets().await {
            Ok(sockets) if sockets.is_empty() => println!("  no sockets detected"),
            Ok(sockets) => {
                for s in sockets {
                    println!(
                        "  {:<5} {:<12} {:>5}  {}",
                        s.proto, s.state, s.port, s.local_address
                    );
                }
            }
            Err(e) => eprintln!("  ✗ error getting socket info: {e}"),
        }
        CommandResult::Handled
    }
}
