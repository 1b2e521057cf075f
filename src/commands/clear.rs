use async_trait::async_trait;
use std::io::Write;

use super::{Command, CommandContext, CommandResult};

/// Erase the screen and home the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct ClearCommand;

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &str {
        "/clear"
    }

    fn aliases(&self) -> &[&str] {
        &["clear"]
    }

    fn description(&self) -> &str {
        "clear the terminal"
    }

    async fn execute(&self, _args: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        print!("{CLEAR_SCREEN}");
        let _ = std::io::stdout().flush();
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_clear_is_an_alias() {
        assert!(ClearCommand.aliases().contains(&"clear"));
    }
}
