use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};
use crate::consts::DEFAULT_HISTORY_LIMIT;
use crate::history::{HistoryEntry, Outcome};

pub struct HistoryCommand;

/// What `/history` was asked to do.
#[derive(Debug, PartialEq)]
enum Request<'a> {
    Recent(usize),
    Search(&'a str),
    Clear,
}

fn parse(args: &str) -> Request<'_> {
    match args {
        "" => Request::Recent(DEFAULT_HISTORY_LIMIT),
        "clear" => Request::Clear,
        _ => match args.parse() {
            Ok(n) => Request::Recent(n),
            Err(_) => Request::Search(args),
        },
    }
}

fn print_entry(entry: &HistoryEntry) {
    println!("  [{}] {}", entry.session, entry.command);
    match &entry.outcome {
        Outcome::Success if entry.response.is_empty() => {}
        Outcome::Success => {
            for line in entry.response.lines() {
                println!("      {line}");
            }
        }
        Outcome::Error(e) => println!("      ✗ {e}"),
    }
}

#[async_trait]
impl Command for HistoryCommand {
    fn name(&self) -> &str {
        "/history"
    }

    fn usage(&self) -> &str {
        "[n | text | clear]"
    }

    fn description(&self) -> &str {
        "show recent commands, search them, or clear them"
    }

    async fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let entries = match parse(args) {
            Request::Clear => {
                match ctx.history.clear().await {
                    Ok(()) => println!("  ✓ history cleared"),
                    Err(e) => eprintln!("  ✗ failed to clear history: {e}"),
                }
                return CommandResult::Handled;
            }
            Request::Recent(n) => ctx.history.recent(n).await,
            Request::Search(query) => ctx.history.search(query).await,
        };

        match entries {
            Ok(entries) if entries.is_empty() => println!("  (no history)"),
            Ok(entries) => entries.iter().for_each(print_entry),
            Err(e) => eprintln!("  ✗ failed to read history: {e}"),
        }
        CommandResult::Handled
    }
}
