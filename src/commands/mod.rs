//! Built-in REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! and help generation. Anything that isn't a command is sent to the active
//! session by the caller.

mod clear;
mod close;
mod config;
mod history;
mod new;
mod processes;
mod quit;
mod sessions;
mod sockets;
mod switch;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::history::History;
use crate::session::manager::SessionManager;

/// What commands can see and touch.
pub struct CommandContext<'a> {
    pub manager: &'a SessionManager,
    /// Name of the session plain input goes to, if any.
    pub active: Option<&'a str>,
    pub history: &'a dyn History,
    pub config: &'a Config,
}

/// What the REPL should do after a command runs.
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Not a command, send the input to the active session.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Change the active session (`None` detaches).
    Switch(Option<String>),
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/new"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/ls"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis for `/help`, e.g. `"<name>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is everything after the command word, trimmed.
    async fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> CommandResult;
}

/// Holds registered commands. Supports runtime registration.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(HelpCommand),
            Arc::new(new::NewCommand),
            Arc::new(sessions::SessionsCommand),
            Arc::new(switch::SwitchCommand),
            Arc::new(close::CloseCommand),
            Arc::new(history::HistoryCommand),
            Arc::new(config::ConfigCommand),
            Arc::new(sockets::SocketsCommand),
            Arc::new(processes::ProcessesCommand),
            Arc::new(clear::ClearCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let input = input.trim();
        let (word, args) = input
            .split_once(char::is_whitespace)
            .map_or((input, ""), |(w, a)| (w, a.trim()));

        for command in &self.commands {
            if word == command.name() || command.aliases().contains(&word) {
                // /help needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(args, ctx).await;
            }
        }

        if word.starts_with('/') {
            println!("unknown command: {word}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "/help"
    }

    fn aliases(&self) -> &[&str] {
        &["/h", "/?"]
    }

    fn description(&self) -> &str {
        "show this help"
    }

    // Dispatch answers /help itself; this only runs when called directly.
    async fn execute(&self, _args: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        print!("{}", CommandRegistry::new().help_text());
        CommandResult::Handled
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let head = if usage.is_empty() {
        name.to_string()
    } else {
        format!("{name} {usage}")
    };
    if aliases.is_empty() {
        head
    } else {
        format!("{} ({})", head, aliases.join(", "))
    }
}
