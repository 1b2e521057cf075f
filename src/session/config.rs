use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

use crate::consts::{
    DEFAULT_ARGS, DEFAULT_PROGRAM, DEFAULT_PROMPT, DEFAULT_RESPONSE_TIMEOUT,
    DEFAULT_SHUTDOWN_GRACE, session_name,
};

/// How to launch and talk to one REPL process.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    /// A line (or trailing partial line) matching this means the REPL wants input.
    pub prompt: Regex,
    pub response_timeout: Duration,
    pub shutdown_grace: Duration,
    pub working_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: session_name(1),
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            prompt: Regex::new(DEFAULT_PROMPT).expect("default prompt is a valid regex"),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            working_dir: None,
        }
    }
}

impl SessionConfig {
    /// The full command, as shown to the user.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A copy of this config under another name.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Whether a complete output line is a prompt.
    pub fn is_prompt_line(&self, line: &str) -> bool {
        self.prompt.is_match(line)
    }

    /// Whether a trailing partial line is a prompt. The match must reach the
    /// end of the partial, otherwise the REPL is still mid-line.
    pub fn is_prompt_partial(&self, partial: &str) -> bool {
        !partial.is_empty()
            && self
                .prompt
                .find(partial)
                .is_some_and(|m| m.end() == partial.len())
    }
}
