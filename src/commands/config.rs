use async_trait::async_trait;

use super::{Command, CommandContext, CommandResult};
use crate::config::{KEY_PROMPT, KEY_TIMEOUT, KNOWN_KEYS};

pub struct ConfigCommand;

/// Reject values that would make the next start fail.
fn validate(key: &str, value: &str) -> Result<(), String> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(format!(
            "unknown key: {key} (known: {})",
            KNOWN_KEYS.join(", ")
        ));
    }
    if key == KEY_PROMPT {
        regex::Regex::new(value).map_err(|e| format!("invalid regex: {e}"))?;
    }
    if key == KEY_TIMEOUT {
        value
            .parse::<u64>()
            .map_err(|_| format!("{KEY_TIMEOUT} must be a whole number of seconds"))?;
    }
    Ok(())
}

#[async_trait]
impl Command for ConfigCommand {
    fn name(&self) -> &str {
        "/config"
    }

    fn usage(&self) -> &str {
        "[key [value] | unset key]"
    }

    fn description(&self) -> &str {
        "show or change session defaults (used by new sessions on next start)"
    }

    async fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let (key, value) = args
            .split_once(char::is_whitespace)
            .map_or((args, ""), |(k, v)| (k, v.trim()));

        let outcome = match (key, value) {
            ("", _) => ctx.config.entries().map(|entries| {
                if entries.is_empty() {
                    println!("  (nothing stored; keys: {})", KNOWN_KEYS.join(", "));
                }
                for (k, v) in entries {
                    println!("  {k} = {v}");
                }
            }),
            ("unset", key) => ctx
                .config
                .remove(key)
                .map(|()| println!("  ✓ {key} unset")),
            (key, "") => ctx.config.get(key).map(|v| match v {
                Some(v) => println!("  {key} = {v}"),
                None => println!("  {key} is not set"),
            }),
            (key, value) => match validate(key, value) {
                Ok(()) => ctx
                    .config
                    .set(key, value)
                    .map(|()| println!("  ✓ {key} = {value}")),
                Err(msg) => {
                    eprintln!("  ✗ {msg}");
                    Ok(())
                }
            },
        };

        if let Err(e) = outcome {
            eprintln!("  ✗ config error: {e}");
        }
        CommandResult::Handled
    }
}
