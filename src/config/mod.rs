//! Persisted defaults for new sessions.
//!
//! A key-value table in the same SQLite database as the command history.
//! [`resolve_session_config`] layers CLI flags over stored keys over the
//! built-in defaults.

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::session::config::SessionConfig;

pub const KEY_PROGRAM: &str = "repl.program";
pub const KEY_ARGS: &str = "repl.args";
pub const KEY_PROMPT: &str = "repl.prompt";
pub const KEY_TIMEOUT: &str = "repl.timeout_secs";

/// Keys `/config` accepts.
pub const KNOWN_KEYS: &[&str] = &[KEY_PROGRAM, KEY_ARGS, KEY_PROMPT, KEY_TIMEOUT];

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }

    /// All stored pairs, sorted by key.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Session settings given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub prompt: Option<String>,
    pub timeout_secs: Option<u64>,
    pub working_dir: Option<PathBuf>,
}

/// Build the default session config: CLI flag, then stored key, then built-in.
pub fn resolve_session_config(config: &Config, cli: &CliOverrides) -> Result<SessionConfig> {
    let mut session = SessionConfig::default();

    if let Some(program) = cli.program.clone().or(config.get(KEY_PROGRAM)?) {
        // Another program doesn't inherit python's flags.
        if program != session.program {
            session.args.clear();
        }
        session.program = program;
    }

    if let Some(args) = &cli.args {
        session.args = args.clone();
    } else if let Some(args) = config.get(KEY_ARGS)? {
        session.args = args.split_whitespace().map(str::to_string).collect();
    }

    if let Some(prompt) = &cli.prompt {
        session.prompt = Regex::new(prompt).context("invalid --prompt regex")?;
    } else if let Some(prompt) = config.get(KEY_PROMPT)? {
        session.prompt =
            Regex::new(&prompt).with_context(|| format!("invalid regex in {KEY_PROMPT}"))?;
    }

    if let Some(secs) = cli.timeout_secs {
        session.response_timeout = Duration::from_secs(secs);
    } else if let Some(secs) = config.get(KEY_TIMEOUT)? {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("{KEY_TIMEOUT} must be a whole number of seconds"))?;
        session.response_timeout = Duration::from_secs(secs);
    }

    session.working_dir = cli.working_dir.clone();
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        assert!(mem_config().get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set(KEY_PROGRAM, "python3").unwrap();
        config.set(KEY_PROGRAM, "node").unwrap();
        assert_eq!(config.get(KEY_PROGRAM).unwrap().unwrap(), "node");
    }

    #[test]
    fn remove_deletes_key() {
        let config = mem_config();
        config.set(KEY_PROMPT, "> ").unwrap();
        config.remove(KEY_PROMPT).unwrap();
        assert!(config.get(KEY_PROMPT).unwrap().is_none());
        config.remove(KEY_PROMPT).unwrap();
    }

    #[test]
    fn entries_are_sorted() {
        let config = mem_config();
        config.set(KEY_TIMEOUT, "5").unwrap();
        config.set(KEY_ARGS, "-i").unwrap();
        let keys: Vec<_> = config.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![KEY_ARGS, KEY_TIMEOUT]);
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = Config::open(path_str).unwrap();
            config.set(KEY_PROGRAM, "ghci").unwrap();
        }

        let config = Config::open(path_str).unwrap();
        assert_eq!(config.get(KEY_PROGRAM).unwrap().unwrap(), "ghci");
    }

    #[test]
    fn resolve_uses_builtins_when_empty() {
        let session = resolve_session_config(&mem_config(), &CliOverrides::default()).unwrap();
        assert_eq!(session.command_line(), "python -i -u");
        assert_eq!(session.response_timeout, Duration::from_secs(10));
    }

    #[test]
    fn stored_program_without_args_runs_bare() {
        let config = mem_config();
        config.set(KEY_PROGRAM, "node").unwrap();

        let session = resolve_session_config(&config, &CliOverrides::default()).unwrap();
        assert_eq!(session.command_line(), "node");
    }

    #[test]
    fn stored_python_keeps_default_flags() {
        let config = mem_config();
        config.set(KEY_PROGRAM, "python").unwrap();

        let session = resolve_session_config(&config, &CliOverrides::default()).unwrap();
        assert_eq!(session.command_line(), "python -i -u");
    }

    #[test]
    fn resolve_prefers_stored_over_builtin() {
        let config = mem_config();
        config.set(KEY_PROGRAM, "node").unwrap();
        config.set(KEY_ARGS, "-i  --no-warnings").unwrap();
        config.set(KEY_PROMPT, "^> ").unwrap();
        config.set(KEY_TIMEOUT, "30").unwrap();

        let session = resolve_session_config(&config, &CliOverrides::default()).unwrap();
        assert_eq!(session.command_line(), "node -i --no-warnings");
        assert!(session.is_prompt_partial("> "));
        assert_eq!(session.response_timeout, Duration::from_secs(30));
    }

    #[test]
    fn resolve_prefers_cli_over_stored() {
        let config = mem_config();
        config.set(KEY_PROGRAM, "node").unwrap();
        let cli = CliOverrides {
            program: Some("irb".to_string()),
            args: Some(vec![]),
            timeout_secs: Some(2),
            ..CliOverrides::default()
        };

        let session = resolve_session_config(&config, &cli).unwrap();
        assert_eq!(session.command_line(), "irb");
        assert_eq!(session.response_timeout, Duration::from_secs(2));
    }

    #[test]
    fn resolve_rejects_bad_stored_prompt() {
        let config = mem_config();
        config.set(KEY_PROMPT, "(unclosed").unwrap();
        let err = resolve_session_config(&config, &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains(KEY_PROMPT));
    }

    #[test]
    fn resolve_rejects_bad_timeout() {
        let config = mem_config();
        config.set(KEY_TIMEOUT, "soon").unwrap();
        assert!(resolve_session_config(&config, &CliOverrides::default()).is_err());
    }
}
