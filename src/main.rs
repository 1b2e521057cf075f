use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use replhost::banner::{BannerInfo, print_banner, print_session_summary};
use replhost::commands::{CommandContext, CommandRegistry, CommandResult};
use replhost::config::{CliOverrides, Config, resolve_session_config};
use replhost::consts::default_db_path;
use replhost::events::EventBus;
use replhost::executor::Executor;
use replhost::executor::echo::EchoExecutor;
use replhost::history::sqlite::SqliteHistory;
use replhost::history::{History, HistoryEntry};
use replhost::printer::EventPrinter;
use replhost::session::manager::SessionManager;

#[derive(Parser)]
#[command(name = "replhost", version, about = "Host interactive REPL processes from one terminal.")]
struct Cli {
    /// Echo input back instead of launching a REPL process
    #[arg(long, default_value_t = false)]
    echo: bool,

    /// Simulated latency of the echo backend, in milliseconds
    #[arg(long, default_value_t = 100)]
    echo_delay_ms: u64,

    /// REPL program to launch (default: python, or repl.program)
    #[arg(short, long)]
    program: Option<String>,

    /// Argument for the REPL program; repeat for several
    #[arg(short = 'a', long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Regex that matches the REPL's prompt
    #[arg(long)]
    prompt: Option<String>,

    /// Seconds to wait for a prompt after each command
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Working directory for REPL processes
    #[arg(short, long)]
    work_dir: Option<PathBuf>,

    /// SQLite database for history and config (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// Send a single command, print the response, and exit
    #[arg(short, long)]
    run: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        // A different program shouldn't inherit python's flags.
        let args = if !self.args.is_empty() {
            Some(self.args.clone())
        } else if self.program.is_some() {
            Some(Vec::new())
        } else {
            None
        };
        CliOverrides {
            program: self.program.clone(),
            args,
            prompt: self.prompt.clone(),
            timeout_secs: self.timeout,
            working_dir: self.work_dir.clone(),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Resolve `--db` to a path string, creating the parent directory if needed.
fn prepare_db(db: Option<String>) -> Result<String> {
    if let Some(db) = db {
        return Ok(db);
    }
    let path = default_db_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Ok(path.to_string_lossy().into_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let db = prepare_db(cli.db.clone())?;
    let config = Config::open(&db)?;
    let history = SqliteHistory::new(&db)?;
    let defaults = resolve_session_config(&config, &cli.overrides())?;

    let events = Arc::new(EventBus::default());
    let manager = SessionManager::new(Arc::clone(&events), defaults.clone());
    let echo = EchoExecutor::new(Duration::from_millis(cli.echo_delay_ms));

    // Single command mode
    if let Some(command) = &cli.run {
        let result = if cli.echo {
            echo.execute(command).await
        } else {
            run_once(&manager, command).await
        };
        manager.shutdown_all().await;
        println!("{}", result?);
        return Ok(());
    }

    let printer = EventPrinter::spawn(events.subscribe(), |line| println!("{line}"));

    print_banner(&BannerInfo {
        mode: if cli.echo { "echo" } else { "process" },
        command_line: &defaults.command_line(),
        db: if db == ":memory:" { "ephemeral" } else { &db },
    });

    let mut active: Option<String> = None;
    if !cli.echo {
        match manager.open(None).await {
            Ok(name) => {
                if let Some(session) = manager.get(&name).await {
                    if let Err(e) = session.wait_ready(defaults.response_timeout).await {
                        eprintln!("warning: {e}");
                    }
                }
                active = Some(name);
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    let registry = CommandRegistry::new();
    let mut sent = 0usize;

    // REPL — async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        // Let the previous command's output finish printing first.
        printer.flush().await;
        let idle_label = if cli.echo { "echo" } else { "-" };
        print!("\n{}> ", active.as_deref().unwrap_or(idle_label));
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let ctx = CommandContext {
            manager: &manager,
            active: active.as_deref(),
            history: &history,
            config: &config,
        };
        match registry.dispatch(input, &ctx).await {
            CommandResult::Handled => continue,
            CommandResult::Switch(target) => {
                active = target;
                continue;
            }
            CommandResult::Quit => break,
            CommandResult::NotACommand => {}
        }

        let (label, executor): (String, Arc<dyn Executor>) = match active.clone() {
            Some(name) => match manager.get(&name).await {
                Some(session) => (name, session as Arc<dyn Executor>),
                None => {
                    eprintln!("{name} is gone; /sessions lists what's open");
                    active = None;
                    continue;
                }
            },
            None if cli.echo => ("echo".to_string(), Arc::new(echo.clone()) as Arc<dyn Executor>),
            None => {
                eprintln!("no active session; /new starts one");
                continue;
            }
        };

        // Ctrl+C while waiting abandons the wait, not the REPL
        let result = tokio::select! {
            result = executor.execute(input) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\ninterrupted");
                continue;
            }
        };
        sent += 1;

        let entry = match result {
            Ok(response) => {
                // Process output already went through the event printer.
                if active.is_none() {
                    println!("=> {response}");
                }
                HistoryEntry::success(&label, input, &response)
            }
            Err(e) => {
                eprintln!("error: {e}");
                HistoryEntry::failure(&label, input, &e.to_string())
            }
        };
        if let Err(e) = history.record(entry).await {
            tracing::warn!(error = %e, "failed to record history");
        }
    }

    manager.shutdown_all().await;
    printer.flush().await;
    printer.abort();
    print_session_summary(sent, manager.opened());
    Ok(())
}

/// Start a session, wait for its prompt, send one command.
async fn run_once(manager: &SessionManager, command: &str) -> Result<String> {
    let name = manager.open(None).await?;
    let Some(session) = manager.get(&name).await else {
        bail!("{name} disappeared before it was used");
    };
    session.wait_ready(manager.defaults().response_timeout).await?;
    Ok(session.send(command).await?)
}
