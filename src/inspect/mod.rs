//! Host inspection: what's listening and what's running.

pub mod processes;
pub mod sockets;

use anyhow::{Result, bail};
use tokio::process::Command;

/// Run a system tool and return its stdout.
async fn capture(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("failed to run {program}: {e}"))?;

    if !output.status.success() {
        bail!(
            "{program} exited with {}: {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
