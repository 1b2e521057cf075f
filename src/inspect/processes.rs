use anyhow::Result;

/// One row of `ps -eo pid,comm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub command: String,
}

/// Parse `ps -eo pid,comm`. The header and any row without a numeric pid
/// are skipped.
pub fn parse_ps(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, command) = line.trim().split_once(char::is_whitespace)?;
            Some(ProcessEntry {
                pid: pid.parse().ok()?,
                command: command.trim().to_string(),
            })
        })
        .collect()
}

pub async fn list_processes() -> Result<Vec<ProcessEntry>> {
    let output = super::capture("ps", &["-eo", "pid,comm"]).await?;
    Ok(parse_ps(&output))
}
