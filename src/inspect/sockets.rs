use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

static SOCKET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:tcp|udp)6?)\s.*\b(LISTEN|ESTABLISHED)\b").expect("valid socket regex")
});

/// A listening or established socket from `netstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEntry {
    pub proto: String,
    pub local_address: String,
    pub port: u16,
    pub state: String,
    pub raw: String,
}

/// Pick the LISTEN/ESTABLISHED rows out of `netstat -tulnp` output.
pub fn parse_netstat(output: &str) -> Vec<SocketEntry> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<SocketEntry> {
    let caps = SOCKET_LINE.captures(line)?;
    let proto = caps.get(1)?.as_str().to_string();
    let state = caps.get(2)?.as_str().to_string();

    // Columns: Proto Recv-Q Send-Q Local-Address Foreign-Address State ...
    let local = line.split_whitespace().nth(3)?;
    let (address, port) = local.rsplit_once(':')?;
    let port = port.parse().ok()?;

    Some(SocketEntry {
        proto,
        local_address: address.to_string(),
        port,
        state,
        raw: line.trim().to_string(),
    })
}

pub async fn list_sockets() -> Result<Vec<SocketEntry>> {
    let output = super::capture("netstat", &["-tulnp"]).await?;
    Ok(parse_netstat(&output))
}
