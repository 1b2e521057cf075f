use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::Mutex;

use super::{History, HistoryEntry};

/// SQLite-backed command history.
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                entry TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }
}

/// `%text%` for `LIKE ... ESCAPE '\'`, with wildcards in `text` escaped.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn decode(jsons: Vec<String>) -> Result<Vec<HistoryEntry>> {
    let entries = jsons
        .iter()
        .map(|json| serde_json::from_str(json))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

#[async_trait]
impl History for SqliteHistory {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let json = serde_json::to_string(&entry)?;
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO history (entry) VALUES (?1)", [&json])?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let jsons = {
            let conn = self.conn.lock().unwrap();
            // Newest `limit` rows, returned in chronological order
            let mut stmt = conn.prepare(
                "SELECT entry FROM (
                    SELECT entry, id FROM history ORDER BY id DESC LIMIT ?1
                ) ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map([limit as i64], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        decode(jsons)
    }

    async fn search(&self, query: &str) -> Result<Vec<HistoryEntry>> {
        let jsons = {
            let conn = self.conn.lock().unwrap();
            // Match the command and response text, not the JSON around them.
            let mut stmt = conn.prepare(
                "SELECT entry FROM history
                 WHERE json_extract(entry, '$.command') LIKE ?1 ESCAPE '\\'
                    OR json_extract(entry, '$.response') LIKE ?1 ESCAPE '\\'
                 ORDER BY id ASC",
            )?;
            let pattern = contains_pattern(query);
            let rows = stmt
                .query_map([&pattern], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        decode(jsons)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM history", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_escapes_like_wildcards() {
        assert_eq!(contains_pattern("abc"), "%abc%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"C:\tmp"), r"%C:\\tmp%");
    }
}
