//! Trade Log - Daily JSONL Audit of Applied Trades
//!
//! One file per UTC day of the trade timestamp, `trades/YYYY-MM-DD.jsonl`,
//! one `TradeRecord` per line. A torn final line costs one record, never
//! the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::ports::repository::TradeRecord;

const TRADES_SUBDIR: &str = "trades";

/// Append-only trade audit log partitioned by day.
pub struct TradeLogger {
    dir: PathBuf,
}

impl TradeLogger {
    /// Open (creating if needed) `<data_dir>/trades`.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().join(TRADES_SUBDIR);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Day file a record belongs to. Out-of-range timestamps land in today's file.
    fn day_file(&self, timestamp_ms: i64) -> PathBuf {
        let day = Utc
            .timestamp_millis_opt(timestamp_ms)
            .single()
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d");
        self.dir.join(format!("{day}.jsonl"))
    }

    /// Append one record to its day file.
    #[instrument(skip(self, record), fields(trade_id = %record.id, market_id = %record.market_id))]
    pub async fn append_trade(&self, record: &TradeRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record).context("Failed to serialize trade record")?;
        line.push(b'\n');

        let path = self.day_file(record.timestamp_ms);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.write_all(&line).await.context("Failed to append trade record")?;
        file.flush().await.context("Failed to flush trade log")?;

        debug!(file = %path.display(), "Trade recorded");
        Ok(())
    }

    /// Every record across all day files, ordered by timestamp.
    #[instrument(skip(self))]
    pub async fn load_all_trades(&self) -> Result<Vec<TradeRecord>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;

        let mut trades = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "jsonl") {
                continue;
            }
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            trades.extend(parse_records(&path, &content));
        }

        trades.sort_by_key(|t| t.timestamp_ms);
        debug!(count = trades.len(), "Trade log loaded");
        Ok(trades)
    }

    /// Whether the log directory accepts writes.
    pub async fn is_healthy(&self) -> bool {
        let marker = self.dir.join(".health_check");
        let writable = fs::write(&marker, b"ok").await.is_ok();
        let _ = fs::remove_file(&marker).await;
        writable
    }
}

/// Decode the non-blank lines of one day file, skipping malformed ones.
fn parse_records(path: &Path, content: &str) -> Vec<TradeRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping malformed trade record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Side;

    fn record(id: &str, timestamp_ms: i64) -> TradeRecord {
        TradeRecord {
            id: id.to_string(),
            market_id: "m".to_string(),
            side: Side::Yes,
            stake: 10.0,
            old_probability: 0.5,
            new_probability: 0.52,
            delta_q: 5.0,
            timestamp_ms,
        }
    }

    #[test]
    fn test_parse_skips_blank_and_torn_lines() {
        let good = serde_json::to_string(&record("a", 1)).unwrap();
        let content = format!("{good}\n\n{{\"id\":\"torn\"\n");
        let parsed = parse_records(Path::new("x.jsonl"), &content);
        assert_eq!(parsed, vec![record("a", 1)]);
    }

    #[tokio::test]
    async fn test_records_are_partitioned_by_trade_day() {
        let dir = std::env::temp_dir().join(format!("samsa-trades-{}", uuid::Uuid::new_v4()));
        let log = TradeLogger::new(&dir).await.unwrap();

        // 2024-01-01T00:00:00Z and one day later.
        let day_one = 1_704_067_200_000;
        let day_two = day_one + 86_400_000;
        log.append_trade(&record("late", day_two)).await.unwrap();
        log.append_trade(&record("early", day_one)).await.unwrap();

        assert!(dir.join("trades/2024-01-01.jsonl").exists());
        assert!(dir.join("trades/2024-01-02.jsonl").exists());

        let ids: Vec<_> = log
            .load_all_trades()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);

        let _ = fs::remove_dir_all(&dir).await;
    }
}
