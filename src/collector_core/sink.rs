use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::collector_core::simulator::TradeEvent;

/// Column order is the contract with the downstream trainers. Do not reorder.
pub const CSV_HEADER: [&str; 10] = [
    "timestamp",
    "best_ask",
    "best_bid",
    "spread",
    "mid_price",
    "order_size",
    "volatility",
    "sim_price",
    "side",
    "is_taker",
];

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

impl From<csv::Error> for SinkError {
    fn from(err: csv::Error) -> Self {
        SinkError::Csv(err)
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "IO error: {}", e),
            SinkError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

#[async_trait]
pub trait FlushBackend: Send {
    /// Rewrite the store with the full accumulated log.
    async fn write_all(&mut self, events: &[TradeEvent]) -> Result<(), SinkError>;

    /// Backend type for logging.
    fn backend_type(&self) -> &'static str;
}

/// Flat-file store. Each flush truncates and rewrites the whole file, so the
/// file on disk is always a complete, self-describing snapshot of the log.
pub struct CsvBackend {
    path: PathBuf,
}

impl CsvBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl FlushBackend for CsvBackend {
    async fn write_all(&mut self, events: &[TradeEvent]) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(CSV_HEADER)?;

        for event in events {
            let tick = &event.tick;
            let taker_label = if event.is_taker { "1" } else { "0" };
            writer.write_record(&[
                tick.timestamp.to_string(),
                tick.best_ask.to_string(),
                tick.best_bid.to_string(),
                tick.spread.to_string(),
                tick.mid_price.to_string(),
                tick.order_size.to_string(),
                tick.volatility.to_string(),
                event.sim_price.to_string(),
                event.side.as_str().to_string(),
                taker_label.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

/// Accumulates the append-only event log in memory and rewrites the store at
/// every flush boundary. The log is never truncated while the process lives.
pub struct EventSink {
    events: Vec<TradeEvent>,
    flush_every: usize,
    backend: Box<dyn FlushBackend>,
}

impl EventSink {
    pub fn new(backend: Box<dyn FlushBackend>, flush_every: usize) -> Self {
        Self {
            events: Vec::new(),
            flush_every,
            backend,
        }
    }

    /// Take ownership of a fully formed event. Never touches the filesystem.
    pub fn append(&mut self, event: TradeEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Rewrite the store when the log has grown to the next flush boundary.
    /// A failed write keeps the log intact; the same full rewrite is retried
    /// at the following boundary.
    pub async fn maybe_flush(&mut self) {
        if self.events.is_empty() || self.events.len() % self.flush_every != 0 {
            return;
        }

        match self.backend.write_all(&self.events).await {
            Ok(()) => log::info!("💾 {} ticks saved", self.events.len()),
            Err(e) => log::error!(
                "❌ Failed to flush {} events to {} store: {}",
                self.events.len(),
                self.backend.backend_type(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector_core::features::Tick;
    use crate::collector_core::simulator::Side;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn make_event(timestamp: i64, bid: f64, ask: f64, is_taker: bool) -> TradeEvent {
        TradeEvent {
            tick: Tick {
                timestamp,
                best_bid: bid,
                best_ask: ask,
                spread: ask - bid,
                mid_price: (ask + bid) / 2.0,
                order_size: 2.0,
                volatility: 0.0,
            },
            sim_price: ask,
            side: Side::Buy,
            is_taker,
        }
    }

    /// Records the size of every attempted write, failing the first `fail_n`.
    struct RecordingBackend {
        writes: Arc<Mutex<Vec<usize>>>,
        fail_n: usize,
        attempts: usize,
    }

    #[async_trait]
    impl FlushBackend for RecordingBackend {
        async fn write_all(&mut self, events: &[TradeEvent]) -> Result<(), SinkError> {
            self.attempts += 1;
            if self.attempts <= self.fail_n {
                return Err(SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "simulated disk failure",
                )));
            }
            self.writes.lock().unwrap().push(events.len());
            Ok(())
        }

        fn backend_type(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_flushes_exactly_at_boundaries_with_full_log() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let backend = RecordingBackend {
            writes: writes.clone(),
            fail_n: 0,
            attempts: 0,
        };
        let mut sink = EventSink::new(Box::new(backend), 2);

        for i in 0..5 {
            sink.append(make_event(1_700_000_000 + i, 100.0, 101.0, true));
            sink.maybe_flush().await;
        }

        // Boundaries at 2 and 4; each write carries the whole log.
        assert_eq!(*writes.lock().unwrap(), vec![2, 4]);
        assert_eq!(sink.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_flush_retains_log_and_retries_at_next_boundary() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let backend = RecordingBackend {
            writes: writes.clone(),
            fail_n: 1,
            attempts: 0,
        };
        let mut sink = EventSink::new(Box::new(backend), 2);

        for i in 0..4 {
            sink.append(make_event(1_700_000_000 + i, 100.0, 101.0, true));
            sink.maybe_flush().await;
        }

        // First boundary (2 events) fails; second boundary writes all 4.
        assert_eq!(*writes.lock().unwrap(), vec![4]);
        assert_eq!(sink.len(), 4);
    }

    #[tokio::test]
    async fn test_csv_backend_rewrites_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let backend = CsvBackend::new(&path).unwrap();
        let mut sink = EventSink::new(Box::new(backend), 2);

        for i in 0..4 {
            sink.append(make_event(1_700_000_000 + i, 100.0, 101.0, i % 2 == 0));
            sink.maybe_flush().await;
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        // Header plus all four events after the second flush.
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("1700000000,101,100,1,100.5,2,0,101,buy,1"));
        assert!(lines[2].ends_with(",buy,0"));
    }

    #[tokio::test]
    async fn test_csv_flush_failure_recovers_once_path_is_writable() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("out");
        let path = nested.join("events.csv");
        let backend = CsvBackend::new(&path).unwrap();
        let mut sink = EventSink::new(Box::new(backend), 2);

        // Knock the directory out from under the first flush.
        std::fs::remove_dir_all(&nested).unwrap();
        for i in 0..2 {
            sink.append(make_event(1_700_000_000 + i, 100.0, 101.0, true));
            sink.maybe_flush().await;
        }
        assert!(!path.exists());
        assert_eq!(sink.len(), 2);

        // Restore the directory; the next boundary writes the complete log.
        std::fs::create_dir_all(&nested).unwrap();
        for i in 2..4 {
            sink.append(make_event(1_700_000_000 + i, 100.0, 101.0, true));
            sink.maybe_flush().await;
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
    }
}
