//! Build the record table from classified log lines.

use chrono::Duration;
use std::path::Path;

use super::log_loader::LogLoader;
use super::log_parser::{classify_payload, parse_line};
use super::types::{Direction, RadioEvent, Record, RecordTable};

/// Incremental builder turning classified events into records.
///
/// The first observed timestamp fixes the time origin, whether or not its
/// line turns into a record; every record stores its offset from that origin.
#[derive(Debug)]
pub struct TableBuilder {
    table: RecordTable,
    base_timestamp: Option<u64>,
    last_progress_timestamp: u64,
    progress_interval_us: u64,
    skipped_early: u64,
}

impl TableBuilder {
    /// Create a builder logging progress every `progress_interval` of simulated time.
    pub fn new(progress_interval: Duration) -> Self {
        Self {
            table: RecordTable::new(),
            base_timestamp: None,
            last_progress_timestamp: 0,
            progress_interval_us: progress_interval.num_microseconds().unwrap_or(i64::MAX).max(1) as u64,
            skipped_early: 0,
        }
    }

    /// Note a parsed log line at raw `timestamp`.
    ///
    /// The first call fixes the time origin. Also logs progress each time the
    /// clock advances by the progress interval.
    pub fn observe(&mut self, timestamp: u64) {
        let base = *self.base_timestamp.get_or_insert(timestamp);
        if timestamp.saturating_sub(self.last_progress_timestamp) >= self.progress_interval_us {
            let minutes = Duration::microseconds(timestamp.saturating_sub(base) as i64).num_minutes();
            log::info!("Parsed up to minute {} ({} records)", minutes, self.table.len());
            self.last_progress_timestamp = timestamp;
        }
    }

    /// Add an event logged by `node_id` at raw `timestamp`.
    ///
    /// Receptions with a zero source are dropped, as are events logged
    /// before the time origin. Without a prior `observe`, the event's own
    /// timestamp becomes the origin even when it is dropped.
    ///
    /// # Returns
    ///
    /// `true` if a record was added to the table.
    pub fn push(&mut self, timestamp: u64, node_id: u32, event: RadioEvent) -> bool {
        let base = *self.base_timestamp.get_or_insert(timestamp);
        let (source, direction) = match event {
            RadioEvent::Transmit(_) => (node_id, Direction::Transmit),
            RadioEvent::Receive { source: 0, .. } => return false,
            RadioEvent::Receive { source, rssi, .. } => (source, Direction::Receive { destination: node_id, rssi }),
        };

        let Some(elapsed_us) = timestamp.checked_sub(base) else {
            self.skipped_early += 1;
            log::debug!("Skipping event at {} before time origin {}", timestamp, base);
            return false;
        };

        let header = event.header();
        self.table.push(Record {
            elapsed_us,
            asn: header.asn,
            radio: header.radio,
            channel: header.channel,
            source,
            direction,
        });
        true
    }

    /// Number of events dropped because they precede the time origin.
    pub fn skipped_early(&self) -> u64 {
        self.skipped_early
    }

    pub fn finish(self) -> RecordTable {
        self.table
    }
}

/// Parse a whole log file into a record table.
///
/// Lines that do not follow the line format, and payloads that are not
/// TSCH frame reports, are skipped.
pub fn parse_log_file(path: &Path, progress_interval: Duration) -> Result<RecordTable, std::io::Error> {
    let mut loader = LogLoader::new(path)?;
    let mut builder = TableBuilder::new(progress_interval);

    while let Some(line) = loader.next_line()? {
        let Some(log_line) = parse_line(line) else {
            log::trace!("Unparseable log line: {}", line);
            continue;
        };
        builder.observe(log_line.timestamp);
        if let Some(event) = classify_payload(log_line.payload) {
            builder.push(log_line.timestamp, log_line.node_id, event);
        }
    }

    if builder.skipped_early() > 0 {
        log::warn!("Skipped {} events logged before the first timestamp", builder.skipped_early());
    }
    let table = builder.finish();
    log::info!("Parsed {} records from {} lines of {}", table.len(), loader.lines_read(), path.display());
    Ok(table)
}
