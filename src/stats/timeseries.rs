//! Fixed-window time series of PRR and RSSI per channel.

use chrono::Duration;
use std::collections::{BTreeMap, BTreeSet};

use super::aggregate::Counters;
use crate::analyzer::types::{Radio, RecordTable};

/// Default width of a time bucket, in minutes.
pub const DEFAULT_BUCKET_MINUTES: i64 = 5;

/// Aggregates of one (bucket, channel) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketStats {
    pub tx_count: u64,
    pub rx_count: u64,
    pub mean_rssi: Option<f64>,
    pub prr: Option<f64>,
}

/// One time bucket, with a cell per channel of the series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    /// Start of the bucket in microseconds since the time origin.
    pub bucket_start_us: u64,
    /// Aligned with `TimeSeries::channels`; `None` where the channel saw no record.
    pub cells: Vec<Option<BucketStats>>,
}

/// Bucketed statistics of one radio, channels as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub radio: Radio,
    pub bucket_width_us: u64,
    /// Channels used by the radio, ascending.
    pub channels: Vec<u16>,
    /// Non-empty buckets, ascending.
    pub rows: Vec<TimeSeriesRow>,
}

/// A single metric pivoted to buckets × channels.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub channels: Vec<u16>,
    pub bucket_starts_us: Vec<u64>,
    /// Row-major, one row per bucket.
    pub values: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    /// The values of one channel over time.
    pub fn column(&self, channel: u16) -> Option<Vec<Option<f64>>> {
        let idx = self.channels.iter().position(|&c| c == channel)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn prr_table(&self) -> PivotTable {
        self.pivot(|cell| cell.prr)
    }

    pub fn rssi_table(&self) -> PivotTable {
        self.pivot(|cell| cell.mean_rssi)
    }

    fn pivot(&self, metric: impl Fn(&BucketStats) -> Option<f64>) -> PivotTable {
        PivotTable {
            channels: self.channels.clone(),
            bucket_starts_us: self.rows.iter().map(|row| row.bucket_start_us).collect(),
            values: self
                .rows
                .iter()
                .map(|row| row.cells.iter().map(|cell| cell.as_ref().and_then(&metric)).collect())
                .collect(),
        }
    }
}

/// Bucket the records of `radio` into windows of `bucket_width` per channel.
///
/// Buckets are aligned to the time origin. Buckets without any record of the
/// radio are left out.
pub fn time_series(table: &RecordTable, radio: Radio, bucket_width: Duration) -> TimeSeries {
    let bucket_width_us = bucket_width.num_microseconds().unwrap_or(i64::MAX).max(1) as u64;

    let mut cells: BTreeMap<(u64, u16), Counters> = BTreeMap::new();
    let mut channels = BTreeSet::new();
    for record in table.for_radio(radio) {
        let bucket = record.elapsed_us / bucket_width_us;
        cells.entry((bucket, record.channel)).or_default().add(record);
        channels.insert(record.channel);
    }
    let channels: Vec<u16> = channels.into_iter().collect();

    let mut rows: Vec<TimeSeriesRow> = Vec::new();
    for ((bucket, channel), counters) in cells {
        let bucket_start_us = bucket * bucket_width_us;
        if rows.last().map(|row| row.bucket_start_us) != Some(bucket_start_us) {
            rows.push(TimeSeriesRow {
                bucket_start_us,
                cells: vec![None; channels.len()],
            });
        }
        let Some(row) = rows.last_mut() else {
            continue;
        };
        if let Ok(idx) = channels.binary_search(&channel) {
            row.cells[idx] = Some(BucketStats {
                tx_count: counters.tx_count,
                rx_count: counters.rx_count,
                mean_rssi: counters.mean_rssi(),
                prr: counters.prr(),
            });
        }
    }

    TimeSeries {
        radio,
        bucket_width_us,
        channels,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{Direction, Record};

    const MINUTE_US: u64 = 60_000_000;

    fn record(elapsed_us: u64, radio: Radio, channel: u16, rssi: Option<i32>) -> Record {
        Record {
            elapsed_us,
            asn: 0,
            radio,
            channel,
            source: 1,
            direction: match rssi {
                Some(rssi) => Direction::Receive { destination: 2, rssi },
                None => Direction::Transmit,
            },
        }
    }

    fn sample_table() -> RecordTable {
        RecordTable::from_records(vec![
            record(0, Radio::Cc1200, 16, None),
            record(MINUTE_US, Radio::Cc1200, 16, None),
            record(2 * MINUTE_US, Radio::Cc1200, 16, Some(-60)),
            record(3 * MINUTE_US, Radio::Cc1200, 20, Some(-80)),
            record(4 * MINUTE_US, Radio::Cc2538, 26, None),
            // Bucket [5, 10) minutes is empty for cc1200.
            record(11 * MINUTE_US, Radio::Cc1200, 20, None),
            record(14 * MINUTE_US + 59_999_999, Radio::Cc1200, 20, Some(-70)),
        ])
    }

    #[test]
    fn buckets_are_aligned_to_origin_and_skip_empty_windows() {
        let series = time_series(&sample_table(), Radio::Cc1200, Duration::minutes(DEFAULT_BUCKET_MINUTES));
        assert_eq!(series.bucket_width_us, 5 * MINUTE_US);
        assert_eq!(series.channels, vec![16, 20]);
        let starts: Vec<u64> = series.rows.iter().map(|r| r.bucket_start_us).collect();
        assert_eq!(starts, vec![0, 10 * MINUTE_US]);
    }

    #[test]
    fn cells_carry_prr_and_rssi() {
        let series = time_series(&sample_table(), Radio::Cc1200, Duration::minutes(DEFAULT_BUCKET_MINUTES));

        let first = &series.rows[0];
        let ch16 = first.cells[0].as_ref().unwrap();
        assert_eq!((ch16.tx_count, ch16.rx_count), (2, 1));
        assert_eq!(ch16.prr, Some(0.5));
        assert_eq!(ch16.mean_rssi, Some(-60.0));
        let ch20 = first.cells[1].as_ref().unwrap();
        assert_eq!(ch20.prr, None);
        assert_eq!(ch20.mean_rssi, Some(-80.0));

        let second = &series.rows[1];
        assert!(second.cells[0].is_none());
        assert_eq!(second.cells[1].as_ref().unwrap().prr, Some(1.0));
    }

    #[test]
    fn pivot_tables_project_one_metric() {
        let series = time_series(&sample_table(), Radio::Cc1200, Duration::minutes(DEFAULT_BUCKET_MINUTES));

        let prr = series.prr_table();
        assert_eq!(prr.bucket_starts_us, vec![0, 10 * MINUTE_US]);
        assert_eq!(prr.values, vec![vec![Some(0.5), None], vec![None, Some(1.0)]]);
        assert_eq!(prr.column(20), Some(vec![None, Some(1.0)]));
        assert_eq!(prr.column(26), None);

        let rssi = series.rssi_table();
        assert_eq!(rssi.column(16), Some(vec![Some(-60.0), None]));
        assert_eq!(rssi.column(20), Some(vec![Some(-80.0), Some(-70.0)]));
    }

    #[test]
    fn filters_to_one_radio() {
        let series = time_series(&sample_table(), Radio::Cc2538, Duration::minutes(1));
        assert_eq!(series.channels, vec![26]);
        assert_eq!(series.rows.len(), 1);
        assert_eq!(series.rows[0].bucket_start_us, 4 * MINUTE_US);

        let empty = time_series(&RecordTable::new(), Radio::Cc2538, Duration::minutes(DEFAULT_BUCKET_MINUTES));
        assert!(empty.is_empty());
        assert!(empty.channels.is_empty());
    }
}
