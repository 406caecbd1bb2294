//! Per-channel and per-link packet statistics.

use std::collections::BTreeMap;

use crate::analyzer::types::{Radio, Record, RecordTable};

/// Packet reception ratio, `None` when nothing was transmitted.
pub fn packet_reception_ratio(rx_count: u64, tx_count: u64) -> Option<f64> {
    if tx_count == 0 { None } else { Some(rx_count as f64 / tx_count as f64) }
}

/// Running counters for one group of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub tx_count: u64,
    pub rx_count: u64,
    rssi_sum: i64,
}

impl Counters {
    pub fn add(&mut self, record: &Record) {
        if record.is_tx() {
            self.tx_count += 1;
        } else if let Some(rssi) = record.rssi() {
            self.rx_count += 1;
            self.rssi_sum += i64::from(rssi);
        }
    }

    pub fn mean_rssi(&self) -> Option<f64> {
        if self.rx_count == 0 { None } else { Some(self.rssi_sum as f64 / self.rx_count as f64) }
    }

    pub fn prr(&self) -> Option<f64> {
        packet_reception_ratio(self.rx_count, self.tx_count)
    }
}

/// Grouping key of the channel-level statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelKey {
    pub radio: Radio,
    pub channel: u16,
    pub source: u32,
}

/// Statistics of everything sent by one source on one radio channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    pub key: ChannelKey,
    /// Frames the source reported as transmitted.
    pub tx_count: u64,
    /// Frames from the source that any node reported as received.
    pub rx_count: u64,
    pub mean_rssi: Option<f64>,
    pub prr: Option<f64>,
}

/// Group the table by (radio, channel, source).
///
/// Results are ordered by key.
pub fn channel_stats(table: &RecordTable) -> Vec<ChannelStats> {
    let mut groups: BTreeMap<ChannelKey, Counters> = BTreeMap::new();
    for record in table {
        let key = ChannelKey {
            radio: record.radio,
            channel: record.channel,
            source: record.source,
        };
        groups.entry(key).or_default().add(record);
    }

    groups
        .into_iter()
        .map(|(key, counters)| ChannelStats {
            key,
            tx_count: counters.tx_count,
            rx_count: counters.rx_count,
            mean_rssi: counters.mean_rssi(),
            prr: counters.prr(),
        })
        .collect()
}

/// Grouping key of the link-level statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkKey {
    pub radio: Radio,
    pub channel: u16,
    pub source: u32,
    pub destination: u32,
}

impl LinkKey {
    /// The same link in the opposite direction.
    pub fn reversed(&self) -> Self {
        LinkKey {
            source: self.destination,
            destination: self.source,
            ..*self
        }
    }
}

/// Receptions over one directed link.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinkStats {
    pub rx_count: u64,
    pub mean_rssi: Option<f64>,
}

/// A link with `source < destination` and its reverse direction.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPair {
    pub key: LinkKey,
    pub forward: LinkStats,
    /// Stats of `key.reversed()`, absent when no frame went that way.
    pub back: Option<LinkStats>,
}

impl LinkPair {
    /// Reverse-direction stats, with zero receptions and no RSSI when absent.
    pub fn back_or_default(&self) -> LinkStats {
        self.back.unwrap_or_default()
    }
}

/// Group receptions by directed link and join each forward link with its reverse.
///
/// Only links where `source < destination` are emitted, so each node pair
/// appears once per radio channel. Transmissions carry no destination and do
/// not contribute. Results are ordered by key.
pub fn link_stats(table: &RecordTable) -> Vec<LinkPair> {
    let mut groups: BTreeMap<LinkKey, Counters> = BTreeMap::new();
    for record in table {
        let Some(destination) = record.destination() else {
            continue;
        };
        let key = LinkKey {
            radio: record.radio,
            channel: record.channel,
            source: record.source,
            destination,
        };
        groups.entry(key).or_default().add(record);
    }

    let to_stats = |counters: &Counters| LinkStats {
        rx_count: counters.rx_count,
        mean_rssi: counters.mean_rssi(),
    };

    groups
        .iter()
        .filter(|(key, _)| key.source < key.destination)
        .map(|(key, counters)| LinkPair {
            key: *key,
            forward: to_stats(counters),
            back: groups.get(&key.reversed()).map(to_stats),
        })
        .collect()
}
