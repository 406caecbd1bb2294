//! Type definitions specific to the analyzer module.

use serde::{Deserialize, Serialize};

/// The two radios of a dual-radio node.
///
/// Selected by the third field of the `link-` descriptor: `0` is the
/// sub-GHz CC1200, anything else the 2.4 GHz CC2538.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Radio {
    Cc1200,
    Cc2538,
}

impl Radio {
    pub const ALL: [Radio; 2] = [Radio::Cc1200, Radio::Cc2538];

    /// Map the encoded radio bit of a link descriptor to a radio.
    pub fn from_link_bit(bit: &str) -> Self {
        if bit == "0" { Radio::Cc1200 } else { Radio::Cc2538 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Radio::Cc1200 => "cc1200",
            Radio::Cc2538 => "cc2538",
        }
    }
}

impl std::fmt::Display for Radio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed-format prefix of every input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine<'a> {
    /// Raw timestamp in microseconds.
    pub timestamp: u64,
    /// Node that emitted the line.
    pub node_id: u32,
    pub payload: &'a str,
}

/// Fields shared by transmit and receive payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHeader {
    /// Low word of the absolute slot number.
    pub asn: u64,
    pub radio: Radio,
    pub channel: u16,
}

/// Classified TSCH payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    /// Frame sent by the logging node.
    Transmit(SlotHeader),
    /// Frame received by the logging node from `source`.
    Receive { header: SlotHeader, source: u32, rssi: i32 },
}

impl RadioEvent {
    pub fn header(&self) -> &SlotHeader {
        match self {
            RadioEvent::Transmit(header) => header,
            RadioEvent::Receive { header, .. } => header,
        }
    }
}

/// Direction of a record, relative to the node that logged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Direction {
    Transmit,
    Receive { destination: u32, rssi: i32 },
}

/// One row of the record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Microseconds since the first timestamp of the log.
    pub elapsed_us: u64,
    pub asn: u64,
    pub radio: Radio,
    pub channel: u16,
    /// Sending node: the logging node for a transmit, the parsed sender for a receive.
    pub source: u32,
    pub direction: Direction,
}

impl Record {
    pub fn is_tx(&self) -> bool {
        matches!(self.direction, Direction::Transmit)
    }

    pub fn destination(&self) -> Option<u32> {
        match self.direction {
            Direction::Transmit => None,
            Direction::Receive { destination, .. } => Some(destination),
        }
    }

    pub fn rssi(&self) -> Option<i32> {
        match self.direction {
            Direction::Transmit => None,
            Direction::Receive { rssi, .. } => Some(rssi),
        }
    }
}

/// All records of one log, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Records of a single radio, in log order.
    pub fn for_radio(&self, radio: Radio) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.radio == radio)
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
