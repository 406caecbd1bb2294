//! Parse individual log lines and extract structured `RadioEvent` data.
//!
//! Every input line carries a fixed prefix:
//!
//! ```text
//! <timestamp us>\tID:<node id>\t<payload>
//! ```
//!
//! Only payloads emitted by the TSCH layer for a transmitted or received
//! frame are classified; all other payloads are ignored.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::types::{LogLine, Radio, RadioEvent, SlotHeader};

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\tID:(\d+)\t(.*)$").expect("valid line pattern"));

// Shared by both frame patterns: asn, link descriptor and channel.
const SLOT_PREFIX: &str = r"^TSCH: \{asn-([a-f\d]+).([a-f\d]+) link-(\d+)-(\d+)-(\d+)-(\d+) [\s\d-]*ch-(\d+)\} bc-([01])-0 (\d*)";

static TX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("{SLOT_PREFIX} tx")).expect("valid tx pattern"));

static RX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"{SLOT_PREFIX} rx (\d*) rssi ([-\d]*),.* edr ([-\d]*)")).expect("valid rx pattern"));

/// Split a raw line into timestamp, node ID and payload.
///
/// Returns `None` when the line does not follow the fixed prefix format or
/// when one of the numbers does not fit its type.
pub fn parse_line(line: &str) -> Option<LogLine<'_>> {
    let caps = LINE_RE.captures(line)?;
    let timestamp = caps.get(1)?.as_str().parse().ok()?;
    let node_id = caps.get(2)?.as_str().parse().ok()?;
    let payload = caps.get(3)?.as_str();
    Some(LogLine { timestamp, node_id, payload })
}

/// Classify a payload as a received or transmitted frame.
///
/// The receive pattern is tried first. Payloads matching neither pattern,
/// including every log line not produced by the TSCH layer, yield `None`.
///
/// # Payload Formats
///
/// ```text
/// TSCH: {asn-0.a link-10-5-0-3 ch-16} bc-0-0 20 tx
/// TSCH: {asn-0.a link-10-5-0-3 ch-16} bc-0-0 20 rx 20 rssi -60, edr 1
/// ```
pub fn classify_payload(payload: &str) -> Option<RadioEvent> {
    if let Some(caps) = RX_RE.captures(payload) {
        let header = parse_slot_header(&caps)?;
        let source = caps.get(10)?.as_str().parse().ok()?;
        let rssi = caps.get(11)?.as_str().parse().ok()?;
        return Some(RadioEvent::Receive { header, source, rssi });
    }

    let caps = TX_RE.captures(payload)?;
    parse_slot_header(&caps).map(RadioEvent::Transmit)
}

/// Extract the fields shared by both frame patterns.
fn parse_slot_header(caps: &Captures<'_>) -> Option<SlotHeader> {
    // The high word of the asn is ignored. An asn low word wider than 64 bits
    // or a channel above u16::MAX does not fit the record and drops the line.
    let asn = u64::from_str_radix(caps.get(2)?.as_str(), 16).ok()?;
    let radio = Radio::from_link_bit(caps.get(5)?.as_str());
    let channel = caps.get(7)?.as_str().parse().ok()?;
    Some(SlotHeader { asn, radio, channel })
}
