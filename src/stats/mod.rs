//! Aggregation of the record table.
//!
//! - `aggregate`: per-channel and per-link counts, mean RSSI and PRR
//! - `timeseries`: the same metrics bucketed over time for one radio

pub mod aggregate;
pub mod timeseries;

pub use aggregate::{channel_stats, link_stats};
pub use timeseries::time_series;
