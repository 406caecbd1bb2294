//! Analyzer module for turning a TSCH simulation log into a record table.
//!
//! Provides functionality for:
//! - Splitting raw lines and classifying TSCH frame payloads
//! - Building the time-indexed record table
//! - Caching the parsed table next to the input

pub mod cache;
pub mod log_loader;
pub mod log_parser;
pub mod table;
pub mod types;

pub use table::parse_log_file;
pub use types::{Radio, RecordTable};
