//! On-disk cache of a parsed record table.
//!
//! Parsing a long simulation log dominates the run time, so the table is
//! written next to the input after the first run and loaded from there on
//! subsequent runs. There is no locking: two runs against the same
//! directory may race on the cache file.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::types::{Record, RecordTable};

/// File name of the cache inside the run directory.
pub const CACHE_FILE_NAME: &str = "df.json";

/// Version written into every cache document.
const CACHE_VERSION: u32 = 1;

/// Error type for cache failures.
#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    Decode(serde_json::Error),
    UnsupportedVersion(u32),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Io(err) => write!(f, "cache I/O error: {}", err),
            CacheError::Decode(err) => write!(f, "invalid cache content: {}", err),
            CacheError::UnsupportedVersion(version) => {
                write!(f, "unsupported cache version {} (expected {})", version, CACHE_VERSION)
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err),
            CacheError::Decode(err) => Some(err),
            CacheError::UnsupportedVersion(_) => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(value: std::io::Error) -> Self {
        CacheError::Io(value)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        CacheError::Decode(value)
    }
}

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    version: u32,
    records: &'a [Record],
}

#[derive(Deserialize)]
struct CacheDocument {
    version: u32,
    records: Vec<Record>,
}

/// Derive the cache path from the run directory.
pub fn cache_path_for_dir(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILE_NAME)
}

/// Load a cached table.
///
/// # Returns
///
/// `Ok(None)` if no cache file exists, the table if one was read.
pub fn load_cached_table(path: &Path) -> Result<Option<RecordTable>, CacheError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let document: CacheDocument = serde_json::from_reader(BufReader::new(file))?;
    if document.version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion(document.version));
    }
    Ok(Some(RecordTable::from_records(document.records)))
}

/// Write a table to the cache, replacing any previous content.
pub fn store_table(path: &Path, table: &RecordTable) -> Result<(), CacheError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let document = CacheDocumentRef {
        version: CACHE_VERSION,
        records: table.records(),
    };
    serde_json::to_writer(&mut writer, &document)?;
    writer.flush()?;
    Ok(())
}
