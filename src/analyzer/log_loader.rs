//! Sequential reader for the simulation log file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Buffer size for reading log files (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Log file loader returning one trimmed, non-empty line at a time.
pub struct LogLoader {
    reader: BufReader<File>,
    line_buffer: String,
    lines_read: u64,
}

impl LogLoader {
    /// Open a log file for reading.
    ///
    /// # Returns
    ///
    /// `Ok(LogLoader)` if the file opens successfully, `Err` otherwise.
    pub fn new(path: &Path) -> Result<Self, std::io::Error> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(BUFFER_SIZE, file);

        Ok(Self {
            reader,
            line_buffer: String::with_capacity(512),
            lines_read: 0,
        })
    }

    /// Read the next line from the log file.
    ///
    /// Line terminators are stripped and empty lines skipped.
    ///
    /// # Returns
    ///
    /// `Ok(Some(line))` if a line is available, `Ok(None)` at EOF.
    pub fn next_line(&mut self) -> Result<Option<&str>, std::io::Error> {
        loop {
            self.line_buffer.clear();
            if self.reader.read_line(&mut self.line_buffer)? == 0 {
                return Ok(None);
            }
            self.lines_read += 1;

            let len = self.line_buffer.trim_end_matches(['\n', '\r']).len();
            if len > 0 {
                self.line_buffer.truncate(len);
                return Ok(Some(self.line_buffer.as_str()));
            }
        }
    }

    /// Number of raw lines consumed so far, blank lines included.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}
