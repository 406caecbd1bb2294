//! Report configuration.

use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the optional configuration inside the run directory.
pub const CONFIG_FILE_NAME: &str = "report.toml";

/// Output format of the rendered charts.
///
/// The report's charts are meant as PDF files. HTML is the default because
/// PDF export needs the `pdf` feature and its kaleido binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Self-contained plotly HTML page.
    #[default]
    Html,
    /// Static PDF, requires the `pdf` feature.
    Pdf,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Html => "html",
            ChartFormat::Pdf => "pdf",
        }
    }
}

/// Settings for parsing, aggregation and rendering.
///
/// Every key is optional in `report.toml`:
///
/// ```toml
/// bucket-minutes = 5
/// progress-interval-secs = 60
/// use-cache = true
/// chart-format = "html"
/// chart-width = 1000
/// chart-height = 600
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Width of a time-series bucket.
    pub bucket_minutes: u32,
    /// Simulated time between two progress messages while parsing.
    pub progress_interval_secs: u32,
    /// Load the parsed table from, and store it to, the cache file.
    pub use_cache: bool,
    pub chart_format: ChartFormat,
    pub chart_width: usize,
    pub chart_height: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: 5,
            progress_interval_secs: 60,
            use_cache: true,
            chart_format: ChartFormat::Html,
            chart_width: 1000,
            chart_height: 600,
        }
    }
}

impl ReportConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(ReportConfig)` if the file was successfully loaded and parsed
    /// * `Err(String)` with a descriptive error message otherwise
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path).map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: ReportConfig = toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `report.toml` from the run directory, or fall back to defaults when it does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self, String> {
        let path = Self::config_path_for_dir(dir);
        if path.exists() {
            log::info!("Using configuration from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Derive the config path from the run directory.
    pub fn config_path_for_dir(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    fn validate(&self) -> Result<(), String> {
        if self.bucket_minutes == 0 {
            return Err("bucket-minutes must be at least 1".to_string());
        }
        if self.progress_interval_secs == 0 {
            return Err("progress-interval-secs must be at least 1".to_string());
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            return Err("chart-width and chart-height must be positive".to_string());
        }
        Ok(())
    }

    pub fn bucket_width(&self) -> Duration {
        Duration::minutes(i64::from(self.bucket_minutes))
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::seconds(i64::from(self.progress_interval_secs))
    }
}
