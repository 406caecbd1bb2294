//! Chart rendering with plotly.
//!
//! Box plots summarise the channel-level statistics, line plots show the
//! per-channel time series and a scatter plot compares both directions of
//! each link. Every chart is written to a fixed file name inside the output
//! directory.

use plotly::common::{Mode, Title};
use plotly::layout::{Axis, BoxMode, Layout};
use plotly::{BoxPlot, Plot, Scatter};
use std::path::{Path, PathBuf};

use crate::analyzer::types::Radio;
use crate::common::config::{ChartFormat, ReportConfig};
use crate::stats::aggregate::{ChannelStats, LinkPair};
use crate::stats::timeseries::{PivotTable, TimeSeries};

const MINUTE_US: f64 = 60_000_000.0;

/// Error type for chart output failures.
#[derive(Debug)]
pub enum ReportError {
    Io { path: PathBuf, source: std::io::Error },
    /// Static image export failed (kaleido could not render or save the chart).
    Export { path: PathBuf, message: String },
    FormatUnavailable(ChartFormat),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io { path, source } => write!(f, "Failed to write {}: {}", path.display(), source),
            ReportError::Export { path, message } => write!(f, "Failed to export {}: {}", path.display(), message),
            ReportError::FormatUnavailable(format) => {
                write!(f, "Chart format {:?} is not available in this build", format)
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io { source, .. } => Some(source),
            ReportError::Export { .. } | ReportError::FormatUnavailable(_) => None,
        }
    }
}

/// Metric shown by a channel-level box plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Prr,
    Rssi,
}

impl Metric {
    fn name(&self) -> &'static str {
        match self {
            Metric::Prr => "prr",
            Metric::Rssi => "rssi",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Metric::Prr => "PRR",
            Metric::Rssi => "RSSI [dBm]",
        }
    }

    fn value(&self, stats: &ChannelStats) -> Option<f64> {
        match self {
            Metric::Prr => stats.prr,
            Metric::Rssi => stats.mean_rssi,
        }
    }
}

/// Category axis of a channel-level box plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    PerChannel,
    PerSource,
}

impl Grouping {
    fn name(&self) -> &'static str {
        match self {
            Grouping::PerChannel => "perchannel",
            Grouping::PerSource => "persource",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Grouping::PerChannel => "channel",
            Grouping::PerSource => "source",
        }
    }

    fn category(&self, stats: &ChannelStats) -> String {
        match self {
            Grouping::PerChannel => stats.key.channel.to_string(),
            Grouping::PerSource => stats.key.source.to_string(),
        }
    }
}

/// Points of one box plot trace.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSeries {
    pub radio: Radio,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

/// Split channel statistics into one box series per radio.
///
/// Groups whose metric is undefined are left out.
pub fn box_series(stats: &[ChannelStats], metric: Metric, grouping: Grouping) -> Vec<BoxSeries> {
    Radio::ALL
        .iter()
        .map(|&radio| {
            let (categories, values) = stats
                .iter()
                .filter(|s| s.key.radio == radio)
                .filter_map(|s| metric.value(s).map(|v| (grouping.category(s), v)))
                .unzip();
            BoxSeries { radio, categories, values }
        })
        .filter(|series| !series.values.is_empty())
        .collect()
}

/// File stem of a channel-level box plot, e.g. `prr-perchannel`.
pub fn box_chart_stem(metric: Metric, grouping: Grouping) -> String {
    format!("{}-{}", metric.name(), grouping.name())
}

/// File stem of a timeline chart, e.g. `timeline-cc1200-prr`.
pub fn timeline_stem(radio: Radio, metric: Metric) -> String {
    format!("timeline-{}-{}", radio, metric.name())
}

/// File stem of the link symmetry chart, e.g. `links-cc2538-rxcount`.
pub fn link_chart_stem(radio: Radio) -> String {
    format!("links-{}-rxcount", radio)
}

/// Writes charts into one directory with fixed names.
pub struct ReportRenderer {
    out_dir: PathBuf,
    format: ChartFormat,
    width: usize,
    height: usize,
}

impl ReportRenderer {
    pub fn new(out_dir: &Path, config: &ReportConfig) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            format: config.chart_format,
            width: config.chart_width,
            height: config.chart_height,
        }
    }

    /// Path a chart with the given stem is written to.
    pub fn chart_path(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{}.{}", stem, self.format.extension()))
    }

    /// Render the four channel-level box plots.
    pub fn render_channel_stats(&self, stats: &[ChannelStats]) -> Result<Vec<PathBuf>, ReportError> {
        let mut written = Vec::new();
        for metric in [Metric::Prr, Metric::Rssi] {
            for grouping in [Grouping::PerChannel, Grouping::PerSource] {
                written.push(self.render_box_chart(stats, metric, grouping)?);
            }
        }
        Ok(written)
    }

    fn render_box_chart(&self, stats: &[ChannelStats], metric: Metric, grouping: Grouping) -> Result<PathBuf, ReportError> {
        let stem = box_chart_stem(metric, grouping);
        let mut plot = Plot::new();
        for series in box_series(stats, metric, grouping) {
            plot.add_trace(BoxPlot::new_xy(series.categories, series.values).name(series.radio.name()));
        }
        plot.set_layout(
            self.layout(&format!("{} by {}", metric.label(), grouping.label()))
                .box_mode(BoxMode::Group)
                .x_axis(Axis::new().title(Title::new(grouping.label())))
                .y_axis(Axis::new().title(Title::new(metric.label()))),
        );
        self.write(&plot, &stem)
    }

    /// Render the PRR and RSSI timelines of one radio.
    pub fn render_time_series(&self, series: &TimeSeries) -> Result<Vec<PathBuf>, ReportError> {
        let minutes = series.bucket_width_us as f64 / MINUTE_US;
        let mut written = Vec::new();
        for (metric, table) in [(Metric::Prr, series.prr_table()), (Metric::Rssi, series.rssi_table())] {
            let stem = timeline_stem(series.radio, metric);
            let mut plot = Plot::new();
            for (channel, values) in timeline_traces(&table) {
                let x: Vec<f64> = table.bucket_starts_us.iter().map(|&t| t as f64 / MINUTE_US).collect();
                plot.add_trace(Scatter::new(x, values).mode(Mode::LinesMarkers).name(&format!("ch {}", channel)));
            }
            plot.set_layout(
                self.layout(&format!("{} {} per {} min", series.radio, metric.label(), minutes))
                    .x_axis(Axis::new().title(Title::new("time [min]")))
                    .y_axis(Axis::new().title(Title::new(metric.label()))),
            );
            written.push(self.write(&plot, &stem)?);
        }
        Ok(written)
    }

    /// Render forward against reverse reception counts of every link of `radio`.
    pub fn render_link_symmetry(&self, radio: Radio, links: &[LinkPair]) -> Result<PathBuf, ReportError> {
        let (x, y): (Vec<u64>, Vec<u64>) = links
            .iter()
            .filter(|link| link.key.radio == radio)
            .map(|link| (link.forward.rx_count, link.back_or_default().rx_count))
            .unzip();

        let mut plot = Plot::new();
        plot.add_trace(Scatter::new(x, y).mode(Mode::Markers).name(radio.name()));
        plot.set_layout(
            self.layout(&format!("{} link reception counts", radio))
                .x_axis(Axis::new().title(Title::new("rxCount")))
                .y_axis(Axis::new().title(Title::new("rxCountBack"))),
        );
        self.write(&plot, &link_chart_stem(radio))
    }

    fn layout(&self, title: &str) -> Layout {
        Layout::new().title(Title::new(title)).width(self.width).height(self.height)
    }

    fn write(&self, plot: &Plot, stem: &str) -> Result<PathBuf, ReportError> {
        let path = self.chart_path(stem);
        match self.format {
            ChartFormat::Html => {
                std::fs::write(&path, plot.to_html()).map_err(|source| ReportError::Io { path: path.clone(), source })?;
            }
            #[cfg(feature = "pdf")]
            ChartFormat::Pdf => {
                let export_error = |message: String| ReportError::Export { path: path.clone(), message };
                let data = serde_json::to_value(plot).map_err(|e| export_error(e.to_string()))?;
                plotly_kaleido::Kaleido::new()
                    .save(&path, &data, self.format.extension(), self.width, self.height, 1.0)
                    .map_err(|e| export_error(e.to_string()))?;
            }
            #[cfg(not(feature = "pdf"))]
            ChartFormat::Pdf => return Err(ReportError::FormatUnavailable(self.format)),
        }
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// One trace per channel column of a pivot table.
fn timeline_traces(table: &PivotTable) -> Vec<(u16, Vec<Option<f64>>)> {
    table
        .channels
        .iter()
        .filter_map(|&channel| table.column(channel).map(|values| (channel, values)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{Direction, Record, RecordTable};
    use crate::stats::aggregate::{ChannelKey, channel_stats, link_stats};
    use crate::stats::timeseries::time_series;

    fn stats(radio: Radio, channel: u16, source: u32, prr: Option<f64>, mean_rssi: Option<f64>) -> ChannelStats {
        ChannelStats {
            key: ChannelKey { radio, channel, source },
            tx_count: 0,
            rx_count: 0,
            mean_rssi,
            prr,
        }
    }

    fn sample_table() -> RecordTable {
        let mut records = Vec::new();
        for (i, (radio, channel)) in [(Radio::Cc1200, 1), (Radio::Cc1200, 3), (Radio::Cc2538, 26)].into_iter().enumerate() {
            let elapsed_us = i as u64 * 400_000_000;
            records.push(Record {
                elapsed_us,
                asn: i as u64,
                radio,
                channel,
                source: 1,
                direction: Direction::Transmit,
            });
            records.push(Record {
                elapsed_us,
                asn: i as u64,
                radio,
                channel,
                source: 1,
                direction: Direction::Receive { destination: 2, rssi: -70 },
            });
        }
        RecordTable::from_records(records)
    }

    #[test]
    fn test_box_series_splits_radios_and_skips_undefined() {
        let all = vec![
            stats(Radio::Cc1200, 16, 5, Some(0.5), Some(-60.0)),
            stats(Radio::Cc1200, 17, 5, None, Some(-70.0)),
            stats(Radio::Cc1200, 17, 6, Some(1.0), None),
            stats(Radio::Cc2538, 26, 5, Some(0.25), None),
        ];

        let prr = box_series(&all, Metric::Prr, Grouping::PerChannel);
        assert_eq!(prr.len(), 2);
        assert_eq!(prr[0].radio, Radio::Cc1200);
        assert_eq!(prr[0].categories, vec!["16", "17"]);
        assert_eq!(prr[0].values, vec![0.5, 1.0]);
        assert_eq!(prr[1].categories, vec!["26"]);

        let rssi = box_series(&all, Metric::Rssi, Grouping::PerSource);
        assert_eq!(rssi.len(), 1);
        assert_eq!(rssi[0].categories, vec!["5", "5"]);
        assert_eq!(rssi[0].values, vec![-60.0, -70.0]);
    }

    #[test]
    fn test_chart_names() {
        assert_eq!(box_chart_stem(Metric::Prr, Grouping::PerChannel), "prr-perchannel");
        assert_eq!(box_chart_stem(Metric::Rssi, Grouping::PerSource), "rssi-persource");
        assert_eq!(timeline_stem(Radio::Cc1200, Metric::Prr), "timeline-cc1200-prr");
        assert_eq!(timeline_stem(Radio::Cc2538, Metric::Rssi), "timeline-cc2538-rssi");
        assert_eq!(link_chart_stem(Radio::Cc2538), "links-cc2538-rxcount");

        let renderer = ReportRenderer::new(Path::new("run"), &ReportConfig::default());
        assert_eq!(renderer.chart_path("prr-persource"), PathBuf::from("run/prr-persource.html"));
    }

    #[test]
    fn test_renders_html_charts() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let renderer = ReportRenderer::new(dir.path(), &ReportConfig::default());

        let written = renderer.render_channel_stats(&channel_stats(&table)).unwrap();
        assert_eq!(written.len(), 4);

        for radio in Radio::ALL {
            let series = time_series(&table, radio, chrono::Duration::minutes(5));
            written_ok(&renderer.render_time_series(&series).unwrap());
        }
        written_ok(&[renderer.render_link_symmetry(Radio::Cc1200, &link_stats(&table)).unwrap()]);

        for name in [
            "prr-perchannel.html",
            "prr-persource.html",
            "rssi-perchannel.html",
            "rssi-persource.html",
            "timeline-cc1200-prr.html",
            "timeline-cc1200-rssi.html",
            "timeline-cc2538-prr.html",
            "timeline-cc2538-rssi.html",
            "links-cc1200-rxcount.html",
        ] {
            let content = std::fs::read_to_string(dir.path().join(name)).unwrap();
            assert!(content.contains("plotly"), "{name}");
        }
    }

    fn written_ok(paths: &[PathBuf]) {
        for path in paths {
            assert!(path.exists(), "{}", path.display());
        }
    }

    #[test]
    fn test_timeline_traces_follow_channels() {
        let series = time_series(&sample_table(), Radio::Cc1200, chrono::Duration::minutes(5));
        let traces = timeline_traces(&series.prr_table());
        assert_eq!(traces, vec![(1, vec![Some(1.0), None]), (3, vec![None, Some(1.0)])]);
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_pdf_needs_feature() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            chart_format: ChartFormat::Pdf,
            ..ReportConfig::default()
        };
        let renderer = ReportRenderer::new(dir.path(), &config);
        let err = renderer.render_channel_stats(&[]).unwrap_err();
        assert!(matches!(err, ReportError::FormatUnavailable(ChartFormat::Pdf)));
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ReportRenderer::new(&dir.path().join("missing"), &ReportConfig::default());
        let err = renderer.render_link_symmetry(Radio::Cc2538, &[]).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_unwritable_directory_is_reported_for_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            chart_format: ChartFormat::Pdf,
            ..ReportConfig::default()
        };
        let renderer = ReportRenderer::new(&dir.path().join("missing"), &config);
        let err = renderer.render_link_symmetry(Radio::Cc2538, &[]).unwrap_err();
        assert!(matches!(err, ReportError::Export { .. }), "{}", err);
        assert!(err.to_string().starts_with("Failed to export"));
    }
}
