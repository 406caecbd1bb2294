use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::path::{Path, PathBuf};

use crate::analyzer::cache::{cache_path_for_dir, load_cached_table, store_table};
use crate::analyzer::{Radio, RecordTable, parse_log_file};
use crate::common::ReportConfig;
use crate::report::ReportRenderer;
use crate::stats::{channel_stats, link_stats, time_series};

mod analyzer;
mod common;
mod report;
mod stats;

/// Packet reception and RSSI report for a dual-radio TSCH run.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Run directory containing `logs/log.txt`; charts are written here.
    dir: PathBuf,
}

/// Location of the log inside a run directory.
fn log_path_for_dir(dir: &Path) -> PathBuf {
    dir.join("logs").join("log.txt")
}

/// Load the record table from the cache, or parse the log and refresh the cache.
fn load_table(dir: &Path, config: &ReportConfig) -> anyhow::Result<RecordTable> {
    let cache_path = cache_path_for_dir(dir);
    if config.use_cache {
        if let Some(table) =
            load_cached_table(&cache_path).with_context(|| format!("Failed to load cache {}", cache_path.display()))?
        {
            info!("Loaded {} records from {}", table.len(), cache_path.display());
            return Ok(table);
        }
    }

    let log_path = log_path_for_dir(dir);
    info!("Processing {}", log_path.display());
    let table = parse_log_file(&log_path, config.progress_interval())
        .with_context(|| format!("Failed to read log file {}", log_path.display()))?;

    if config.use_cache {
        store_table(&cache_path, &table).with_context(|| format!("Failed to write cache {}", cache_path.display()))?;
        info!("Cached {} records in {}", table.len(), cache_path.display());
    }
    Ok(table)
}

/// Run the whole report for one directory and return the written charts.
fn run(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let config = ReportConfig::load_or_default(dir).map_err(anyhow::Error::msg)?;
    let table = load_table(dir, &config)?;
    if table.is_empty() {
        log::warn!("No TSCH frame reports found for {}", dir.display());
    }

    let stats = channel_stats(&table);
    for s in &stats {
        log::debug!(
            "{} ch {} src {}: tx {}, rx {}, prr {:?}, rssi {:?}",
            s.key.radio,
            s.key.channel,
            s.key.source,
            s.tx_count,
            s.rx_count,
            s.prr,
            s.mean_rssi
        );
    }
    let links = link_stats(&table);
    let one_way = links.iter().filter(|link| link.back.is_none()).count();
    info!("{} channel groups, {} links ({} without reverse traffic)", stats.len(), links.len(), one_way);

    let renderer = ReportRenderer::new(dir, &config);
    let mut written = renderer.render_channel_stats(&stats)?;
    for radio in Radio::ALL {
        let series = time_series(&table, radio, config.bucket_width());
        if series.is_empty() {
            info!("{}: no records", radio);
        } else {
            info!("{}: {} buckets over {} channels", radio, series.rows.len(), series.channels.len());
        }
        written.extend(renderer.render_time_series(&series)?);
        written.push(renderer.render_link_symmetry(radio, &links)?);
    }

    info!("Wrote {} charts to {}", written.len(), dir.display());
    Ok(written)
}

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("tsch_prr_report"), LevelFilter::Debug)
        .init();

    let args = Args::parse();
    run(&args.dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_LOG: &str = "1000000\tID:5\tTSCH: {asn-0.a link-10-5-0-3 ch-16} bc-0-0 20 tx\n\
                               1050000\tID:7\tTSCH: {asn-0.a link-10-5-0-3 ch-16} bc-0-0 20 rx 20 rssi -60, edr 1\n";

    fn run_dir(log: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("logs")).unwrap();
        std::fs::write(log_path_for_dir(dir.path()), log).unwrap();
        dir
    }

    #[test]
    fn test_run_writes_all_charts_and_cache() {
        let dir = run_dir(EXAMPLE_LOG);
        let written = run(dir.path()).unwrap();
        assert_eq!(written.len(), 10);
        for path in &written {
            assert!(path.exists(), "{}", path.display());
        }
        assert!(dir.path().join("timeline-cc1200-prr.html").exists());
        assert!(dir.path().join("rssi-persource.html").exists());
        assert!(cache_path_for_dir(dir.path()).exists());
    }

    #[test]
    fn test_second_run_uses_cache() {
        let dir = run_dir(EXAMPLE_LOG);
        let config = ReportConfig::default();
        let parsed = load_table(dir.path(), &config).unwrap();
        assert_eq!(parsed.len(), 2);

        std::fs::remove_file(log_path_for_dir(dir.path())).unwrap();
        let cached = load_table(dir.path(), &config).unwrap();
        assert_eq!(cached, parsed);
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let dir = run_dir(EXAMPLE_LOG);
        std::fs::write(ReportConfig::config_path_for_dir(dir.path()), "use-cache = false\n").unwrap();
        run(dir.path()).unwrap();
        assert!(!cache_path_for_dir(dir.path()).exists());
    }

    #[test]
    fn test_missing_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read log file"));
    }
}
