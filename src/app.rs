//! Main application logic and orchestration.

use crate::{
    cli::Config,
    datetime::timestamp_in_range,
    error::{Error, Result},
    output::{create_writer, OutputWriter},
    parser::RecycleBinParser,
    source::Artifact,
    types::TimelineEntry,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

/// Main application runner
pub struct App {
    config: Config,
    parser: RecycleBinParser,
}

impl App {
    /// Create a new application instance with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let parser = RecycleBinParser::with_config(config.decoder.clone())?;
        Ok(Self { config, parser })
    }

    /// Run the application with the configured parameters
    pub fn run(self) -> Result<()> {
        let artifacts = self.config.collect_artifacts()?;
        let entries = self.decode_artifacts(artifacts)?;
        let filtered = self.apply_filters(entries);

        let writer = create_writer(self.config.output.clone())?;
        OutputWriter::write_entries(filtered, self.config.format, writer, self.config.timezone)
    }

    /// Decode every artifact in parallel. Entries keep input order.
    ///
    /// An artifact that fails to decode is reported and skipped; the run only
    /// fails when nothing could be decoded at all.
    pub fn decode_artifacts(&self, artifacts: Vec<Artifact>) -> Result<Vec<TimelineEntry>> {
        let total = artifacts.len();
        let progress = if total > 1 {
            eprintln!("🔄 Decoding {} Recycle Bin artifacts...", total);
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb.set_message("Decoding artifacts");
            Some(pb)
        } else {
            None
        };

        let results: Vec<(String, Result<Vec<TimelineEntry>>)> = artifacts
            .into_par_iter()
            .map(|artifact| {
                let name = artifact.name.clone();
                let result = Self::decode_artifact(&self.parser, artifact);
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                (name, result)
            })
            .collect();

        if let Some(pb) = &progress {
            pb.finish_with_message("Decoding complete");
        }

        let mut entries = Vec::new();
        let mut failures = 0;
        for (name, result) in results {
            match result {
                Ok(decoded) => {
                    log::debug!("Decoded {} events from {}", decoded.len(), name);
                    entries.extend(decoded);
                }
                Err(err) if err.is_decode_error() => {
                    log::warn!("Skipping malformed artifact {}: {}", name, err);
                    failures += 1;
                }
                Err(err) => {
                    log::error!("Could not read {}: {}", name, err);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            eprintln!("⚠️  {} of {} artifacts could not be decoded", failures, total);
            if failures == total {
                return Err(Error::Generic(format!(
                    "None of the {} artifacts could be decoded",
                    total
                )));
            }
        }

        eprintln!("🎉 Decoded {} deletion events", entries.len());
        Ok(entries)
    }

    /// Open one artifact and decode it. The mapping is released on return
    fn decode_artifact(parser: &RecycleBinParser, artifact: Artifact) -> Result<Vec<TimelineEntry>> {
        let name = artifact.name.clone();
        let hint = artifact.hint;
        let source = artifact.open()?;
        parser.parse_entries(&name, &source, hint)
    }

    /// Apply command-line filters to the entries
    fn apply_filters(&self, entries: Vec<TimelineEntry>) -> Vec<TimelineEntry> {
        entries
            .into_iter()
            .filter(|entry| self.entry_passes_filters(entry))
            .collect()
    }

    /// Check if a single entry passes all filters
    fn entry_passes_filters(&self, entry: &TimelineEntry) -> bool {
        if let Some(regex) = &self.config.filter_regex {
            if !regex.is_match(&entry.event.original_path) {
                return false;
            }
        }

        timestamp_in_range(
            &entry.event.deleted_at,
            &self.config.after_date,
            &self.config.before_date,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use std::path::Path;

    fn dollar_i(filetime: u64, path: &str) -> Vec<u8> {
        let mut units: Vec<u16> = path.encode_utf16().collect();
        units.push(0);

        let mut data = Vec::new();
        data.extend_from_slice(&2u64.to_le_bytes());
        data.extend_from_slice(&4096u64.to_le_bytes());
        data.extend_from_slice(&filetime.to_le_bytes());
        data.extend_from_slice(&((units.len() * 2) as u32).to_le_bytes());
        for unit in units {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        data
    }

    fn app(dir: &Path, extra: &[&str]) -> App {
        let dir_arg = dir.display().to_string();
        let mut argv = vec!["recbin", dir_arg.as_str()];
        argv.extend_from_slice(extra);
        App::new(Config::from_args(Args::parse_from(argv)).unwrap()).unwrap()
    }

    fn evidence_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("$IAAAAAA.zip"),
            dollar_i(129_760_589_986_330_000, "C:\\Users\\nfury\\StarFury.zip"),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("$IBBBBBB.jpg"),
            dollar_i(131_117_098_656_180_000, "C:\\Users\\random\\bunnies.jpg"),
        )
        .unwrap();
        // Too short to hold a header
        std::fs::write(dir.path().join("$ICCCCCC.txt"), [2u8, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4]).unwrap();
        dir
    }

    #[test]
    fn test_decode_skips_broken_artifacts() {
        let dir = evidence_dir();
        let app = app(dir.path(), &[]);
        let artifacts = app.config.collect_artifacts().unwrap();
        assert_eq!(artifacts.len(), 3);

        let entries = app.decode_artifacts(artifacts).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event.original_path, "C:\\Users\\nfury\\StarFury.zip");
        assert_eq!(entries[1].event.original_path, "C:\\Users\\random\\bunnies.jpg");
    }

    #[test]
    fn test_all_artifacts_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("$IDDDDDD"), [9u8; 40]).unwrap();
        let app = app(dir.path(), &[]);
        let artifacts = app.config.collect_artifacts().unwrap();
        assert!(app.decode_artifacts(artifacts).is_err());
    }

    #[test]
    fn test_unreadable_artifact_is_skipped() {
        let dir = evidence_dir();
        let app = app(dir.path(), &[]);
        let mut artifacts = app.config.collect_artifacts().unwrap();
        artifacts.push(Artifact::from_path(&dir.path().join("$IGONE00.txt")));

        let entries = app.decode_artifacts(artifacts).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_filters() {
        let dir = evidence_dir();

        let app_regex = app(dir.path(), &["--filter", "BUNNIES"]);
        let entries = app_regex
            .decode_artifacts(app_regex.config.collect_artifacts().unwrap())
            .unwrap();
        let kept = app_regex.apply_filters(entries);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].event.original_path.ends_with("bunnies.jpg"));

        let app_dates = app(dir.path(), &["--before", "2013-01-01"]);
        let entries = app_dates
            .decode_artifacts(app_dates.config.collect_artifacts().unwrap())
            .unwrap();
        let kept = app_dates.apply_filters(entries);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].event.original_path.ends_with("StarFury.zip"));
    }

    #[test]
    fn test_run_writes_output() {
        let dir = evidence_dir();
        let out_dir = tempfile::tempdir().unwrap();
        let out_path = out_dir.path().join("timeline.csv");
        let out_arg = out_path.display().to_string();

        app(dir.path(), &["--format", "timeline", "--output", &out_arg])
            .run()
            .unwrap();

        let written = std::fs::read_to_string(&out_path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Mon 2012-03-12 20:49:58 UTC,"));
        assert!(lines[1].contains("bunnies.jpg (from drive: UNKNOWN)"));
    }
}
