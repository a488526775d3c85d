//! Output formatting functionality for different export formats.

use crate::datetime::{convert_to_timezone, format_timestamp_human};
use crate::error::Result;
use crate::types::{Anomaly, Timestamp, TimelineEntry};
use chrono::Offset;
use chrono_tz::Tz;
use std::io::{BufWriter, Write};

/// Supported output formats
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with detailed information
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
    /// Timeline format with ascending chronological order
    Timeline,
}

/// Handles output formatting and writing
pub struct OutputWriter;

impl OutputWriter {
    /// Write entries in the specified format with timezone conversion
    pub fn write_entries(
        entries: Vec<TimelineEntry>,
        format: OutputFormat,
        writer: Box<dyn Write>,
        timezone: Tz,
    ) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        match format {
            OutputFormat::Human => Self::write_human(&entries, &mut writer, timezone)?,
            OutputFormat::Json => Self::write_json(&entries, &mut writer)?,
            OutputFormat::Csv => Self::write_csv(&entries, &mut writer, timezone)?,
            OutputFormat::Timeline => Self::write_timeline(entries, &mut writer, timezone)?,
        }
        writer.flush()?;
        Ok(())
    }

    /// Write entries in ascending deletion time order, one CSV line each.
    /// Entries with the same time keep their decode order
    pub fn write_timeline<W: Write>(mut entries: Vec<TimelineEntry>, writer: &mut W, timezone: Tz) -> Result<()> {
        log::info!("Sorting {} deletion events chronologically", entries.len());
        entries.sort_by_key(|entry| entry.event.deleted_at);

        for entry in entries {
            let event = &entry.event;
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                Self::format_timeline_timestamp(&event.deleted_at, timezone),
                event.timestamp_kind.display_name(),
                event.source_short(),
                event.file_size,
                Self::escape_csv_field(&entry.message),
                Self::escape_csv_field(&entry.artifact)
            )?;
        }
        Ok(())
    }

    /// Escape a field for CSV output with proper quoting
    fn escape_csv_field(field: &str) -> String {
        format!("\"{}\"", field.replace('"', "\"\""))
    }

    /// Format timestamp for timeline output (Wed 2024-11-02 12:00:00 UTC+8 format)
    fn format_timeline_timestamp(timestamp: &Timestamp, timezone: Tz) -> String {
        let Some(utc_dt) = timestamp.as_datetime() else {
            return "Not set".to_string();
        };
        let converted = convert_to_timezone(utc_dt, timezone);

        let offset_str = if timezone == Tz::UTC {
            "UTC".to_string()
        } else {
            let hours = converted.offset().fix().local_minus_utc() / 3600;
            if hours >= 0 {
                format!("UTC+{}", hours)
            } else {
                format!("UTC{}", hours)
            }
        };

        format!("{} {}", converted.format("%a %Y-%m-%d %H:%M:%S"), offset_str)
    }

    /// Write entries in human-readable format with timezone conversion
    fn write_human<W: Write>(entries: &[TimelineEntry], writer: &mut W, timezone: Tz) -> Result<()> {
        for entry in entries {
            let event = &entry.event;
            writeln!(writer, "{}", entry.message)?;
            writeln!(writer, "  {:<17} {}", "Artifact:", entry.artifact)?;
            writeln!(
                writer,
                "  {:<17} {}",
                "Deleted:",
                format_timestamp_human(&event.deleted_at, timezone)
            )?;
            writeln!(writer, "  {:<17} {} bytes", "Size:", event.file_size)?;
            writeln!(writer, "  {:<17} {}", "Drive:", event.drive)?;
            if let Some(index) = event.record_index {
                writeln!(writer, "  {:<17} {}", "Record:", index)?;
            }
            writeln!(writer, "  {:<17} {}", "Format:", event.source_format.display_name())?;

            if !event.anomalies.is_empty() {
                let anomalies: Vec<String> = event.anomalies.iter().map(Self::describe_anomaly).collect();
                writeln!(writer, "  {:<17} {}", "Anomalies:", anomalies.join("; "))?;
            }

            writeln!(writer)?;
        }

        Ok(())
    }

    fn describe_anomaly(anomaly: &Anomaly) -> String {
        match anomaly {
            Anomaly::EncodingError { field } => format!("invalid text in {:?} replaced", field),
            Anomaly::DriveOutOfRange(code) => format!("drive code {} out of range", code),
        }
    }

    /// Write entries in JSON format (timestamps remain in UTC for programmatic use)
    fn write_json<W: Write>(entries: &[TimelineEntry], writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, entries)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write entries in CSV format with timezone conversion
    fn write_csv<W: Write>(entries: &[TimelineEntry], writer: &mut W, timezone: Tz) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "artifact",
            "deleted",
            "timestamp_desc",
            "original_path",
            "file_size",
            "drive",
            "record_index",
            "source_format",
            "data_type",
            "source",
            "message",
            "short_message",
        ])?;

        for entry in entries {
            let event = &entry.event;
            csv_writer.write_record([
                entry.artifact.clone(),
                format_timestamp_human(&event.deleted_at, timezone),
                event.timestamp_kind.display_name().to_string(),
                event.original_path.clone(),
                event.file_size.to_string(),
                event.drive.to_string(),
                event.record_index.map(|i| i.to_string()).unwrap_or_default(),
                event.source_format.display_name().to_string(),
                event.source_format.data_type().to_string(),
                event.source_short().to_string(),
                entry.message.clone(),
                entry.short_message.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Create appropriate writer based on output option
pub fn create_writer(output_file: Option<String>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match output_file {
        Some(output_file) if output_file != "-" => Box::new(std::fs::File::create(output_file)?),
        _ => Box::new(std::io::stdout()),
    };

    Ok(writer)
}
