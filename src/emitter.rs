//! Assembles decoded record fields into `DeletionEvent` values and renders
//! the long and short message strings used by the output layer.

use crate::drive::Drive;
use crate::types::{
    Anomaly, DecoderConfig, DeletionEvent, SourceFormat, Timestamp, TimestampKind,
    DEFAULT_MAX_SHORT_MESSAGE_LENGTH,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: &str = "...";

/// Field values produced by a codec for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFields {
    pub original_path: String,
    pub file_size: u64,
    pub deleted_at: Timestamp,
    pub drive: Drive,
    pub record_index: Option<u32>,
    pub source_format: SourceFormat,
    pub anomalies: Vec<Anomaly>,
}

/// Builds events and their display strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventEmitter {
    max_short_message_length: usize,
}

impl EventEmitter {
    pub fn new(max_short_message_length: usize) -> Self {
        Self { max_short_message_length }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.max_short_message_length)
    }

    /// Turn decoded fields into an immutable event
    pub fn emit(&self, fields: DecodedFields) -> DeletionEvent {
        DeletionEvent {
            original_path: fields.original_path,
            file_size: fields.file_size,
            deleted_at: fields.deleted_at,
            timestamp_kind: TimestampKind::DeletedTime,
            drive: fields.drive,
            record_index: fields.record_index,
            source_format: fields.source_format,
            anomalies: fields.anomalies,
        }
    }

    /// Long form: `"DC<index> -> <path> (from drive: <drive>)"`, the `DC` prefix
    /// only for INFO2 records
    pub fn message(&self, event: &DeletionEvent) -> String {
        match event.record_index {
            Some(index) => format!(
                "DC{} -> {} (from drive: {})",
                index, event.original_path, event.drive
            ),
            None => format!("{} (from drive: {})", event.original_path, event.drive),
        }
    }

    /// Short form: `"Deleted file: <path>"`, cut to the configured width
    pub fn short_message(&self, event: &DeletionEvent) -> String {
        let full = format!("Deleted file: {}", event.original_path);
        truncate_to_width(&full, self.max_short_message_length)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SHORT_MESSAGE_LENGTH)
    }
}

/// Cut `text` so it renders in at most `max_width` columns including the
/// trailing ellipsis. Cuts only between grapheme clusters.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width < ELLIPSIS.len() {
        return ELLIPSIS[..max_width].to_string();
    }

    let budget = max_width - ELLIPSIS.len();
    let mut width = 0;
    let mut truncated = String::with_capacity(max_width);
    for grapheme in text.graphemes(true) {
        let grapheme_width = grapheme.width();
        if width + grapheme_width > budget {
            break;
        }
        width += grapheme_width;
        truncated.push_str(grapheme);
    }
    truncated.push_str(ELLIPSIS);
    truncated
}
