//! Core data types for decoded Recycle Bin records.

use crate::drive::Drive;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk layout a record was decoded from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceFormat {
    /// `$I` file, Vista through early Windows 10
    SingleRecordV1,
    /// `$I` file, Windows 10 and later
    SingleRecordV2,
    /// Legacy `INFO2` catalog
    Catalog,
}

impl SourceFormat {
    /// Get the display name for the source format
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceFormat::SingleRecordV1 => "SINGLE_RECORD_V1",
            SourceFormat::SingleRecordV2 => "SINGLE_RECORD_V2",
            SourceFormat::Catalog => "CATALOG",
        }
    }

    /// Key used by downstream message catalogs
    pub fn data_type(&self) -> &'static str {
        match self {
            SourceFormat::SingleRecordV1 | SourceFormat::SingleRecordV2 => {
                "windows:metadata:deleted_item"
            }
            SourceFormat::Catalog => "windows:metadata:deleted_item:info2",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Meaning of the event timestamp
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampKind {
    DeletedTime,
}

impl TimestampKind {
    /// Get the display name for the timestamp kind
    pub fn display_name(&self) -> &'static str {
        match self {
            TimestampKind::DeletedTime => "Content Deletion Time",
        }
    }
}

/// Point in time at microsecond resolution, or the unset sentinel.
///
/// `Unset` sorts before every real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum Timestamp {
    Unset,
    At(DateTime<Utc>),
}

impl Timestamp {
    pub fn is_set(&self) -> bool {
        matches!(self, Timestamp::At(_))
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::At(dt) => Some(*dt),
            Timestamp::Unset => None,
        }
    }
}

impl From<Option<DateTime<Utc>>> for Timestamp {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map(Timestamp::At).unwrap_or(Timestamp::Unset)
    }
}

impl From<Timestamp> for Option<DateTime<Utc>> {
    fn from(value: Timestamp) -> Self {
        value.as_datetime()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.6f")),
            Timestamp::Unset => f.write_str("Not set"),
        }
    }
}

/// Which text field an encoding anomaly was found in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    /// UTF-16 path of a `$I` file or the wide INFO2 block
    Utf16Path,
    /// Code page path of an INFO2 record
    CodepagePath,
}

/// Non-fatal problem absorbed while decoding a record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    /// Invalid text was replaced with U+FFFD
    EncodingError { field: TextField },
    /// Drive code outside 0..=25, drive resolved to UNKNOWN
    DriveOutOfRange(i64),
}

/// A single deletion event decoded from a Recycle Bin artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionEvent {
    /// Full path of the item before it was deleted
    pub original_path: String,
    /// Size of the deleted item in bytes
    pub file_size: u64,
    /// When the item was moved to the Recycle Bin
    pub deleted_at: Timestamp,
    pub timestamp_kind: TimestampKind,
    /// Drive letter the item was deleted from
    pub drive: Drive,
    /// INFO2 record index, absent for `$I` files
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub record_index: Option<u32>,
    pub source_format: SourceFormat,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub anomalies: Vec<Anomaly>,
}

impl DeletionEvent {
    /// Long source description
    pub fn source_long(&self) -> &'static str {
        "Recycle Bin"
    }

    /// Short source tag
    pub fn source_short(&self) -> &'static str {
        "RECBIN"
    }
}

/// A decoded event together with where it came from and its rendered messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Artifact the event was decoded from
    pub artifact: String,
    #[serde(flatten)]
    pub event: DeletionEvent,
    /// Long message form
    pub message: String,
    /// Short message form
    pub short_message: String,
}

/// Default width of the short message before truncation
pub const DEFAULT_MAX_SHORT_MESSAGE_LENGTH: usize = 80;

/// Narrowest short message that still fits the "..." marker
pub const MIN_SHORT_MESSAGE_LENGTH: usize = 3;

/// Default legacy code page for INFO2 paths
pub const DEFAULT_CODEPAGE: u16 = 1252;

/// Configuration for decoding behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Short messages wider than this are truncated with a trailing "..."
    pub max_short_message_length: usize,
    /// Windows code page used for INFO2 single-byte paths
    pub codepage: u16,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_short_message_length: DEFAULT_MAX_SHORT_MESSAGE_LENGTH,
            codepage: DEFAULT_CODEPAGE,
        }
    }
}

impl DecoderConfig {
    /// Check that the short message can hold the ellipsis and that the
    /// configured code page is one we can decode
    pub fn validate(&self) -> Result<()> {
        if self.max_short_message_length < MIN_SHORT_MESSAGE_LENGTH {
            return Err(Error::InvalidInput(format!(
                "Short message length {} is below the minimum of {}",
                self.max_short_message_length, MIN_SHORT_MESSAGE_LENGTH
            )));
        }
        if crate::strings::codepage_encoding(self.codepage).is_none() {
            return Err(Error::InvalidInput(format!(
                "Unsupported code page {}",
                self.codepage
            )));
        }
        Ok(())
    }
}
