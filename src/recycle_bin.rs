//! Windows Vista+ `$I` Recycle Bin file decoder
//!
//! Each deleted item gets its own `$I` metadata file next to the `$R` file
//! holding the content. Layout (little-endian):
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 8    | Version (1 or 2)                        |
//! | 8      | 8    | Original file size                      |
//! | 16     | 8    | Deletion time (FILETIME)                |
//! | 24     | 4    | Path length (v1: UTF-16 units, v2: bytes) |
//! | 28     | ...  | UTF-16LE original path                  |

use crate::datetime::filetime_to_timestamp;
use crate::drive::Drive;
use crate::emitter::DecodedFields;
use crate::error::{Error, Result};
use crate::strings::decode_utf16le;
use crate::types::{Anomaly, SourceFormat, TextField};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Fixed header bytes before the path
pub const SINGLE_RECORD_HEADER_SIZE: usize = 28;

/// Header fields of a `$I` file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawHeader {
    version: u64,
    file_size: u64,
    deletion_time: u64,
    name_length: u32,
}

impl RawHeader {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < SINGLE_RECORD_HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                needed: SINGLE_RECORD_HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        Ok(Self {
            version: cursor.read_u64::<LittleEndian>()?,
            file_size: cursor.read_u64::<LittleEndian>()?,
            deletion_time: cursor.read_u64::<LittleEndian>()?,
            name_length: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Declared path size in bytes
    fn path_byte_length(&self, format: SourceFormat) -> usize {
        let length = self.name_length as usize;
        match format {
            SourceFormat::SingleRecordV1 => length.saturating_mul(2),
            _ => length,
        }
    }
}

/// Decode a `$I` file previously identified as `format`
pub fn decode_single_record(data: &[u8], format: SourceFormat) -> Result<DecodedFields> {
    let expected_version = match format {
        SourceFormat::SingleRecordV1 => 1,
        SourceFormat::SingleRecordV2 => 2,
        SourceFormat::Catalog => {
            return Err(Error::UnsupportedFormat(
                "INFO2 catalog passed to the $I decoder".to_string(),
            ))
        }
    };

    let header = RawHeader::parse(data)?;
    if header.version != expected_version {
        return Err(Error::UnsupportedFormat(format!(
            "$I version tag {} does not match {}",
            header.version, format
        )));
    }

    let remaining = &data[SINGLE_RECORD_HEADER_SIZE..];
    let declared = header.path_byte_length(format);
    if declared > remaining.len() {
        return Err(Error::TruncatedRecord {
            declared,
            available: remaining.len(),
        });
    }

    let mut anomalies = Vec::new();
    let decoded = decode_utf16le(&remaining[..declared]);
    if decoded.lossy {
        log::debug!("Replaced invalid UTF-16 in $I path: {}", decoded.text);
        anomalies.push(Anomaly::EncodingError {
            field: TextField::Utf16Path,
        });
    }

    if decoded.text.is_empty() {
        return Err(Error::MissingPath);
    }

    Ok(DecodedFields {
        original_path: decoded.text,
        file_size: header.file_size,
        deleted_at: filetime_to_timestamp(header.deletion_time),
        drive: Drive::Unknown,
        record_index: None,
        source_format: format,
        anomalies,
    })
}
