//! Recycle Bin artifact format detection.
//!
//! Picks the decoder for a byte buffer from its leading bytes, helped by the
//! artifact's own file name when one is known:
//! - `$I......` files start with a 64-bit version tag of 1 or 2
//! - `INFO2` catalogs start with a 16-byte header declaring a 280 or 800 byte record size

use crate::error::{Error, Result};
use crate::info2::{CatalogLayout, CATALOG_HEADER_SIZE};
use crate::types::SourceFormat;

/// Bytes needed to read the `$I` version tag
pub const VERSION_TAG_SIZE: usize = 8;

/// What the artifact's file name says about its format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingHint {
    /// `$I` prefixed file from a `$Recycle.Bin` folder
    Modern,
    /// `INFO2` catalog from a `RECYCLER` folder
    Legacy,
    /// No usable name, decide from content alone
    Unknown,
}

impl NamingHint {
    /// Derive a hint from a file name (or path)
    pub fn from_file_name(name: &str) -> Self {
        let base = name.rsplit(|c| c == '\\' || c == '/').next().unwrap_or(name);

        if base.len() > 2 && base.as_bytes()[..2].eq_ignore_ascii_case(b"$I") {
            NamingHint::Modern
        } else if base.eq_ignore_ascii_case("INFO2") {
            NamingHint::Legacy
        } else {
            NamingHint::Unknown
        }
    }
}

/// Select the decoder for `data`
pub fn detect_format(data: &[u8], hint: NamingHint) -> Result<SourceFormat> {
    match hint {
        NamingHint::Modern => {
            let version = read_version_tag(data).ok_or(Error::HeaderTooShort {
                needed: VERSION_TAG_SIZE,
                available: data.len(),
            })?;
            single_record_version(version).ok_or_else(|| {
                Error::UnsupportedFormat(format!("unknown $I version tag {}", version))
            })
        }
        NamingHint::Legacy => {
            let record_size = read_record_size(data).ok_or(Error::HeaderTooShort {
                needed: CATALOG_HEADER_SIZE,
                available: data.len(),
            })?;
            CatalogLayout::from_record_size(record_size)
                .map(|_| SourceFormat::Catalog)
                .ok_or(Error::InvalidRecordSize(record_size))
        }
        NamingHint::Unknown => {
            if let Some(format) = read_version_tag(data).and_then(single_record_version) {
                return Ok(format);
            }
            if read_record_size(data)
                .and_then(CatalogLayout::from_record_size)
                .is_some()
            {
                return Ok(SourceFormat::Catalog);
            }
            Err(Error::UnsupportedFormat(format!(
                "{} bytes match neither the $I nor the INFO2 layout",
                data.len()
            )))
        }
    }
}

fn single_record_version(version: u64) -> Option<SourceFormat> {
    match version {
        1 => Some(SourceFormat::SingleRecordV1),
        2 => Some(SourceFormat::SingleRecordV2),
        _ => None,
    }
}

fn read_version_tag(data: &[u8]) -> Option<u64> {
    let bytes = data.get(..VERSION_TAG_SIZE)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

fn read_record_size(data: &[u8]) -> Option<u32> {
    let bytes = data.get(12..CATALOG_HEADER_SIZE)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}
