//! Windows 95 through XP `INFO2` Recycle Bin catalog decoder
//!
//! A single `INFO2` file in each `RECYCLER\<SID>` folder describes every
//! deleted item. It starts with a 16-byte header followed by fixed-size
//! records:
//!
//! | Offset | Size | Field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 260  | Original path, legacy code page, NUL padded |
//! | 260    | 4    | Record index (the `n` in `Dc<n>.ext`)       |
//! | 264    | 4    | Drive code (0 = A:)                         |
//! | 268    | 8    | Deletion time (FILETIME)                    |
//! | 276    | 4    | Original file size                          |
//! | 280    | 520  | UTF-16LE original path (wide layout only)   |
//!
//! The item count in the header is not maintained reliably and is never used
//! to bound iteration.

use crate::datetime::filetime_to_timestamp;
use crate::drive::resolve_drive;
use crate::emitter::DecodedFields;
use crate::error::{Error, Result};
use crate::strings::{decode_codepage, decode_utf16le};
use crate::types::{Anomaly, SourceFormat, TextField};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use encoding::EncodingRef;
use std::io::Cursor;

/// Catalog header size
pub const CATALOG_HEADER_SIZE: usize = 16;

/// Record size without the UTF-16 path block
pub const NARROW_RECORD_SIZE: u32 = 280;

/// Record size with the UTF-16 path block
pub const WIDE_RECORD_SIZE: u32 = 800;

const CODEPAGE_PATH_SIZE: usize = 260;
const RECORD_INDEX_OFFSET: usize = 260;
const DRIVE_CODE_OFFSET: usize = 264;
const DELETION_TIME_OFFSET: usize = 268;
const FILE_SIZE_OFFSET: usize = 276;
const UTF16_PATH_OFFSET: usize = 280;

/// Record layout declared by the catalog header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogLayout {
    /// Code page path only (Windows 95/98/ME)
    Narrow,
    /// Code page path plus UTF-16 path (Windows NT4 through XP)
    Wide,
}

impl CatalogLayout {
    pub fn from_record_size(record_size: u32) -> Option<Self> {
        match record_size {
            NARROW_RECORD_SIZE => Some(CatalogLayout::Narrow),
            WIDE_RECORD_SIZE => Some(CatalogLayout::Wide),
            _ => None,
        }
    }

    pub fn record_size(&self) -> usize {
        match self {
            CatalogLayout::Narrow => NARROW_RECORD_SIZE as usize,
            CatalogLayout::Wide => WIDE_RECORD_SIZE as usize,
        }
    }
}

/// Decoded catalog header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogHeader {
    pub version: u32,
    /// Item count as stored; informational only
    pub declared_items: u32,
    pub record_size: u32,
    pub layout: CatalogLayout,
}

impl CatalogHeader {
    /// Parse and validate the 16-byte header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < CATALOG_HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                needed: CATALOG_HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let _reserved = cursor.read_u32::<LittleEndian>()?;
        let version = cursor.read_u32::<LittleEndian>()?;
        let declared_items = cursor.read_u32::<LittleEndian>()?;
        let record_size = cursor.read_u32::<LittleEndian>()?;

        let layout =
            CatalogLayout::from_record_size(record_size).ok_or(Error::InvalidRecordSize(record_size))?;

        Ok(Self {
            version,
            declared_items,
            record_size,
            layout,
        })
    }
}

/// Lazy iterator over the records of an `INFO2` catalog.
///
/// Yields one `DecodedFields` per full record in on-disk order. A short
/// trailing chunk is dropped. Records with neither path field set are unused
/// slots and are skipped, so their index and deletion time never reach the
/// output; both are written to the debug log instead.
pub struct CatalogRecords<'a> {
    data: &'a [u8],
    offset: usize,
    layout: CatalogLayout,
    codepage: EncodingRef,
}

impl<'a> CatalogRecords<'a> {
    /// Validate the header and position at the first record
    pub fn new(data: &'a [u8], codepage: EncodingRef) -> Result<Self> {
        let header = CatalogHeader::parse(data)?;
        log::debug!(
            "INFO2 version {} declares {} items of {} bytes",
            header.version,
            header.declared_items,
            header.record_size
        );

        Ok(Self {
            data,
            offset: CATALOG_HEADER_SIZE,
            layout: header.layout,
            codepage,
        })
    }

    fn decode_record(&self, record: &[u8]) -> Option<DecodedFields> {
        let mut anomalies = Vec::new();

        let record_index = LittleEndian::read_u32(&record[RECORD_INDEX_OFFSET..]);
        let drive_code = i64::from(LittleEndian::read_u32(&record[DRIVE_CODE_OFFSET..]));
        let deletion_time = LittleEndian::read_u64(&record[DELETION_TIME_OFFSET..]);
        let file_size = LittleEndian::read_u32(&record[FILE_SIZE_OFFSET..]);

        let drive = resolve_drive(drive_code);
        if !drive.is_known() {
            log::debug!("INFO2 record {} has drive code {} out of range", record_index, drive_code);
            anomalies.push(Anomaly::DriveOutOfRange(drive_code));
        }

        let wide_path = match self.layout {
            CatalogLayout::Wide => {
                let decoded = decode_utf16le(&record[UTF16_PATH_OFFSET..]);
                if decoded.lossy {
                    anomalies.push(Anomaly::EncodingError {
                        field: TextField::Utf16Path,
                    });
                }
                Some(decoded.text).filter(|text| !text.is_empty())
            }
            CatalogLayout::Narrow => None,
        };

        let original_path = match wide_path {
            Some(path) => path,
            None => {
                let decoded = decode_codepage(&record[..CODEPAGE_PATH_SIZE], self.codepage);
                if decoded.lossy {
                    anomalies.push(Anomaly::EncodingError {
                        field: TextField::CodepagePath,
                    });
                }
                decoded.text
            }
        };

        if original_path.is_empty() {
            log::debug!(
                "Skipping INFO2 record {} with no path (deletion FILETIME {})",
                record_index,
                deletion_time
            );
            return None;
        }

        Some(DecodedFields {
            original_path,
            file_size: u64::from(file_size),
            deleted_at: filetime_to_timestamp(deletion_time),
            drive,
            record_index: Some(record_index),
            source_format: SourceFormat::Catalog,
            anomalies,
        })
    }
}

impl<'a> Iterator for CatalogRecords<'a> {
    type Item = DecodedFields;

    fn next(&mut self) -> Option<Self::Item> {
        let record_size = self.layout.record_size();

        while self.data.len() - self.offset >= record_size {
            let record = &self.data[self.offset..self.offset + record_size];
            self.offset += record_size;

            if let Some(fields) = self.decode_record(record) {
                return Some(fields);
            }
        }

        let tail = self.data.len() - self.offset;
        if tail > 0 {
            log::debug!("Dropping {} trailing INFO2 bytes short of a full record", tail);
            self.offset = self.data.len();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some((self.data.len() - self.offset) / self.layout.record_size()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::drive::Drive;
    use crate::strings::codepage_encoding;
    use crate::types::Timestamp;
    use chrono::NaiveDateTime;

    pub(crate) struct TestRecord<'p> {
        pub path: &'p str,
        pub index: u32,
        pub drive: u32,
        pub filetime: u64,
        pub size: u32,
    }

    pub(crate) fn catalog_header(record_size: u32, items: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(&items.to_le_bytes());
        data.extend_from_slice(&record_size.to_le_bytes());
        data
    }

    pub(crate) fn encode_record(record: &TestRecord, layout: CatalogLayout, wide_path: Option<&str>) -> Vec<u8> {
        let mut data = record.path.as_bytes().to_vec();
        data.resize(CODEPAGE_PATH_SIZE, 0);
        data.extend_from_slice(&record.index.to_le_bytes());
        data.extend_from_slice(&record.drive.to_le_bytes());
        data.extend_from_slice(&record.filetime.to_le_bytes());
        data.extend_from_slice(&record.size.to_le_bytes());
        if layout == CatalogLayout::Wide {
            let mut wide: Vec<u8> = wide_path
                .unwrap_or(record.path)
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect();
            wide.resize(520, 0);
            data.extend_from_slice(&wide);
        }
        assert_eq!(data.len(), layout.record_size());
        data
    }

    pub(crate) fn build_catalog(records: &[TestRecord], layout: CatalogLayout) -> Vec<u8> {
        let mut data = catalog_header(layout.record_size() as u32, records.len() as u32);
        for record in records {
            data.extend_from_slice(&encode_record(record, layout, None));
        }
        data
    }

    pub(crate) fn evil_records() -> Vec<TestRecord<'static>> {
        vec![
            TestRecord {
                path: "C:\\Documents and Settings\\Mr. Evil\\Desktop\\lalsetup250.exe",
                index: 1,
                drive: 2,
                filetime: 127_379_243_052_370_000,
                size: 1_388_544,
            },
            TestRecord {
                path: "C:\\Documents and Settings\\Mr. Evil\\Desktop\\netstumblerinstaller_0_4_0.exe",
                index: 2,
                drive: 2,
                filetime: 127_379_245_000_000_000,
                size: 1_215_488,
            },
            TestRecord {
                path: "C:\\Documents and Settings\\Mr. Evil\\Desktop\\WinPcap_3_01_a.exe",
                index: 3,
                drive: 2,
                filetime: 127_379_246_000_000_000,
                size: 450_560,
            },
            TestRecord {
                path: "C:\\Documents and Settings\\Mr. Evil\\Desktop\\ethereal-setup-0.10.6.exe",
                index: 4,
                drive: 2,
                filetime: 127_379_247_000_000_000,
                size: 10_362_880,
            },
        ]
    }

    fn cp1252() -> EncodingRef {
        codepage_encoding(1252).unwrap()
    }

    fn at(date: &str) -> Timestamp {
        let naive = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S%.f").unwrap();
        Timestamp::At(naive.and_utc())
    }

    #[test]
    fn test_header_parse() {
        let header = CatalogHeader::parse(&catalog_header(800, 7)).unwrap();
        assert_eq!(header.version, 5);
        assert_eq!(header.declared_items, 7);
        assert_eq!(header.layout, CatalogLayout::Wide);
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            CatalogHeader::parse(&[0u8; 15]),
            Err(Error::HeaderTooShort { needed: 16, available: 15 })
        ));
    }

    #[test]
    fn test_invalid_record_size() {
        for size in [0u32, 1, 16, 279, 281, 799, 801, u32::MAX] {
            let mut data = catalog_header(size, 1);
            data.extend_from_slice(&[0u8; 1024]);
            assert!(matches!(
                CatalogRecords::new(&data, cp1252()),
                Err(Error::InvalidRecordSize(s)) if s == size
            ));
        }
    }

    #[test]
    fn test_narrow_records_in_order() {
        let records = evil_records();
        let data = build_catalog(&records, CatalogLayout::Narrow);

        let decoded: Vec<_> = CatalogRecords::new(&data, cp1252()).unwrap().collect();
        assert_eq!(decoded.len(), records.len());
        for (fields, expected) in decoded.iter().zip(&records) {
            assert_eq!(fields.original_path, expected.path);
            assert_eq!(fields.record_index, Some(expected.index));
            assert_eq!(fields.file_size, u64::from(expected.size));
            assert_eq!(fields.deleted_at, filetime_to_timestamp(expected.filetime));
            assert_eq!(fields.drive, Drive::Letter('C'));
            assert_eq!(fields.source_format, SourceFormat::Catalog);
        }
    }

    #[test]
    fn test_wide_catalog_with_partial_tail() {
        let records = evil_records();
        let mut data = build_catalog(&records, CatalogLayout::Wide);
        data.extend_from_slice(&[0x41; 500]);

        let decoded: Vec<_> = CatalogRecords::new(&data, cp1252()).unwrap().collect();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[0].deleted_at, at("2004-08-25 16:18:25.237"));
        assert_eq!(decoded[0].record_index, Some(1));
        assert_eq!(
            decoded[0].original_path,
            "C:\\Documents and Settings\\Mr. Evil\\Desktop\\lalsetup250.exe"
        );
    }

    #[test]
    fn test_wide_path_takes_precedence() {
        let record = TestRecord {
            path: "C:\\DOCUME~1\\ADMINI~1\\??.txt",
            index: 9,
            drive: 2,
            filetime: 127_379_243_052_370_000,
            size: 12,
        };
        let mut data = catalog_header(WIDE_RECORD_SIZE, 1);
        data.extend_from_slice(&encode_record(
            &record,
            CatalogLayout::Wide,
            Some("C:\\Documents and Settings\\Administrator\\报告.txt"),
        ));

        let decoded: Vec<_> = CatalogRecords::new(&data, cp1252()).unwrap().collect();
        assert_eq!(decoded[0].original_path, "C:\\Documents and Settings\\Administrator\\报告.txt");
    }

    #[test]
    fn test_empty_wide_path_falls_back() {
        let record = TestRecord {
            path: "C:\\autoexec.bat",
            index: 1,
            drive: 2,
            filetime: 127_379_243_052_370_000,
            size: 12,
        };
        let mut data = catalog_header(WIDE_RECORD_SIZE, 1);
        data.extend_from_slice(&encode_record(&record, CatalogLayout::Wide, Some("")));

        let decoded: Vec<_> = CatalogRecords::new(&data, cp1252()).unwrap().collect();
        assert_eq!(decoded[0].original_path, "C:\\autoexec.bat");
    }

    #[test]
    fn test_duplicate_indices_pass_through() {
        let mut records = evil_records();
        records[1].index = 1;
        records[2].index = 1;
        let data = build_catalog(&records, CatalogLayout::Narrow);

        let indices: Vec<_> = CatalogRecords::new(&data, cp1252())
            .unwrap()
            .map(|fields| fields.record_index)
            .collect();
        assert_eq!(indices, vec![Some(1), Some(1), Some(1), Some(4)]);
    }

    #[test]
    fn test_item_count_not_trusted() {
        let records = evil_records();
        let mut data = build_catalog(&records, CatalogLayout::Narrow);
        data[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(CatalogRecords::new(&data, cp1252()).unwrap().count(), 4);

        data[8..12].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(CatalogRecords::new(&data, cp1252()).unwrap().count(), 4);
    }

    #[test]
    fn test_out_of_range_drive() {
        let mut records = evil_records();
        records.truncate(1);
        records[0].drive = 40;
        let data = build_catalog(&records, CatalogLayout::Narrow);

        let decoded: Vec<_> = CatalogRecords::new(&data, cp1252()).unwrap().collect();
        assert_eq!(decoded[0].drive, Drive::Unknown);
        assert_eq!(decoded[0].anomalies, vec![Anomaly::DriveOutOfRange(40)]);
    }

    #[test]
    fn test_empty_slots_skipped() {
        let records = evil_records();
        let mut data = catalog_header(NARROW_RECORD_SIZE, 2);
        data.extend_from_slice(&encode_record(&records[0], CatalogLayout::Narrow, None));
        data.extend_from_slice(&[0u8; NARROW_RECORD_SIZE as usize]);
        data.extend_from_slice(&encode_record(&records[1], CatalogLayout::Narrow, None));

        let decoded: Vec<_> = CatalogRecords::new(&data, cp1252()).unwrap().collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].record_index, Some(2));
    }

    #[test]
    fn test_header_only() {
        let data = catalog_header(NARROW_RECORD_SIZE, 0);
        assert_eq!(CatalogRecords::new(&data, cp1252()).unwrap().count(), 0);
    }
}
