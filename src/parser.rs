//! Entry point tying format detection, the two codecs and event emission together.

use crate::detect::{detect_format, NamingHint};
use crate::emitter::{DecodedFields, EventEmitter};
use crate::error::{Error, Result};
use crate::info2::CatalogRecords;
use crate::recycle_bin::decode_single_record;
use crate::strings::codepage_encoding;
use crate::types::{DecoderConfig, DeletionEvent, SourceFormat, TimelineEntry};
use encoding::EncodingRef;

/// Recycle Bin artifact parser
#[derive(Debug, Clone)]
pub struct RecycleBinParser {
    config: DecoderConfig,
    emitter: EventEmitter,
}

impl RecycleBinParser {
    /// Create new parser with default settings
    pub fn new() -> Self {
        Self {
            config: DecoderConfig::default(),
            emitter: EventEmitter::default(),
        }
    }

    /// Create a parser with custom configuration
    pub fn with_config(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        let emitter = EventEmitter::from_config(&config);
        Ok(Self { config, emitter })
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    /// Decode one artifact.
    ///
    /// Header-level problems are returned as an error before any event is
    /// produced. The returned iterator borrows `data` and yields events lazily.
    pub fn parse<'a>(&self, data: &'a [u8], hint: NamingHint) -> Result<DeletionEvents<'a>> {
        let format = detect_format(data, hint)?;

        match format {
            SourceFormat::SingleRecordV1 | SourceFormat::SingleRecordV2 => {
                let fields = decode_single_record(data, format)?;
                Ok(DeletionEvents::Single {
                    event: Some(self.emitter.emit(fields)),
                })
            }
            SourceFormat::Catalog => {
                let records = CatalogRecords::new(data, self.codepage()?)?;
                Ok(DeletionEvents::Catalog {
                    records,
                    emitter: self.emitter,
                })
            }
        }
    }

    /// Decode one artifact and render its messages, tagging every entry with `artifact`
    pub fn parse_entries(&self, artifact: &str, data: &[u8], hint: NamingHint) -> Result<Vec<TimelineEntry>> {
        let events = self.parse(data, hint)?;
        Ok(events
            .map(|event| TimelineEntry {
                artifact: artifact.to_string(),
                message: self.emitter.message(&event),
                short_message: self.emitter.short_message(&event),
                event,
            })
            .collect())
    }

    fn codepage(&self) -> Result<EncodingRef> {
        codepage_encoding(self.config.codepage).ok_or_else(|| {
            Error::InvalidInput(format!("Unsupported code page {}", self.config.codepage))
        })
    }
}

impl Default for RecycleBinParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Events decoded from one artifact: at most one for `$I` files, one per
/// record for `INFO2` catalogs. Forward-only and not restartable.
pub enum DeletionEvents<'a> {
    Single {
        event: Option<DeletionEvent>,
    },
    Catalog {
        records: CatalogRecords<'a>,
        emitter: EventEmitter,
    },
}

impl<'a> Iterator for DeletionEvents<'a> {
    type Item = DeletionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DeletionEvents::Single { event } => event.take(),
            DeletionEvents::Catalog { records, emitter } => {
                records.next().map(|fields: DecodedFields| emitter.emit(fields))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            DeletionEvents::Single { event } => {
                let n = usize::from(event.is_some());
                (n, Some(n))
            }
            DeletionEvents::Catalog { records, .. } => records.size_hint(),
        }
    }
}
