//! # recbin - Windows Recycle Bin Deletion Timeline
//!
//! Decodes the metadata Windows keeps for items moved to the Recycle Bin into
//! deletion events with the original path, size, deletion time and drive.
//!
//! ## Features
//!
//! - `$I` files from Windows Vista and later (versions 1 and 2)
//! - `INFO2` catalogs from Windows 95 to XP (narrow and wide records)
//! - Format detection from content, helped by the artifact's file name
//! - Lazy, zero-copy decoding over memory mapped files
//! - Collections from directories and (optionally encrypted) ZIP archives
//! - Multiple output formats (human-readable, JSON, CSV, timeline)
//!
//! ## Example
//!
//! ```no_run
//! use recbin::{NamingHint, RecycleBinParser};
//!
//! let data = std::fs::read("INFO2")?;
//! let parser = RecycleBinParser::new();
//! for event in parser.parse(&data, NamingHint::Legacy)? {
//!     println!("{}", parser.emitter().message(&event));
//! }
//! # Ok::<(), recbin::Error>(())
//! ```
//!
//! ## Author
//!
//! Albert Hui <albert@securityronin.com>

pub mod app;
pub mod cli;
pub mod container;
pub mod datetime;
pub mod detect;
pub mod drive;
pub mod emitter;
pub mod error;
pub mod info2;
pub mod output;
pub mod parser;
pub mod recycle_bin;
pub mod source;
pub mod strings;
pub mod types;

pub use detect::{detect_format, NamingHint};
pub use drive::{resolve_drive, Drive};
pub use emitter::{DecodedFields, EventEmitter};
pub use error::{Error, Result};
pub use output::{OutputFormat, OutputWriter};
pub use parser::{DeletionEvents, RecycleBinParser};
pub use source::{Artifact, ArtifactSource};
pub use types::{DecoderConfig, DeletionEvent, SourceFormat, Timestamp, TimelineEntry};
