//! Error types and handling for Recycle Bin artifact decoding.

use std::fmt;

/// Custom error type for recbin operations
#[derive(Debug)]
pub enum Error {
    /// I/O related errors
    Io(std::io::Error),
    /// ZIP archive related errors
    Zip(zip::result::ZipError),
    /// JSON serialization/deserialization errors
    Json(serde_json::Error),
    /// CSV writing errors
    Csv(csv::Error),
    /// Generic error with message
    Generic(String),
    /// Invalid input format
    InvalidInput(String),
    /// Header matches neither the `$I` nor the INFO2 layout
    UnsupportedFormat(String),
    /// Not enough bytes to read a fixed-size header
    HeaderTooShort { needed: usize, available: usize },
    /// A declared field runs past the end of the data
    TruncatedRecord { declared: usize, available: usize },
    /// INFO2 header declares a record size we do not know how to read
    InvalidRecordSize(u32),
    /// Record decoded cleanly but carries no original path
    MissingPath,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Zip(err) => write!(f, "ZIP error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Csv(err) => write!(f, "CSV error: {}", err),
            Error::Generic(msg) => write!(f, "{}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::HeaderTooShort { needed, available } => write!(
                f,
                "Header too short: need {} bytes, only {} available",
                needed, available
            ),
            Error::TruncatedRecord { declared, available } => write!(
                f,
                "Truncated record: field declares {} bytes, only {} remain",
                declared, available
            ),
            Error::InvalidRecordSize(size) => {
                write!(f, "Invalid INFO2 record size: {} (0x{:X})", size, size)
            }
            Error::MissingPath => write!(f, "Record has no original path"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Zip(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    /// Whether this error came from decoding artifact bytes rather than from
    /// acquiring or writing them
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat(_)
                | Error::HeaderTooShort { .. }
                | Error::TruncatedRecord { .. }
                | Error::InvalidRecordSize(_)
                | Error::MissingPath
        )
    }
}

// Convenient conversion traits
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Generic(err.to_string())
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;
