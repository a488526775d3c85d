//! Drive code to drive letter resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel rendered when the drive cannot be determined
pub const UNKNOWN_DRIVE: &str = "UNKNOWN";

/// Drive an item was deleted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Drive {
    /// Uppercase drive letter `A`..=`Z`
    Letter(char),
    Unknown,
}

impl Drive {
    pub fn is_known(&self) -> bool {
        matches!(self, Drive::Letter(_))
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drive::Letter(letter) => write!(f, "{}", letter),
            Drive::Unknown => f.write_str(UNKNOWN_DRIVE),
        }
    }
}

impl From<Drive> for String {
    fn from(drive: Drive) -> Self {
        drive.to_string()
    }
}

impl From<String> for Drive {
    fn from(value: String) -> Self {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_uppercase() => Drive::Letter(letter),
            _ => Drive::Unknown,
        }
    }
}

/// Map an INFO2 drive code to its letter: 0 is `A`, 25 is `Z`, anything else is unknown
pub fn resolve_drive(code: i64) -> Drive {
    match u8::try_from(code) {
        Ok(index) if index < 26 => Drive::Letter(char::from(b'A' + index)),
        _ => Drive::Unknown,
    }
}
