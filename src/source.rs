//! Byte sources for a single Recycle Bin artifact.

use crate::detect::NamingHint;
use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

/// Bytes of one artifact, either mapped from disk or held in memory.
/// Dropping the source releases the mapping or buffer.
pub enum ArtifactSource {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl ArtifactSource {
    /// Open a file on disk. Empty files are not mapped
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(ArtifactSource::Buffered(Vec::new()));
        }

        let mmap = unsafe { Mmap::map(&file)? };
        Ok(ArtifactSource::Mapped(mmap))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ArtifactSource::Mapped(mmap) => mmap,
            ArtifactSource::Buffered(data) => data,
        }
    }
}

impl Deref for ArtifactSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for ArtifactSource {
    fn from(data: Vec<u8>) -> Self {
        ArtifactSource::Buffered(data)
    }
}

/// An artifact waiting to be decoded
pub struct Artifact {
    /// Display name, usually the path it was found at
    pub name: String,
    pub hint: NamingHint,
    pub origin: ArtifactOrigin,
}

/// Where the artifact bytes come from
pub enum ArtifactOrigin {
    /// File on disk, opened when decoded
    File(std::path::PathBuf),
    /// Already extracted, e.g. from a ZIP collection
    Memory(Vec<u8>),
}

impl Artifact {
    pub fn from_path(path: &Path) -> Self {
        let name = path.display().to_string();
        Self {
            hint: NamingHint::from_file_name(&name),
            name,
            origin: ArtifactOrigin::File(path.to_path_buf()),
        }
    }

    pub fn from_memory(name: String, data: Vec<u8>) -> Self {
        Self {
            hint: NamingHint::from_file_name(&name),
            name,
            origin: ArtifactOrigin::Memory(data),
        }
    }

    /// Acquire the bytes. The source lives only as long as the caller keeps it
    pub fn open(self) -> Result<ArtifactSource> {
        match self.origin {
            ArtifactOrigin::File(path) => ArtifactSource::open(&path),
            ArtifactOrigin::Memory(data) => Ok(ArtifactSource::from(data)),
        }
    }
}
