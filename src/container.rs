//! Artifact acquisition from evidence collections
//!
//! Finds Recycle Bin artifacts by name in:
//! - ZIP archives (common for triage collections), optionally password protected
//! - Directory trees such as an exported `$Recycle.Bin` or `RECYCLER` folder
//!
//! Only `$I` files and `INFO2` catalogs are collected; `$R` content files are skipped.

use crate::detect::NamingHint;
use crate::error::{Error, Result};
use crate::source::Artifact;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;
use zip::ZipArchive;

/// Largest entry read from an archive. `INFO2` catalogs top out well below this
pub const MAX_ARTIFACT_SIZE: u64 = 64 * 1024 * 1024;

/// Upper bound on the buffer reserved from a declared entry size
const MAX_ARTIFACT_PREALLOC: u64 = 1024 * 1024;

/// Container extractor for evidence collections
pub struct ContainerExtractor;

impl ContainerExtractor {
    /// Extract all Recycle Bin artifacts from a ZIP archive into memory
    pub fn extract_from_zip(path: &Path, password: Option<&str>) -> Result<Vec<Artifact>> {
        eprintln!("📦 Extracting Recycle Bin artifacts from ZIP archive: {}", path.display());

        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut artifacts = Vec::new();

        for i in 0..archive.len() {
            let mut zip_file = if let Some(pwd) = password {
                match archive.by_index_decrypt(i, pwd.as_bytes())? {
                    Ok(file) => file,
                    Err(_) => {
                        eprintln!("⚠️  Skipping encrypted file (wrong password): file {}", i);
                        continue;
                    }
                }
            } else {
                archive.by_index(i)?
            };

            if zip_file.is_dir() {
                continue;
            }

            let filename = zip_file.name().to_string();
            if NamingHint::from_file_name(&filename) == NamingHint::Unknown {
                log::debug!("Skipping non Recycle Bin entry: {}", filename);
                continue;
            }

            let declared = zip_file.size();
            let data = match read_entry(&mut zip_file, declared, MAX_ARTIFACT_SIZE) {
                Ok(data) => data,
                Err(err) => {
                    log::warn!("Skipping {}: {}", filename, err);
                    continue;
                }
            };
            log::debug!("Extracted {} bytes from {} (declared {})", data.len(), filename, declared);

            artifacts.push(Artifact::from_memory(filename, data));
        }

        if artifacts.is_empty() {
            return Err(Error::InvalidInput(
                "No Recycle Bin artifacts found in ZIP archive. Expected $I files or INFO2 catalogs."
                    .to_string(),
            ));
        }

        eprintln!("🎉 Found {} Recycle Bin artifacts in ZIP", artifacts.len());
        Ok(artifacts)
    }

    /// Walk a directory tree and collect every `$I` file and `INFO2` catalog
    pub fn collect_from_directory(path: &Path) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();

        for entry in WalkDir::new(path).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Could not read directory entry under {}: {}", path.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if NamingHint::from_file_name(&name) != NamingHint::Unknown {
                artifacts.push(Artifact::from_path(entry.path()));
            }
        }

        // WalkDir order depends on the filesystem
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));

        if artifacts.is_empty() {
            return Err(Error::InvalidInput(format!(
                "No Recycle Bin artifacts found under {}",
                path.display()
            )));
        }
        Ok(artifacts)
    }
}

/// Read one archive entry. The declared size only sizes the initial buffer;
/// anything past `limit` bytes is rejected
fn read_entry<R: Read>(reader: R, declared: u64, limit: u64) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(declared.min(MAX_ARTIFACT_PREALLOC) as usize);
    reader.take(limit.saturating_add(1)).read_to_end(&mut data)?;

    if data.len() as u64 > limit {
        return Err(Error::InvalidInput(format!(
            "archive entry exceeds {} bytes",
            limit
        )));
    }
    Ok(data)
}

/// Helper function to determine if a file is a container format
pub fn is_container_format(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
