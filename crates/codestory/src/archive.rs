//! Upload validation and safe unpacking of zip archives.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{ArchiveError, UploadError};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Checks the declared size and the zip structure without extracting
/// anything. Returns the sorted list of every file entry in the upload,
/// including ones scanning will later skip. Unsafe paths are left out.
pub fn validate_upload(bytes: &[u8], max_upload_bytes: u64) -> Result<Vec<String>, UploadError> {
    let size = bytes.len() as u64;
    if size > max_upload_bytes {
        return Err(UploadError::TooLarge {
            size,
            limit: max_upload_bytes,
        });
    }

    let archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| UploadError::InvalidArchive(e.to_string()))?;

    let mut files: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .filter_map(safe_relative_path)
        .map(|path| to_slash(&path))
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnpackStats {
    pub files: usize,
    pub bytes: u64,
    pub skipped: usize,
}

/// Extracts `bytes` below `dest`.
///
/// Entries that would land outside `dest`, and symlink entries, are skipped.
/// Extraction stops with [`ArchiveError::ExtractedTooLarge`] once the total
/// written exceeds `max_extracted_bytes`.
pub fn unpack(
    bytes: &[u8],
    dest: &Path,
    max_extracted_bytes: u64,
) -> Result<UnpackStats, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveError::Open)?;
    let mut stats = UnpackStats::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ArchiveError::ReadEntry { index, source })?;

        if entry
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            warn!("Skipping symlink entry {}", entry.name());
            stats.skipped += 1;
            continue;
        }

        let Some(relative) = safe_relative_path(entry.name()) else {
            warn!("Skipping entry with unsafe path {:?}", entry.name());
            stats.skipped += 1;
            continue;
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            create_dir(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }

        let remaining = max_extracted_bytes.saturating_sub(stats.bytes);
        let mut out = fs::File::create(&target).map_err(|source| ArchiveError::WriteFile {
            path: target.clone(),
            source,
        })?;
        let written = std::io::copy(&mut (&mut entry).take(remaining + 1), &mut out).map_err(
            |source| ArchiveError::WriteFile {
                path: target.clone(),
                source,
            },
        )?;

        if written > remaining {
            return Err(ArchiveError::ExtractedTooLarge {
                limit: max_extracted_bytes,
            });
        }

        stats.bytes += written;
        stats.files += 1;
    }

    debug!(
        "Unpacked {} files ({} bytes, {} skipped)",
        stats.files, stats.bytes, stats.skipped
    );
    Ok(stats)
}

fn create_dir(path: &Path) -> Result<(), ArchiveError> {
    fs::create_dir_all(path).map_err(|source| ArchiveError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Accepts only plain relative paths: no root, no drive prefix, no `..`.
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    use std::path::Component;

    let normalized = name.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Per-task extraction directory, removed when dropped.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub fn create(base: &Path, task_id: &str) -> Result<Self, ArchiveError> {
        let path = base.join(format!("codestory_{}", task_id));
        create_dir(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed work directory {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove work directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
