//! Archive expansion
//!
//! A `.zip` upload is unpacked and only its PDF entries are uploaded.
//! Anything else passes through untouched.

use crate::domain::{ExportError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ARCHIVE_EXTENSION: &str = "zip";
const DOCUMENT_EXTENSION: &str = "pdf";

/// Files ready for upload
///
/// Holds the extraction directory, if any, so the extracted files live as
/// long as this value.
#[derive(Debug)]
pub struct ExpandedFiles {
    _dir: Option<TempDir>,
    paths: Vec<PathBuf>,
}

impl ExpandedFiles {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

pub fn is_archive(path: &Path) -> bool {
    has_extension(path, ARCHIVE_EXTENSION)
}

/// Expand `path` if it is an archive
///
/// Archives are extracted into a fresh temporary directory and only the
/// document entries are returned; other paths come back unchanged.
///
/// # Errors
///
/// Returns an error if the archive is unreadable or extraction fails.
pub async fn expand_if_archive(path: &Path) -> Result<ExpandedFiles> {
    if !is_archive(path) {
        return Ok(ExpandedFiles {
            _dir: None,
            paths: vec![path.to_path_buf()],
        });
    }

    let archive_path = path.to_path_buf();
    let expanded = tokio::task::spawn_blocking(move || extract_documents(&archive_path))
        .await
        .map_err(|e| ExportError::Other(format!("archive extraction task failed: {e}")))??;

    tracing::debug!(
        archive = %path.display(),
        documents = expanded.len(),
        "Expanded archive"
    );
    Ok(expanded)
}

fn extract_documents(archive_path: &Path) -> Result<ExpandedFiles> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExportError::Io(format!("invalid archive {}: {e}", archive_path.display())))?;

    let dir = TempDir::new()?;
    let mut paths = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ExportError::Io(format!("unreadable archive entry {index}: {e}")))?;

        if entry.is_dir() {
            continue;
        }
        // Entries that would escape the extraction directory are dropped
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            continue;
        };
        if !has_extension(&relative, DOCUMENT_EXTENSION) {
            continue;
        }

        let target = dir.path().join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        paths.push(target);
    }

    Ok(ExpandedFiles {
        _dir: Some(dir),
        paths,
    })
}
