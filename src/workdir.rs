//! reference working-directory scanner
//!
//! a thin `walkdir`-backed implementation of the scan interface the status
//! engine consumes. real deployments substitute their own scanner (ignore
//! rules, stat caches); this one exists so the engine is exercisable
//! end-to-end. failures are per-item: an unreadable file yields an error
//! item and the scan continues.

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::store::{blob_address, WorkdirEntry};
use crate::types::EntryMode;

/// scan a directory into workdir entries
///
/// yields files and symlinks (never directories) with paths relative to
/// `root`, content-addressed with the same blob addressing as the store.
/// output order is deterministic (name-sorted per directory); consumers
/// that need global path order sort the collected entries.
pub fn scan(root: &Path) -> impl Iterator<Item = Result<WorkdirEntry>> {
    let base: PathBuf = root.to_path_buf();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |item| match item {
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| base.clone());
                Some(Err(Error::Io {
                    path,
                    source: err.into(),
                }))
            }
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    return None;
                }
                let rel = entry
                    .path()
                    .strip_prefix(&base)
                    .ok()?
                    .to_string_lossy()
                    .into_owned();
                Some(read_entry(entry.path(), rel))
            }
        })
}

fn read_entry(path: &Path, rel: String) -> Result<WorkdirEntry> {
    let meta = fs::symlink_metadata(path).with_path(path)?;

    if meta.file_type().is_symlink() {
        let target = fs::read_link(path).with_path(path)?;
        let id = blob_address(target.as_os_str().as_bytes());
        return Ok(WorkdirEntry::new(rel, EntryMode::Symlink, id));
    }

    let content = fs::read(path).with_path(path)?;
    let mode = if meta.permissions().mode() & 0o111 != 0 {
        EntryMode::Executable
    } else {
        EntryMode::Regular
    };
    Ok(WorkdirEntry::new(rel, mode, blob_address(&content)))
}
