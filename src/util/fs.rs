//! Filesystem utilities.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use filetime::FileTime;
use walkdir::WalkDir;

/// Source file extensions whose permissions follow the cache mode of a dev pod.
pub const SOURCE_EXTENSIONS: &[&str] = &["h", "m", "mm", "c", "cc"];

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Write a file by persisting a temporary sibling over it.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    ensure_dir(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents)?;
    tmp.persist(path)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

/// Copy a file into a directory through a temporary file, so readers never
/// observe a half-written library.
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let parent = dst.parent().unwrap_or(Path::new("."));
    ensure_dir(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    let mut reader =
        fs::File::open(src).with_context(|| format!("failed to open {}", src.display()))?;
    io::copy(&mut reader, &mut tmp)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    tmp.persist(dst)
        .with_context(|| format!("failed to write file: {}", dst.display()))?;
    Ok(())
}

/// Whether `path` itself is a symlink (dangling or not).
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Whether `path` is a symlink whose destination exists.
pub fn is_live_symlink(path: &Path) -> bool {
    is_symlink(path) && path.exists()
}

/// Remove a file or symlink, if present.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

/// Set a file's modification time to now.
pub fn touch(path: &Path) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::now())
        .with_context(|| format!("failed to touch {}", path.display()))
}

/// Modification time of a file.
pub fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("failed to read modification time of {}", path.display()))
}

/// Every source file (see [`SOURCE_EXTENSIONS`]) below `dir`.
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_source = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SOURCE_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        if is_source {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Toggle the owner write bit of every source file below `dir`.
pub fn set_sources_writable(dir: &Path, writable: bool) -> Result<usize> {
    let files = source_files(dir)?;
    for file in &files {
        set_owner_writable(file, writable)?;
    }
    Ok(files.len())
}

#[cfg(unix)]
fn set_owner_writable(path: &Path, writable: bool) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .with_context(|| format!("failed to read permissions of {}", path.display()))?
        .permissions();
    let mode = perms.mode();
    let mode = if writable { mode | 0o200 } else { mode & !0o200 };
    perms.set_mode(mode);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to change permissions of {}", path.display()))
}

#[cfg(not(unix))]
fn set_owner_writable(path: &Path, writable: bool) -> Result<()> {
    let mut perms = fs::metadata(path)
        .with_context(|| format!("failed to read permissions of {}", path.display()))?
        .permissions();
    perms.set_readonly(!writable);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to change permissions of {}", path.display()))
}
