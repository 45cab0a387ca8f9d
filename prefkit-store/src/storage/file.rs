//! Atomic file storage
//!
//! A save never overwrites the live file in place. Bytes go to a uniquely
//! named temp file beside it, are flushed, then renamed over the target. A
//! crash at any point leaves either the old or the new file, never a mix,
//! and concurrent saves of the same store never share a temp file.

use super::Backend;
use crate::Result;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores as files named after the store inside one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Backend rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the store `name`
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Backend for FileBackend {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        StagedWrite::stage(&self.path(name), bytes)?.commit()
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                sync_directory(&path)?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn location(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }
}

/// A fully written and synced temp file waiting to replace its target.
///
/// The temp file is created owner-only (`0o600` on Unix) under a random name
/// in the target's directory. Dropping without [`StagedWrite::commit`]
/// deletes it and leaves the target untouched.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedWrite {
    /// Write and fsync a temp file for `target`.
    pub fn stage(target: &Path, bytes: &[u8]) -> Result<Self> {
        let parent = parent_dir(target);
        fs::create_dir_all(parent)?;

        let prefix = match target.file_name() {
            Some(name) => format!(".{}.", name.to_string_lossy()),
            None => ".".to_string(),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(parent)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        Ok(Self {
            target: target.to_path_buf(),
            temp,
        })
    }

    /// Path of the staged temp file
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temp file over the target and sync the directory.
    pub fn commit(self) -> Result<()> {
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        sync_directory(&self.target)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> Result<()> {
    fs::File::open(parent_dir(path))?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn test_write_read_remove() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());

        assert!(!backend.exists("settings"));
        assert_eq!(backend.read("settings").unwrap(), None);

        backend.write("settings", b"one").unwrap();
        assert!(backend.exists("settings"));
        assert_eq!(backend.read("settings").unwrap(), Some(b"one".to_vec()));
        assert!(temp_files(dir.path()).is_empty());

        backend.write("settings", b"two").unwrap();
        assert_eq!(backend.read("settings").unwrap(), Some(b"two".to_vec()));

        assert!(backend.remove("settings").unwrap());
        assert!(!backend.remove("settings").unwrap());
        assert!(!backend.exists("settings"));
        assert_eq!(backend.location("settings"), dir.path().join("settings").display().to_string());
    }

    #[test]
    fn test_uncommitted_stage_keeps_old_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings");
        StagedWrite::stage(&path, b"old").unwrap().commit().unwrap();

        let staged = StagedWrite::stage(&path, b"new").unwrap();
        assert!(staged.temp_path().exists());
        assert_eq!(staged.temp_path().parent(), Some(dir.path()));
        assert_eq!(fs::read(&path).unwrap(), b"old");
        drop(staged);

        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_stale_temp_does_not_block_save() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.write("settings", b"old").unwrap();

        // Simulate a crash between stage and commit
        let staged = StagedWrite::stage(&backend.path("settings"), b"half").unwrap();
        let stale = staged.temp_path().to_path_buf();
        std::mem::forget(staged);
        assert!(stale.exists());
        assert_eq!(backend.read("settings").unwrap(), Some(b"old".to_vec()));

        backend.write("settings", b"new").unwrap();
        assert_eq!(backend.read("settings").unwrap(), Some(b"new".to_vec()));
        assert_eq!(fs::read(&stale).unwrap(), b"half");
    }

    #[test]
    fn test_concurrent_stages_use_distinct_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared");

        let a = StagedWrite::stage(&path, b"a").unwrap();
        let b = StagedWrite::stage(&path, b"b").unwrap();
        assert_ne!(a.temp_path(), b.temp_path());

        a.commit().unwrap();
        b.commit().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"b");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_parallel_writers_never_fail_or_tear() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path()));
        let blobs: Vec<Vec<u8>> = (0..4u8).map(|i| vec![i; 256 * 1024]).collect();

        let workers: Vec<_> = blobs
            .iter()
            .cloned()
            .map(|blob| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    for _ in 0..25 {
                        backend.write("shared", &blob).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let saved = backend.read("shared").unwrap().unwrap();
        assert!(blobs.contains(&saved));
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_creates_missing_parent() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("deeper"));
        backend.write("p", b"x").unwrap();
        assert!(backend.exists("p"));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.write("secret", b"x").unwrap();
        let mode = fs::metadata(backend.path("secret")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
