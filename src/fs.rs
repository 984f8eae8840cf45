//! Filesystem access behind a trait.
//!
//! Sources, cache entries and `package_todo.toml` files are all read and
//! written through [`FileSystem`], so a whole run can be driven against an
//! in-memory tree.

use std::io;
use std::path::Path;

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write `content`, creating missing parent directories.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Replace `to` with `from`. Readers see either the old or the new file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Removing a file that isn't there succeeds.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// The process's real disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
            _ => {}
        }
        std::fs::write(path, content)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path).or_else(|e| match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(e),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Shared [`RealFs`] for commands that don't take an injected filesystem.
pub fn default_fs() -> &'static RealFs {
    static DISK: RealFs = RealFs;
    &DISK
}
