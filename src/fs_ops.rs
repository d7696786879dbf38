//! Filesystem calls the write protocol routes through a seam so tests can
//! inject failures into steps that are hard to make fail on a real disk.

use std::fs::{File, Permissions};
use std::io;
use std::path::Path;

pub(crate) trait FsOps {
    /// Apply `perms` to an open file.
    fn set_permissions(&self, file: &File, perms: Permissions) -> io::Result<()>;

    /// Flush a directory's entries to durable storage.
    fn sync_dir(&self, dir: &Path) -> io::Result<()>;
}

/// The real filesystem.
pub(crate) struct HostFs;

impl FsOps for HostFs {
    fn set_permissions(&self, file: &File, perms: Permissions) -> io::Result<()> {
        file.set_permissions(perms)
    }

    #[cfg(unix)]
    fn sync_dir(&self, dir: &Path) -> io::Result<()> {
        File::open(dir)?.sync_all()
    }

    // Directories cannot be opened as files here; rename durability is left
    // to the filesystem.
    #[cfg(not(unix))]
    fn sync_dir(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }
}
