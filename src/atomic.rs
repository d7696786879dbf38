//! Durable atomic file replacement via tempfile + fsync + rename.
//!
//! New content is staged in a hidden file next to the target, flushed to
//! disk, optionally given the old file's mode, renamed over the target and
//! finally made durable by flushing the directory. Readers of the target see
//! either the old bytes or the new bytes, never a mix.
//!
//! The staging file is a [`tempfile::NamedTempFile`], so every early return
//! removes it on drop; the rename consumes it on success.

use std::ffi::OsString;
use std::fs::{self, File, Permissions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::error::{AtomicWriteError, AtomicWriteResult};
use crate::fs_ops::{FsOps, HostFs};
use crate::options::AtomicWriteOptions;

/// Mode given to new content when no mode is preserved: owner read/write.
#[cfg(unix)]
pub const DEFAULT_MODE: u32 = 0o600;

/// Atomically replace the file at `path` with `content`.
///
/// See [`atomic_write_with`] for the exact protocol.
///
/// # Errors
///
/// Returns [`AtomicWriteError`] wrapping the operating-system error of the
/// step that failed.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: impl AsRef<[u8]>,
    options: AtomicWriteOptions,
) -> AtomicWriteResult<()> {
    let content = content.as_ref();
    atomic_write_with(path, options, |w| w.write_all(content))
}

/// Atomically replace the file at `path` with whatever `write` produces.
///
/// 1. Capture the target's permissions if `options.preserve_mode` is set.
/// 2. Create `.<basename>XXXXXX` in the target's directory, mode `0o600`.
/// 3. Run `write` against a buffered writer over the staging file.
/// 4. Flush and fsync the staging file.
/// 5. Apply the captured permissions. Lacking privilege to do so is not an
///    error: the default mode is kept.
/// 6. Rename the staging file onto `path`.
/// 7. Fsync the directory.
///
/// If `write` returns an error nothing is renamed and the target is untouched.
///
/// # Errors
///
/// - [`AtomicWriteError::Path`] if the directory is missing or unusable.
/// - [`AtomicWriteError::Write`] if `write`, the flush or the fsync fails.
/// - [`AtomicWriteError::PermissionRestore`] if applying the mode fails for
///   any reason other than permission denied.
/// - [`AtomicWriteError::Rename`] if the rename fails.
/// - [`AtomicWriteError::Durability`] if the directory flush fails. The new
///   content is already in place in that case.
pub fn atomic_write_with<F>(
    path: impl AsRef<Path>,
    options: AtomicWriteOptions,
    write: F,
) -> AtomicWriteResult<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    write_via(&HostFs, path.as_ref(), options, write)
}

/// The `.<basename>` prefix every staging file for `path` starts with.
#[must_use]
pub fn staging_prefix(path: impl AsRef<Path>) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = path.as_ref().file_name() {
        prefix.push(name);
    }
    prefix
}

pub(crate) fn write_via<F>(
    ops: &impl FsOps,
    path: &Path,
    options: AtomicWriteOptions,
    write: F,
) -> AtomicWriteResult<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = staging_dir(path)?;

    let captured = if options.preserve_mode {
        capture_permissions(path, &dir)?
    } else {
        None
    };

    let staged = create_staging(path, &dir)?;
    debug!(
        path = %path.display(),
        staging = %staged.path().display(),
        "staging file created"
    );

    write_staged(staged.as_file(), write).map_err(|source| AtomicWriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(perms) = captured {
        restore_permissions(ops, staged.as_file(), perms, path)?;
    }

    staged
        .persist(path)
        .map_err(|err| AtomicWriteError::Rename {
            path: path.to_path_buf(),
            source: err.error,
        })?;
    debug!(path = %path.display(), "staging file renamed into place");

    ops.sync_dir(&dir)
        .map_err(|source| AtomicWriteError::Durability {
            path: path.to_path_buf(),
            dir: dir.clone(),
            source,
        })?;
    debug!(dir = %dir.display(), "directory flushed");

    Ok(())
}

/// Directory the staging file goes in: the target's own parent.
fn staging_dir(path: &Path) -> AtomicWriteResult<PathBuf> {
    if path.file_name().is_none() {
        return Err(AtomicWriteError::Path {
            dir: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "target path has no file name"),
        });
    }
    Ok(match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    })
}

fn capture_permissions(path: &Path, dir: &Path) -> AtomicWriteResult<Option<Permissions>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AtomicWriteError::Path {
            dir: dir.to_path_buf(),
            source,
        }),
    }
}

fn create_staging(path: &Path, dir: &Path) -> AtomicWriteResult<NamedTempFile> {
    fs::metadata(dir).map_err(|source| AtomicWriteError::Path {
        dir: dir.to_path_buf(),
        source,
    })?;

    let prefix = staging_prefix(path);
    let mut builder = Builder::new();
    builder.prefix(&prefix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(DEFAULT_MODE));
    }
    builder
        .tempfile_in(dir)
        .map_err(|source| AtomicWriteError::Path {
            dir: dir.to_path_buf(),
            source: os_error(source),
        })
}

/// Strip `tempfile`'s path annotation, keeping the OS error underneath.
fn os_error(err: io::Error) -> io::Error {
    use std::error::Error as _;

    if err.raw_os_error().is_some() {
        return err;
    }
    let raw = err
        .get_ref()
        .and_then(|annotated| annotated.source())
        .and_then(|inner| inner.downcast_ref::<io::Error>())
        .and_then(io::Error::raw_os_error);
    raw.map_or(err, io::Error::from_raw_os_error)
}

fn write_staged<F>(file: &File, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush()?;
    drop(writer);
    file.sync_all()
}

fn restore_permissions(
    ops: &impl FsOps,
    file: &File,
    perms: Permissions,
    path: &Path,
) -> AtomicWriteResult<()> {
    match ops.set_permissions(file, perms) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                path = %path.display(),
                error = %err,
                "no privilege to preserve mode, keeping default"
            );
            Ok(())
        }
        Err(source) => Err(AtomicWriteError::PermissionRestore {
            path: path.to_path_buf(),
            source,
        }),
    }
}
