//! `planck` — durable, atomic file replacement.
//!
//! [`atomic_write`] replaces a file's contents so that concurrent readers
//! only ever see the complete old content or the complete new content, and a
//! crash mid-write never leaves the file truncated.
//!
//! # Protocol
//!
//! ```text
//! stat(target)? → staging file (.<name>XXXXXX, 0600, same dir)
//!               → buffered write → fsync → chmod? → rename → fsync(dir)
//! ```
//!
//! The staging file always lives in the target's directory, so the rename
//! never crosses a filesystem boundary. A symlink at the target path is
//! replaced by a regular file rather than followed.
//!
//! ```no_run
//! use planck::{atomic_write, AtomicWriteOptions};
//!
//! let options = AtomicWriteOptions::new().preserve_mode(true);
//! atomic_write("/etc/app/config.yml", b"key: value\n", options)?;
//! # Ok::<(), planck::AtomicWriteError>(())
//! ```

pub mod atomic;
pub mod error;
mod fs_ops;
pub mod options;

#[cfg(unix)]
pub use atomic::DEFAULT_MODE;
pub use atomic::{atomic_write, atomic_write_with, staging_prefix};
pub use error::{AtomicWriteError, AtomicWriteResult};
pub use options::AtomicWriteOptions;
