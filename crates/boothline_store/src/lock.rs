//! Process-level write locking for the lead table.
//!
//! A second kiosk process pointed at the same table must not interleave
//! with a read-modify-rename in progress. Mutating operations hold an
//! exclusive advisory lock on a `.lock` sidecar for the whole sequence.
//!
//! Uses the `fs2` crate for cross-platform file locking (MSRV 1.75
//! compatible; std's `File::lock()` requires Rust 1.89+).

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A guard that holds the exclusive table lock.
///
/// The lock is released when the guard is dropped.
pub(crate) struct TableLockGuard {
    _file: File,
    lock_path: PathBuf,
}

impl Drop for TableLockGuard {
    fn drop(&mut self) {
        debug!("Releasing table lock: {}", self.lock_path.display());
        // File is automatically unlocked when closed (fs2 uses flock/LockFileEx)
    }
}

/// Get the lock sidecar path for a table path.
///
/// `/data/leads.csv` → `/data/leads.csv.lock`; `/data/leads` → `/data/leads.lock`.
pub(crate) fn lock_path_for(table_path: &Path) -> PathBuf {
    let mut lock_path = table_path.to_path_buf();
    match lock_path.extension() {
        Some(ext) => {
            let new_ext = format!("{}.lock", ext.to_string_lossy());
            lock_path.set_extension(new_ext);
        }
        None => {
            lock_path.set_extension("lock");
        }
    }
    lock_path
}

/// Acquire the exclusive table lock, waiting if another process holds it.
pub(crate) fn lock_exclusive(table_path: &Path) -> io::Result<TableLockGuard> {
    let lock_path = lock_path_for(table_path);

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;

    // Fully qualified call: std's File::try_lock_exclusive (Rust 1.89+)
    // would shadow fs2's method on newer toolchains.
    FileExt::lock_exclusive(&file)?;
    debug!("Acquired table lock: {}", lock_path.display());

    Ok(TableLockGuard {
        _file: file,
        lock_path,
    })
}
