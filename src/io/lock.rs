use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Lock file inside `tiles/`. It is left in place after use: unlinking it
/// would let a waiter and a newcomer lock two different inodes.
pub const LOCK_FILE: &str = ".lock";

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive hold on a library's `tiles/` directory.
///
/// Writers take it before reading settings.json and keep it until the save
/// is done, so two `tt` runs never interleave a read-modify-write. The
/// flock goes away with the descriptor when this is dropped.
pub struct LibraryLock {
    _held: File,
}

/// Error type for taking the library lock
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("could not lock {path}: {source}")]
    Flock { path: PathBuf, source: io::Error },
    #[error("library is busy: {path} still held after {}ms", .waited.as_millis())]
    Busy { path: PathBuf, waited: Duration },
}

impl LibraryLock {
    /// Take the lock on `data_dir`, retrying until `wait` has passed.
    /// A zero `wait` tries exactly once.
    pub fn acquire(data_dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + wait;
        loop {
            let locked = try_exclusive(&file).map_err(|source| LockError::Flock {
                path: path.clone(),
                source,
            })?;
            if locked {
                debug!(path = %path.display(), "library locked");
                return Ok(LibraryLock { _held: file });
            }
            if Instant::now() >= deadline {
                warn!(
                    path = %path.display(),
                    wait_ms = wait.as_millis() as u64,
                    "library lock still held"
                );
                return Err(LockError::Busy { path, waited: wait });
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }
}

/// Non-blocking exclusive flock. `Ok(false)` means someone else has it.
#[cfg(unix)]
fn try_exclusive(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(false),
        _ => Err(err),
    }
}

#[cfg(not(unix))]
fn try_exclusive(_file: &File) -> io::Result<bool> {
    Ok(true)
}
