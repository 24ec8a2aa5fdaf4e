//! Exclusive advisory lock on a file, shared across processes

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Interval between lock attempts while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Holds an exclusive lock on `lock_path` until dropped
#[derive(Debug)]
pub struct ExclusiveFileLock {
    lock_file: File,
    lock_path: PathBuf,
    pid: u32,
}

impl ExclusiveFileLock {
    /// Try once to take the lock without waiting
    pub fn try_acquire(lock_path: &Path) -> io::Result<Self> {
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {
                let pid = std::process::id();
                lock_file.set_len(0)?;
                writeln!(lock_file, "{pid}")?;
                lock_file.sync_all()?;

                Ok(Self {
                    lock_file,
                    lock_path: lock_path.to_path_buf(),
                    pid,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || is_contended(&e) => {
                let holder = fs::read_to_string(lock_path)
                    .ok()
                    .and_then(|contents| contents.trim().parse::<u32>().ok());
                Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    match holder {
                        Some(pid) => format!(
                            "{} is locked by process {pid}",
                            lock_path.display()
                        ),
                        None => format!("{} is locked by another process", lock_path.display()),
                    },
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Wait up to `timeout` for the lock, then give up with `WouldBlock`
    pub fn acquire(lock_path: &Path, timeout: Duration) -> io::Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            match Self::try_acquire(lock_path) {
                Ok(lock) => return Ok(lock),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(e);
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline - now));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// PID recorded by the holder of this lock
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for ExclusiveFileLock {
    fn drop(&mut self) {
        // The file stays in place; removing it would let a waiter lock a stale inode
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

fn is_contended(error: &io::Error) -> bool {
    error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
