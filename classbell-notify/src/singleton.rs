//! One notification service per data directory.
//!
//! The lock file sits next to the schedule it serves and holds the pid of
//! the running service, so a second start can say who is in the way.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fs2::FileExt;

const LOCK_FILE: &str = ".notify.lock";

/// Held for the lifetime of the service; the lock is released on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Lock `data_dir` for this process, failing if another service holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Could not create {}", data_dir.display()))?;
        let path = data_dir.join(LOCK_FILE);

        // Not truncated on open: until we hold the lock the pid belongs to the holder.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Could not open lock file {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            match holder_pid(&mut file) {
                Some(pid) => bail!(
                    "classbell-notify is already running for {} (pid {pid})",
                    data_dir.display()
                ),
                None => bail!(
                    "classbell-notify is already running for {}.\n\
                    If you believe this is an error, remove: {}",
                    data_dir.display(),
                    path.display()
                ),
            }
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        tracing::debug!(lock = %path.display(), pid = std::process::id(), "Instance lock acquired");
        Ok(InstanceLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = FileExt::unlock(&self.file);
    }
}

fn holder_pid(file: &mut File) -> Option<u32> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}
