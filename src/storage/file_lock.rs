use std::fs::{File, OpenOptions};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::layout::IndexLayout;

/// Single builder per index: held for the duration of a build phase
pub struct FileLock {
    pub file: File,
}

impl FileLock {
    pub fn acquire(layout: &IndexLayout) -> Result<Self> {
        let lock_path = layout.lock_path();

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::io_context("index lock", &lock_path, e))?;

        // Platform-specific locking
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            unsafe {
                if flock(fd, LOCK_EX | LOCK_NB) != 0 {
                    return Err(Error::new(
                        ErrorKind::InvalidState,
                        format!("index {} is locked by another builder", lock_path.display()),
                    ));
                }
            }
        }

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}
