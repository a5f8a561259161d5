//! Scoped redirection of the process-level stderr (fd 2) to the null device.
//!
//! Native inference code writes diagnostics straight to fd 2, bypassing any
//! Rust-level writer, and child processes inherit fd 2. While a
//! [`StderrSilencer`] is alive those writes are discarded; dropping it
//! restores the original descriptor on every exit path, including `?` and
//! unwinding.

use std::io;

/// Guard holding a duplicate of the original stderr descriptor.
pub struct StderrSilencer {
    #[cfg(unix)]
    saved_fd: libc::c_int,
    #[cfg(not(unix))]
    _private: (),
}

impl std::fmt::Debug for StderrSilencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StderrSilencer").finish_non_exhaustive()
    }
}

impl StderrSilencer {
    /// Point fd 2 at the null device until the guard is dropped.
    #[cfg(unix)]
    pub fn engage() -> io::Result<Self> {
        use std::os::unix::io::AsRawFd;

        let devnull = std::fs::OpenOptions::new().write(true).open("/dev/null")?;

        // SAFETY: dup/dup2/close operate on descriptors we own or on fd 2,
        // which is always open in a normally started process.
        unsafe {
            let saved_fd = libc::dup(libc::STDERR_FILENO);
            if saved_fd < 0 {
                return Err(io::Error::last_os_error());
            }
            if libc::dup2(devnull.as_raw_fd(), libc::STDERR_FILENO) < 0 {
                let err = io::Error::last_os_error();
                libc::close(saved_fd);
                return Err(err);
            }
            Ok(Self { saved_fd })
        }
    }

    #[cfg(not(unix))]
    pub fn engage() -> io::Result<Self> {
        Ok(Self { _private: () })
    }

    /// Engage only when `enabled`; failures are logged and leave stderr untouched.
    pub fn engage_if(enabled: bool) -> Option<Self> {
        if !enabled {
            return None;
        }
        match Self::engage() {
            Ok(guard) => Some(guard),
            Err(e) => {
                tracing::warn!("failed to silence stderr: {e}");
                None
            }
        }
    }
}

impl Drop for StderrSilencer {
    fn drop(&mut self) {
        #[cfg(unix)]
        restore_stderr(self.saved_fd);
    }
}

#[cfg(unix)]
fn restore_stderr(saved_fd: libc::c_int) {
    // SAFETY: `saved_fd` is a descriptor duplicated in `engage` and owned
    // exclusively by the guard being dropped.
    unsafe {
        libc::dup2(saved_fd, libc::STDERR_FILENO);
        libc::close(saved_fd);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;

    fn identity(fd: libc::c_int) -> (u64, u64) {
        // SAFETY: `stat` is plain old data; fstat fills it for a valid fd.
        unsafe {
            let mut st: libc::stat = std::mem::zeroed();
            assert_eq!(libc::fstat(fd, &mut st), 0, "fstat failed for fd {fd}");
            (st.st_dev as u64, st.st_ino as u64)
        }
    }

    fn devnull_identity() -> (u64, u64) {
        use std::os::unix::io::AsRawFd;
        let file = std::fs::File::open("/dev/null").expect("open /dev/null");
        identity(file.as_raw_fd())
    }

    #[test]
    #[serial]
    fn test_engage_redirects_and_drop_restores() {
        let original = identity(libc::STDERR_FILENO);
        {
            let _guard = StderrSilencer::engage().expect("engage should succeed");
            assert_eq!(identity(libc::STDERR_FILENO), devnull_identity());
        }
        assert_eq!(identity(libc::STDERR_FILENO), original);
    }

    #[test]
    #[serial]
    fn test_restores_on_early_return() {
        fn failing_step() -> anyhow::Result<()> {
            let _guard = StderrSilencer::engage()?;
            anyhow::bail!("load failed");
        }

        let original = identity(libc::STDERR_FILENO);
        assert!(failing_step().is_err());
        assert_eq!(identity(libc::STDERR_FILENO), original);
    }

    #[test]
    #[serial]
    fn test_nested_guards_restore_in_order() {
        let original = identity(libc::STDERR_FILENO);
        {
            let _outer = StderrSilencer::engage().expect("silencer should engage");
            {
                let _inner = StderrSilencer::engage().expect("silencer should engage");
            }
            assert_eq!(identity(libc::STDERR_FILENO), devnull_identity());
        }
        assert_eq!(identity(libc::STDERR_FILENO), original);
    }

    #[test]
    #[serial]
    fn test_engage_if_disabled_is_noop() {
        let original = identity(libc::STDERR_FILENO);
        let guard = StderrSilencer::engage_if(false);
        assert!(guard.is_none());
        assert_eq!(identity(libc::STDERR_FILENO), original);
    }
}
