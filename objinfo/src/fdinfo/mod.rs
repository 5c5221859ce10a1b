//! Textual descriptor information from `/proc`
//!
//! Every open descriptor has a record at `/proc/<pid>/fdinfo/<fd>` and a
//! link at `/proc/<pid>/fd/<fd>`. For BPF objects the record carries the
//! same metadata `BPF_OBJ_GET_INFO_BY_FD` reports, and it predates that
//! command, which makes it the fallback source on old kernels.

pub mod scanner;

pub use scanner::{scan_fields, Field, Slot};

use log::debug;
use std::fs::{self, File};
use std::io::BufReader;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::PathBuf;

use crate::domain::{Backend, InfoError, ObjectKind, ScanError};

/// Default mount point of procfs
pub const PROC_ROOT: &str = "/proc";

/// Locates descriptor records of the current process below a proc root.
///
/// The pid is looked up on every call so a forked child reads its own
/// records.
#[derive(Debug, Clone)]
pub struct FdInfoSource {
    proc_root: PathBuf,
}

impl Default for FdInfoSource {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl FdInfoSource {
    #[must_use]
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self { proc_root: proc_root.into() }
    }

    /// `<root>/<pid>/fdinfo/<fd>`
    #[must_use]
    pub fn record_path(&self, fd: BorrowedFd<'_>) -> PathBuf {
        self.proc_root.join(format!("{}/fdinfo/{}", std::process::id(), fd.as_raw_fd()))
    }

    /// `<root>/<pid>/fd/<fd>`
    #[must_use]
    pub fn link_path(&self, fd: BorrowedFd<'_>) -> PathBuf {
        self.proc_root.join(format!("{}/fd/{}", std::process::id(), fd.as_raw_fd()))
    }

    /// Open the descriptor's record and hand it to `parse`.
    ///
    /// # Errors
    /// - [`InfoError::Unresolvable`] if the record cannot be opened, usually
    ///   because the descriptor was closed
    /// - [`InfoError::Malformed`] if `parse` fails
    pub fn read<T>(
        &self,
        fd: BorrowedFd<'_>,
        parse: impl FnOnce(BufReader<File>) -> Result<T, ScanError>,
    ) -> Result<T, InfoError> {
        let path = self.record_path(fd);
        debug!("Reading {}", path.display());

        let file = File::open(&path).map_err(|source| InfoError::Unresolvable {
            fd: fd.as_raw_fd(),
            backend: Backend::FdInfo,
            source,
        })?;

        parse(BufReader::new(file)).map_err(|source| InfoError::Malformed { path, source })
    }

    /// Classify what `fd` refers to from its `/proc` link target.
    ///
    /// # Errors
    /// Returns [`InfoError::Unresolvable`] if the link cannot be read.
    pub fn object_kind(&self, fd: BorrowedFd<'_>) -> Result<ObjectKind, InfoError> {
        let target = fs::read_link(self.link_path(fd)).map_err(|source| {
            InfoError::Unresolvable { fd: fd.as_raw_fd(), backend: Backend::FdInfo, source }
        })?;
        Ok(ObjectKind::from_link_target(&target.to_string_lossy()))
    }
}
