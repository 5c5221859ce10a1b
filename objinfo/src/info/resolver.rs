//! # Descriptor Info Resolver
//!
//! Recovers [`MapInfo`] / [`ProgramInfo`] for a descriptor from one of two
//! backends:
//!
//! - **Native**: `BPF_OBJ_GET_INFO_BY_FD` (Linux 4.13+)
//! - **FdInfo**: the textual `/proc/<pid>/fdinfo/<fd>` record
//!
//! The first automatic query checks the kernel once for the command, and the
//! answer is pinned for the lifetime of the resolver:
//!
//! ```text
//!            check: EBADF                    check: EINVAL
//!   NATIVE <────────────── UNKNOWN ──────────────────────> FDINFO
//!                             │
//!                             └── check failed otherwise: stay, query natively
//! ```
//!
//! The check names a descriptor that can't exist, so its `EINVAL` can only
//! mean the command is unknown. On a kernel with the command every native
//! error, `EINVAL` for a non-BPF descriptor included, reaches the caller
//! unchanged.

use log::{debug, info};
use objinfo_common::{BpfMapInfo, BpfProgInfo};
use std::fs::File;
use std::io::{self, BufReader};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use super::{MapInfo, ProgramInfo};
use crate::domain::{Backend, InfoError, ObjectKind, ScanError};
use crate::fdinfo::FdInfoSource;
use crate::sys::{self, InfoRecord};

const UNKNOWN: u8 = 0;
const NATIVE: u8 = 1;
const FDINFO: u8 = 2;

/// Answers whether the kernel knows `BPF_OBJ_GET_INFO_BY_FD`.
type SupportCheck = fn() -> io::Result<bool>;

/// One native exchange for a descriptor.
type NativeQuery<K> = fn(BorrowedFd<'_>) -> io::Result<K>;

/// Metadata types both backends produce.
trait Resolvable: Sized {
    type Record: InfoRecord;

    /// Category of descriptor the native record belongs to
    const KIND: ObjectKind;

    fn from_kernel(record: &Self::Record) -> Self;
    fn scan(reader: BufReader<File>) -> Result<Self, ScanError>;
}

impl Resolvable for MapInfo {
    type Record = BpfMapInfo;
    const KIND: ObjectKind = ObjectKind::Map;

    fn from_kernel(record: &BpfMapInfo) -> Self {
        MapInfo::from_kernel(record)
    }

    fn scan(reader: BufReader<File>) -> Result<Self, ScanError> {
        MapInfo::scan(reader)
    }
}

impl Resolvable for ProgramInfo {
    type Record = BpfProgInfo;
    const KIND: ObjectKind = ObjectKind::Program;

    fn from_kernel(record: &BpfProgInfo) -> Self {
        ProgramInfo::from_kernel(record)
    }

    fn scan(reader: BufReader<File>) -> Result<Self, ScanError> {
        ProgramInfo::scan(reader)
    }
}

/// Resolves object metadata, remembering which backend the kernel supports.
///
/// Queries are read-only and may run concurrently on the same resolver and
/// even the same descriptor.
#[derive(Debug)]
pub struct Resolver {
    source: FdInfoSource,
    support: AtomicU8,
    check_support: SupportCheck,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::with_source(FdInfoSource::default())
    }
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read fdinfo records below `proc_root` instead of `/proc`.
    #[must_use]
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self::with_source(FdInfoSource::new(proc_root))
    }

    fn with_source(source: FdInfoSource) -> Self {
        Self { source, support: AtomicU8::new(UNKNOWN), check_support: sys::obj_get_info_by_fd_supported }
    }

    /// Process-wide resolver used by [`map_info`] and [`program_info`].
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Resolver> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// The backend this resolver has settled on, if it has checked yet.
    pub fn pinned_backend(&self) -> Option<Backend> {
        match self.support.load(Ordering::Acquire) {
            NATIVE => Some(Backend::Native),
            FDINFO => Some(Backend::FdInfo),
            _ => None,
        }
    }

    /// # Errors
    /// See [`InfoError`]; `NotSupported` is never returned here.
    pub fn map_info(&self, fd: impl AsFd) -> Result<MapInfo, InfoError> {
        self.resolve(fd.as_fd(), sys::obj_get_info_by_fd)
    }

    /// # Errors
    /// See [`InfoError`]; `NotSupported` is never returned here.
    pub fn program_info(&self, fd: impl AsFd) -> Result<ProgramInfo, InfoError> {
        self.resolve(fd.as_fd(), sys::obj_get_info_by_fd)
    }

    /// Query exactly one backend, without fallback or pinning.
    ///
    /// # Errors
    /// Returns [`InfoError::NotSupported`] if `backend` is native and the
    /// kernel lacks `BPF_OBJ_GET_INFO_BY_FD`.
    pub fn map_info_with(&self, fd: impl AsFd, backend: Backend) -> Result<MapInfo, InfoError> {
        self.query(fd.as_fd(), backend, sys::obj_get_info_by_fd)
    }

    /// Query exactly one backend, without fallback or pinning.
    ///
    /// # Errors
    /// Returns [`InfoError::NotSupported`] if `backend` is native and the
    /// kernel lacks `BPF_OBJ_GET_INFO_BY_FD`.
    pub fn program_info_with(
        &self,
        fd: impl AsFd,
        backend: Backend,
    ) -> Result<ProgramInfo, InfoError> {
        self.query(fd.as_fd(), backend, sys::obj_get_info_by_fd)
    }

    /// Classify `fd` through its `/proc` link.
    ///
    /// # Errors
    /// Returns [`InfoError::Unresolvable`] if the descriptor is not open.
    pub fn object_kind(&self, fd: impl AsFd) -> Result<ObjectKind, InfoError> {
        self.source.object_kind(fd.as_fd())
    }

    fn resolve<T: Resolvable>(
        &self,
        fd: BorrowedFd<'_>,
        native: NativeQuery<T::Record>,
    ) -> Result<T, InfoError> {
        match self.backend() {
            Backend::FdInfo => self.source.read(fd, T::scan),
            Backend::Native => {
                let record = native(fd).map_err(|err| classify(fd, err))?;
                self.accept_native(fd, &record)
            }
        }
    }

    fn query<T: Resolvable>(
        &self,
        fd: BorrowedFd<'_>,
        backend: Backend,
        native: NativeQuery<T::Record>,
    ) -> Result<T, InfoError> {
        match backend {
            Backend::Native => {
                let record = native(fd).map_err(|err| {
                    if is_einval(&err) && !self.native_supported() {
                        InfoError::NotSupported { operation: "BPF_OBJ_GET_INFO_BY_FD" }
                    } else {
                        classify(fd, err)
                    }
                })?;
                self.accept_native(fd, &record)
            }
            Backend::FdInfo => self.source.read(fd, T::scan),
        }
    }

    /// The kernel fills in whatever record the descriptor's category has, so
    /// the reply is only trusted once the `/proc` link agrees with `T`. When
    /// the link can't be read the reply is taken as is.
    fn accept_native<T: Resolvable>(
        &self,
        fd: BorrowedFd<'_>,
        record: &T::Record,
    ) -> Result<T, InfoError> {
        match self.source.object_kind(fd) {
            Ok(actual) if actual != T::KIND => {
                return Err(InfoError::WrongKind { fd: fd.as_raw_fd(), expected: T::KIND, actual });
            }
            Ok(_) => {}
            Err(err) => debug!("Can't classify descriptor {}: {err}", fd.as_raw_fd()),
        }
        Ok(T::from_kernel(record))
    }

    /// Backend for automatic queries, probing the kernel on first use.
    fn backend(&self) -> Backend {
        match self.support.load(Ordering::Acquire) {
            NATIVE => return Backend::Native,
            FDINFO => return Backend::FdInfo,
            _ => {}
        }

        let mode = match (self.check_support)() {
            Ok(true) => NATIVE,
            Ok(false) => FDINFO,
            Err(err) => {
                debug!("Can't check for BPF_OBJ_GET_INFO_BY_FD: {err}");
                return Backend::Native;
            }
        };

        // A concurrent check may have pinned first; its answer stands
        if self.pin(mode) == FDINFO {
            Backend::FdInfo
        } else {
            Backend::Native
        }
    }

    /// Whether the native command exists, without pinning anything.
    fn native_supported(&self) -> bool {
        match self.support.load(Ordering::Acquire) {
            NATIVE => true,
            FDINFO => false,
            _ => (self.check_support)().unwrap_or(true),
        }
    }

    /// Move from UNKNOWN to `mode`; returns the mode that ends up pinned.
    fn pin(&self, mode: u8) -> u8 {
        match self.support.compare_exchange(UNKNOWN, mode, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                if mode == FDINFO {
                    info!("Kernel lacks BPF_OBJ_GET_INFO_BY_FD, using /proc fdinfo from now on");
                }
                mode
            }
            Err(current) => current,
        }
    }
}

fn is_einval(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINVAL)
}

fn classify(fd: BorrowedFd<'_>, err: io::Error) -> InfoError {
    if err.raw_os_error() == Some(libc::EBADF) {
        InfoError::Unresolvable { fd: fd.as_raw_fd(), backend: Backend::Native, source: err }
    } else {
        InfoError::Query(err)
    }
}

/// Metadata of the map behind `fd`, via [`Resolver::global`].
///
/// # Errors
/// See [`Resolver::map_info`].
pub fn map_info(fd: impl AsFd) -> Result<MapInfo, InfoError> {
    Resolver::global().map_info(fd)
}

/// Metadata of the program behind `fd`, via [`Resolver::global`].
///
/// # Errors
/// See [`Resolver::program_info`].
pub fn program_info(fd: impl AsFd) -> Result<ProgramInfo, InfoError> {
    Resolver::global().program_info(fd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MapType, ProgramType};
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::path::Path;

    const HASH_RECORD: &str =
        "pos:\t0\nmap_type:\t1\nkey_size:\t4\nvalue_size:\t5\nmax_entries:\t2\nmap_flags:\t0x1\n";

    fn write_record(root: &Path, fd: BorrowedFd<'_>, contents: &str) {
        let dir = root.join(format!("{}/fdinfo", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(fd.as_raw_fd().to_string()), contents).unwrap();
    }

    fn write_link(root: &Path, fd: BorrowedFd<'_>, target: &str) {
        let dir = root.join(format!("{}/fd", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        symlink(target, dir.join(fd.as_raw_fd().to_string())).unwrap();
    }

    fn resolver_with(root: &Path, check_support: SupportCheck) -> Resolver {
        Resolver { check_support, ..Resolver::with_proc_root(root) }
    }

    fn supported() -> io::Result<bool> {
        Ok(true)
    }

    fn unsupported() -> io::Result<bool> {
        Ok(false)
    }

    fn filtered() -> io::Result<bool> {
        Err(io::Error::from_raw_os_error(libc::EPERM))
    }

    fn fails_with<K, const ERRNO: i32>(_: BorrowedFd<'_>) -> io::Result<K> {
        Err(io::Error::from_raw_os_error(ERRNO))
    }

    fn never_called<K>(_: BorrowedFd<'_>) -> io::Result<K> {
        panic!("native query issued on a kernel without it");
    }

    fn empty_record<K: InfoRecord>(_: BorrowedFd<'_>) -> io::Result<K> {
        Ok(K::default())
    }

    #[test]
    fn test_forced_fdinfo_map() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), HASH_RECORD);

        let resolver = Resolver::with_proc_root(root.path());
        let info = resolver.map_info_with(&file, Backend::FdInfo).unwrap();

        assert_eq!(info.map_type(), MapType::Hash);
        assert_eq!((info.key_size(), info.value_size(), info.max_entries()), (4, 5, 2));
        assert_eq!(info.flags(), 1);
        assert_eq!(resolver.pinned_backend(), None);
    }

    #[test]
    fn test_forced_fdinfo_program() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), "prog_type:\t1\nprog_tag:\td7edec644f05498d\n");

        let resolver = Resolver::with_proc_root(root.path());
        let info = resolver.program_info_with(&file, Backend::FdInfo).unwrap();

        assert_eq!(info.program_type(), ProgramType::SocketFilter);
        assert_eq!(info.tag().to_string(), "d7edec644f05498d");
    }

    #[test]
    fn test_fallback_source_missing() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();

        let resolver = Resolver::with_proc_root(root.path());
        let err = resolver.map_info_with(&file, Backend::FdInfo).unwrap_err();
        assert!(matches!(err, InfoError::Unresolvable { backend: Backend::FdInfo, .. }));
    }

    #[test]
    fn test_malformed_record_surfaces() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), "map_type:\thash\n");

        let resolver = Resolver::with_proc_root(root.path());
        let err = resolver.map_info_with(&file, Backend::FdInfo).unwrap_err();
        assert!(matches!(
            err,
            InfoError::Malformed { source: ScanError::Decode { ref field, .. }, .. } if field == "map_type"
        ));
    }

    #[test]
    fn test_unsupported_kernel_falls_back_and_pins() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), HASH_RECORD);

        let resolver = resolver_with(root.path(), unsupported);
        let info = resolver.resolve::<MapInfo>(file.as_fd(), never_called).unwrap();

        assert_eq!(info.map_type(), MapType::Hash);
        assert_eq!(resolver.pinned_backend(), Some(Backend::FdInfo));

        // Pinned: later queries skip the check and the native query alike
        let again = resolver.resolve::<MapInfo>(file.as_fd(), never_called).unwrap();
        assert_eq!(info, again);
    }

    #[test]
    fn test_einval_on_supported_kernel_is_a_query_error() {
        // A usable fdinfo record must not hide the native answer
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), HASH_RECORD);

        let resolver = resolver_with(root.path(), supported);
        let err = resolver
            .resolve::<MapInfo>(file.as_fd(), fails_with::<_, { libc::EINVAL }>)
            .unwrap_err();

        assert!(matches!(err, InfoError::Query(ref e) if is_einval(e)), "got {err:?}");
        assert_eq!(resolver.pinned_backend(), Some(Backend::Native));
    }

    #[test]
    fn test_failed_support_check_pins_nothing() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();

        let resolver = resolver_with(root.path(), filtered);
        let err = resolver
            .resolve::<ProgramInfo>(file.as_fd(), fails_with::<_, { libc::EPERM }>)
            .unwrap_err();

        assert!(matches!(err, InfoError::Query(_)));
        assert_eq!(resolver.pinned_backend(), None);
    }

    #[test]
    fn test_native_ebadf_is_unresolvable() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();

        let resolver = resolver_with(root.path(), supported);
        let err = resolver
            .resolve::<MapInfo>(file.as_fd(), fails_with::<_, { libc::EBADF }>)
            .unwrap_err();
        assert!(matches!(err, InfoError::Unresolvable { backend: Backend::Native, .. }));
    }

    #[test]
    fn test_forced_native_distinguishes_einval() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();

        let old = resolver_with(root.path(), unsupported);
        let err = old
            .query::<MapInfo>(file.as_fd(), Backend::Native, fails_with::<_, { libc::EINVAL }>)
            .unwrap_err();
        assert!(err.is_not_supported());
        assert_eq!(old.pinned_backend(), None);

        let current = resolver_with(root.path(), supported);
        let err = current
            .query::<MapInfo>(file.as_fd(), Backend::Native, fails_with::<_, { libc::EINVAL }>)
            .unwrap_err();
        assert!(matches!(err, InfoError::Query(_)));
    }

    #[test]
    fn test_native_reply_for_other_kind_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_link(root.path(), file.as_fd(), "anon_inode:bpf-prog");

        let resolver = resolver_with(root.path(), supported);
        let err = resolver.resolve::<MapInfo>(file.as_fd(), empty_record).unwrap_err();
        assert!(matches!(
            err,
            InfoError::WrongKind { expected: ObjectKind::Map, actual: ObjectKind::Program, .. }
        ));

        let info = resolver.resolve::<ProgramInfo>(file.as_fd(), empty_record).unwrap();
        assert_eq!(info.program_type(), ProgramType::Unspecified);
    }

    #[test]
    fn test_non_bpf_descriptor_keeps_native_error() {
        let file = tempfile::tempfile().unwrap();
        let resolver = Resolver::new();

        let err = resolver.map_info(&file).unwrap_err();
        assert_ne!(resolver.pinned_backend(), Some(Backend::FdInfo));
        if resolver.pinned_backend() == Some(Backend::Native) {
            assert!(matches!(err, InfoError::Query(ref e) if is_einval(e)), "got {err:?}");
        }
    }

    #[test]
    fn test_pin_first_determination_wins() {
        let resolver = Resolver::new();
        assert_eq!(resolver.pin(NATIVE), NATIVE);
        assert_eq!(resolver.pin(FDINFO), NATIVE);
        assert_eq!(resolver.pinned_backend(), Some(Backend::Native));
    }

    static CONTENDED: OnceLock<Resolver> = OnceLock::new();

    fn unsupported_after_native_pin() -> io::Result<bool> {
        // Another caller settles on the native query while this check runs
        if let Some(resolver) = CONTENDED.get() {
            resolver.pin(NATIVE);
        }
        Ok(false)
    }

    #[test]
    fn test_support_check_loses_race_to_earlier_pin() {
        let resolver = CONTENDED.get_or_init(|| Resolver {
            check_support: unsupported_after_native_pin,
            ..Resolver::new()
        });

        assert_eq!(resolver.backend(), Backend::Native);
        assert_eq!(resolver.pinned_backend(), Some(Backend::Native));
    }

    #[test]
    fn test_concurrent_support_checks_agree() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), HASH_RECORD);
        let resolver = resolver_with(root.path(), unsupported);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| resolver.resolve::<MapInfo>(file.as_fd(), never_called)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap().max_entries(), 2);
            }
        });
        assert_eq!(resolver.pinned_backend(), Some(Backend::FdInfo));
    }

    #[test]
    fn test_pinned_fdinfo_skips_native() {
        let root = tempfile::tempdir().unwrap();
        let file = tempfile::tempfile().unwrap();
        write_record(root.path(), file.as_fd(), "prog_type:\t6\nprog_tag:\t0000000000000001\n");

        let resolver = Resolver::with_proc_root(root.path());
        resolver.pin(FDINFO);

        let info = resolver.program_info(&file).unwrap();
        assert_eq!(info.program_type(), ProgramType::Xdp);
    }
}
