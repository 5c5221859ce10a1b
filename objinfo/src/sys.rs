//! Raw `bpf(2)` exchanges
//!
//! Thin wrappers around `syscall(SYS_bpf, cmd, attr, size)`. Errors come back
//! as `io::Error` carrying the kernel's errno so callers can classify them.

#![allow(unsafe_code)] // bpf(2) has no safe libc wrapper

use objinfo_common::{BpfMapInfo, BpfProgInfo, ObjGetAttr, ObjGetInfoByFdAttr};
use objinfo_common::{BPF_OBJ_GET, BPF_OBJ_GET_INFO_BY_FD};
use std::ffi::CString;
use std::io;
use std::mem::size_of;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Kernel reply records accepted by [`obj_get_info_by_fd`].
///
/// Implementors are `#[repr(C)]`, contain only integers and byte arrays, and
/// are valid when all-zero.
pub trait InfoRecord: Default + Copy + sealed::Sealed {}

impl InfoRecord for BpfMapInfo {}
impl InfoRecord for BpfProgInfo {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for objinfo_common::BpfMapInfo {}
    impl Sealed for objinfo_common::BpfProgInfo {}
}

/// Issue a `bpf(2)` command.
///
/// # Safety
/// `attr` must be the attribute record `cmd` expects, and every pointer it
/// carries must be valid for the access the kernel performs.
pub unsafe fn bpf<T>(cmd: u32, attr: &mut T) -> io::Result<libc::c_long> {
    let size = libc::c_uint::try_from(size_of::<T>())
        .map_err(|_| io::Error::from_raw_os_error(libc::E2BIG))?;

    let ret = libc::syscall(
        libc::SYS_bpf,
        libc::c_long::from(cmd),
        std::ptr::from_mut(attr).cast::<libc::c_void>(),
        size,
    );
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret)
}

/// Issue a `bpf(2)` command that returns a new descriptor.
///
/// # Safety
/// Same contract as [`bpf`].
pub unsafe fn bpf_fd<T>(cmd: u32, attr: &mut T) -> io::Result<OwnedFd> {
    let ret = bpf(cmd, attr)?;
    let fd = libc::c_int::try_from(ret).map_err(|_| io::Error::other("bpf() fd out of range"))?;
    Ok(OwnedFd::from_raw_fd(fd))
}

/// `BPF_OBJ_GET_INFO_BY_FD`: one request/response exchange for `fd`.
///
/// # Errors
/// Returns the kernel's errno; `EINVAL` on kernels older than 4.13.
pub fn obj_get_info_by_fd<T: InfoRecord>(fd: BorrowedFd<'_>) -> io::Result<T> {
    let bpf_fd =
        u32::try_from(fd.as_raw_fd()).map_err(|_| io::Error::from_raw_os_error(libc::EBADF))?;
    let mut info = T::default();
    let mut attr = ObjGetInfoByFdAttr {
        bpf_fd,
        info_len: u32::try_from(size_of::<T>()).unwrap_or(u32::MAX),
        info: std::ptr::from_mut(&mut info) as u64,
    };

    // SAFETY: `info` outlives the call and `info_len` is its exact size.
    unsafe { bpf(BPF_OBJ_GET_INFO_BY_FD, &mut attr)? };
    Ok(info)
}

/// Whether the kernel knows `BPF_OBJ_GET_INFO_BY_FD`.
///
/// Asks about a descriptor that can't exist: kernels with the command reject
/// it with `EBADF`, older ones reject the command itself with `EINVAL`.
///
/// # Errors
/// Any other errno, e.g. `EPERM` when `bpf(2)` is filtered.
pub fn obj_get_info_by_fd_supported() -> io::Result<bool> {
    let mut info = BpfMapInfo::default();
    let mut attr = ObjGetInfoByFdAttr {
        bpf_fd: u32::MAX,
        info_len: u32::try_from(size_of::<BpfMapInfo>()).unwrap_or(u32::MAX),
        info: std::ptr::from_mut(&mut info) as u64,
    };

    // SAFETY: `info` outlives the call and `info_len` is its exact size.
    match unsafe { bpf(BPF_OBJ_GET_INFO_BY_FD, &mut attr) } {
        Ok(_) => Ok(true),
        Err(err) => match err.raw_os_error() {
            Some(libc::EBADF) => Ok(true),
            Some(libc::EINVAL) => Ok(false),
            _ => Err(err),
        },
    }
}

/// `BPF_OBJ_GET`: open an object pinned in bpffs.
///
/// The returned descriptor belongs to the caller.
///
/// # Errors
/// Returns the kernel's errno, or `InvalidInput` if `path` contains a NUL.
pub fn obj_get(path: &Path) -> io::Result<OwnedFd> {
    let pathname = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut attr = ObjGetAttr { pathname: pathname.as_ptr() as u64, ..ObjGetAttr::default() };

    // SAFETY: `pathname` is NUL-terminated and outlives the call.
    unsafe { bpf_fd(BPF_OBJ_GET, &mut attr) }
}
