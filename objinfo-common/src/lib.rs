//! # Kernel ABI Definitions (`bpf(2)`)
//!
//! Plain `#[repr(C)]` mirrors of the `union bpf_attr` variants and info
//! records exchanged with the kernel through the `bpf(2)` syscall. Userspace
//! fills an attribute record, passes a pointer plus its size, and the kernel
//! reads (and for info queries, writes back) the fields it knows about.
//!
//! ## Compatibility Rules
//!
//! The kernel accepts records that are *shorter* than its own definition and
//! truncates the reply to the length we pass. A record that is *longer* is
//! only accepted if every unknown trailing byte is zero. All records here
//! are therefore `Default` (all-zero) and only declare the prefix of each
//! kernel structure that userspace actually reads.
//!
//! ## Key Types
//!
//! - [`ObjGetInfoByFdAttr`] - request for `BPF_OBJ_GET_INFO_BY_FD`
//! - [`BpfMapInfo`] / [`BpfProgInfo`] - reply records
//! - [`ObjGetAttr`] - open a pinned object (`BPF_OBJ_GET`)
//! - [`MapCreateAttr`] / [`ProgLoadAttr`] / [`BpfInsn`] - object creation,
//!   used by test fixtures

#![no_std]

// ============================================================================
// Command Numbers (enum bpf_cmd)
// ============================================================================

/// Create a map, returns a new descriptor
pub const BPF_MAP_CREATE: u32 = 0;

/// Verify and load a program, returns a new descriptor
pub const BPF_PROG_LOAD: u32 = 5;

/// Open an object pinned in bpffs, returns a new descriptor
pub const BPF_OBJ_GET: u32 = 7;

/// Query metadata of a map/program/link/BTF descriptor
///
/// Added in Linux 4.13. Older kernels reject the unknown command with
/// `EINVAL`, which is the signal to fall back to `/proc/<pid>/fdinfo`.
pub const BPF_OBJ_GET_INFO_BY_FD: u32 = 15;

// ============================================================================
// Sizes
// ============================================================================

/// Length of a program tag in bytes (hash prefix of the instruction stream)
pub const BPF_TAG_SIZE: usize = 8;

/// Maximum object name length, including the trailing NUL
pub const BPF_OBJ_NAME_LEN: usize = 16;

/// `map_flags` bit: allocate hash map elements on demand
pub const BPF_F_NO_PREALLOC: u32 = 1 << 0;

// ============================================================================
// Query Records
// ============================================================================

/// Attribute for `BPF_OBJ_GET_INFO_BY_FD`
///
/// `info_len` is in/out: the caller passes the size of the buffer at `info`,
/// the kernel writes back how many bytes it filled.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug)]
pub struct ObjGetInfoByFdAttr {
    pub bpf_fd: u32,
    pub info_len: u32,
    pub info: u64,
}

/// Prefix of `struct bpf_map_info`
///
/// Fields past `map_extra` are never read and are not declared.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug)]
pub struct BpfMapInfo {
    pub map_type: u32,
    pub id: u32,
    pub key_size: u32,
    pub value_size: u32,
    pub max_entries: u32,
    pub map_flags: u32,
    /// Object name, NUL-padded (empty before Linux 4.15)
    pub name: [u8; BPF_OBJ_NAME_LEN],
    pub ifindex: u32,
    pub btf_vmlinux_value_type_id: u32,
    pub netns_dev: u64,
    pub netns_ino: u64,
    pub btf_id: u32,
    pub btf_key_type_id: u32,
    pub btf_value_type_id: u32,
    pub btf_vmlinux_id: u32,
    pub map_extra: u64,
}

/// Prefix of `struct bpf_prog_info`, up to and including `netns_ino`
///
/// All pointer/length pairs stay zero so the kernel copies out no
/// variable-length arrays.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug)]
pub struct BpfProgInfo {
    pub prog_type: u32,
    pub id: u32,
    /// Program tag, a [`BPF_TAG_SIZE`] byte hash prefix of the instructions
    pub tag: [u8; BPF_TAG_SIZE],
    pub jited_prog_len: u32,
    pub xlated_prog_len: u32,
    pub jited_prog_insns: u64,
    pub xlated_prog_insns: u64,
    pub load_time: u64,
    pub created_by_uid: u32,
    pub nr_map_ids: u32,
    pub map_ids: u64,
    /// Object name, NUL-padded (empty before Linux 4.15)
    pub name: [u8; BPF_OBJ_NAME_LEN],
    pub ifindex: u32,
    /// Bit 0: `gpl_compatible`, remaining bits reserved
    pub gpl_compatible: u32,
    pub netns_dev: u64,
    pub netns_ino: u64,
}

/// Attribute for `BPF_OBJ_GET`
#[repr(C)]
#[derive(Clone, Copy, Default, Debug)]
pub struct ObjGetAttr {
    /// Pointer to a NUL-terminated path inside bpffs
    pub pathname: u64,
    pub bpf_fd: u32,
    pub file_flags: u32,
}

// ============================================================================
// Creation Records
// ============================================================================

/// Prefix of the `BPF_MAP_CREATE` attribute
#[repr(C)]
#[derive(Clone, Copy, Default, Debug)]
pub struct MapCreateAttr {
    pub map_type: u32,
    pub key_size: u32,
    pub value_size: u32,
    pub max_entries: u32,
    pub map_flags: u32,
    /// Template map for map-in-map types, 0 otherwise
    pub inner_map_fd: u32,
    pub numa_node: u32,
    pub map_name: [u8; BPF_OBJ_NAME_LEN],
}

/// Prefix of the `BPF_PROG_LOAD` attribute
#[repr(C)]
#[derive(Clone, Copy, Default, Debug)]
pub struct ProgLoadAttr {
    pub prog_type: u32,
    pub insn_cnt: u32,
    /// Pointer to an array of [`BpfInsn`]
    pub insns: u64,
    /// Pointer to a NUL-terminated license string
    pub license: u64,
    pub log_level: u32,
    pub log_size: u32,
    pub log_buf: u64,
    pub kern_version: u32,
    pub prog_flags: u32,
    pub prog_name: [u8; BPF_OBJ_NAME_LEN],
}

/// One eBPF instruction (`struct bpf_insn`)
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct BpfInsn {
    pub code: u8,
    /// Low nibble: destination register, high nibble: source register
    pub regs: u8,
    pub off: i16,
    pub imm: i32,
}

impl BpfInsn {
    #[must_use]
    pub const fn new(code: u8, dst: u8, src: u8, off: i16, imm: i32) -> Self {
        Self { code, regs: (src << 4) | (dst & 0x0f), off, imm }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Copy `name` into a NUL-padded object name, truncating to leave room for
/// the terminator.
#[must_use]
pub fn object_name(name: &str) -> [u8; BPF_OBJ_NAME_LEN] {
    let mut out = [0u8; BPF_OBJ_NAME_LEN];
    let bytes = name.as_bytes();
    let copy_len = bytes.len().min(BPF_OBJ_NAME_LEN - 1);
    out[..copy_len].copy_from_slice(&bytes[..copy_len]);
    out
}
