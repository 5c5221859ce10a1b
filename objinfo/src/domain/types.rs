//! Kernel object kinds and the program tag
//!
//! Map and program types mirror `enum bpf_map_type` / `enum bpf_prog_type`.
//! Values the crate does not know about are kept as `Unknown(raw)` so that
//! newer kernels never make a query fail.

use objinfo_common::BPF_TAG_SIZE;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::errors::TagError;

/// Declares a kernel enumeration with a lossless `u32` conversion in both
/// directions and an `Unknown` catch-all.
macro_rules! kernel_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($variant,)*
            Unknown(u32),
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                match raw {
                    $($value => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(kind: $name) -> u32 {
                match kind {
                    $($name::$variant => $value,)*
                    $name::Unknown(raw) => raw,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Self::Unknown(raw) => write!(f, "Unknown({raw})"),
                    known => fmt::Debug::fmt(known, f),
                }
            }
        }
    };
}

kernel_enum! {
    /// Kind of a BPF map (`enum bpf_map_type`)
    pub enum MapType {
        Unspecified = 0,
        Hash = 1,
        Array = 2,
        ProgramArray = 3,
        PerfEventArray = 4,
        PerCpuHash = 5,
        PerCpuArray = 6,
        StackTrace = 7,
        CgroupArray = 8,
        LruHash = 9,
        LruPerCpuHash = 10,
        LpmTrie = 11,
        ArrayOfMaps = 12,
        HashOfMaps = 13,
        DevMap = 14,
        SockMap = 15,
        CpuMap = 16,
        XskMap = 17,
        SockHash = 18,
        CgroupStorage = 19,
        ReusePortSockArray = 20,
        PerCpuCgroupStorage = 21,
        Queue = 22,
        Stack = 23,
        SkStorage = 24,
        DevMapHash = 25,
        StructOps = 26,
        RingBuf = 27,
        InodeStorage = 28,
        TaskStorage = 29,
        BloomFilter = 30,
        UserRingBuf = 31,
        CgrpStorage = 32,
        Arena = 33,
    }
}

kernel_enum! {
    /// Kind of a BPF program (`enum bpf_prog_type`)
    pub enum ProgramType {
        Unspecified = 0,
        SocketFilter = 1,
        Kprobe = 2,
        SchedCls = 3,
        SchedAct = 4,
        TracePoint = 5,
        Xdp = 6,
        PerfEvent = 7,
        CgroupSkb = 8,
        CgroupSock = 9,
        LwtIn = 10,
        LwtOut = 11,
        LwtXmit = 12,
        SockOps = 13,
        SkSkb = 14,
        CgroupDevice = 15,
        SkMsg = 16,
        RawTracePoint = 17,
        CgroupSockAddr = 18,
        LwtSeg6Local = 19,
        LircMode2 = 20,
        SkReuseport = 21,
        FlowDissector = 22,
        CgroupSysctl = 23,
        RawTracePointWritable = 24,
        CgroupSockopt = 25,
        Tracing = 26,
        StructOps = 27,
        Extension = 28,
        Lsm = 29,
        SkLookup = 30,
        Syscall = 31,
        Netfilter = 32,
    }
}

/// Fingerprint of a loaded instruction stream.
///
/// The kernel computes it as a [`BPF_TAG_SIZE`] byte hash prefix over the
/// program with map references zeroed, so the same bytecode carries the same
/// tag on a given kernel. Older kernels hash with SHA-1, newer ones with
/// SHA-256. `BPF_OBJ_GET_INFO_BY_FD` reports raw bytes, fdinfo
/// prints them as lowercase hex; both end up as the same value here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgramTag([u8; BPF_TAG_SIZE]);

impl ProgramTag {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; BPF_TAG_SIZE]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BPF_TAG_SIZE] {
        &self.0
    }
}

impl fmt::Display for ProgramTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ProgramTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != BPF_TAG_SIZE * 2 {
            return Err(TagError::Length { expected: BPF_TAG_SIZE * 2, actual: s.len() });
        }
        // from_str_radix tolerates a leading '+', so validate up front
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TagError::InvalidHex(s.to_string()));
        }

        let mut bytes = [0u8; BPF_TAG_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| TagError::InvalidHex(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ProgramTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where object metadata comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `BPF_OBJ_GET_INFO_BY_FD`
    Native,
    /// `/proc/<pid>/fdinfo/<fd>`
    FdInfo,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("BPF_OBJ_GET_INFO_BY_FD"),
            Self::FdInfo => f.write_str("fdinfo"),
        }
    }
}

/// What a descriptor refers to, as reported by its `/proc/<pid>/fd` link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Map,
    Program,
    Link,
    Other(String),
}

impl ObjectKind {
    /// Classify a descriptor link target such as `anon_inode:bpf-map`.
    #[must_use]
    pub fn from_link_target(target: &str) -> Self {
        match target {
            "anon_inode:bpf-map" => Self::Map,
            "anon_inode:bpf-prog" => Self::Program,
            "anon_inode:bpf_link" => Self::Link,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => f.write_str("map"),
            Self::Program => f.write_str("program"),
            Self::Link => f.write_str("link"),
            Self::Other(target) => write!(f, "other ({target})"),
        }
    }
}
