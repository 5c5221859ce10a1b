//! Fixtures that create real BPF objects.
//!
//! Creating objects needs CAP_BPF (or root); tests call these and skip when
//! they return `None`.

#![allow(dead_code, unsafe_code)]

use objinfo::sys;
use objinfo_common::{
    object_name, BpfInsn, MapCreateAttr, ProgLoadAttr, BPF_MAP_CREATE, BPF_PROG_LOAD,
};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

pub const MAP_TYPE_HASH: u32 = 1;
pub const MAP_TYPE_ARRAY: u32 = 2;
pub const MAP_TYPE_ARRAY_OF_MAPS: u32 = 12;
pub const PROG_TYPE_SOCKET_FILTER: u32 = 1;

/// Tags of `r0 = 2 ll; exit`: SHA-1 prefix on older kernels, SHA-256 on
/// newer ones
pub const SOCKET_FILTER_TAGS: [&str; 2] = ["d7edec644f05498d", "01e57aadad14352b"];

fn skip_on_error(what: &str, result: io::Result<OwnedFd>) -> Option<OwnedFd> {
    match result {
        Ok(fd) => Some(fd),
        Err(e) => {
            println!("skipping: can't create {what}: {e}");
            None
        }
    }
}

pub fn create_map(mut attr: MapCreateAttr) -> Option<OwnedFd> {
    // SAFETY: MapCreateAttr carries no pointers.
    skip_on_error("map", unsafe { sys::bpf_fd(BPF_MAP_CREATE, &mut attr) })
}

/// Hash map with key 4, value 5, 2 entries, `BPF_F_NO_PREALLOC`.
pub fn create_hash_map() -> Option<OwnedFd> {
    create_map(MapCreateAttr {
        map_type: MAP_TYPE_HASH,
        key_size: 4,
        value_size: 5,
        max_entries: 2,
        map_flags: objinfo_common::BPF_F_NO_PREALLOC,
        ..MapCreateAttr::default()
    })
}

/// Array of maps whose template is a 2-entry array of u32. The inner map
/// descriptor is returned too so it stays open for the test's duration.
pub fn create_nested_map() -> Option<(OwnedFd, OwnedFd)> {
    let inner = create_map(MapCreateAttr {
        map_type: MAP_TYPE_ARRAY,
        key_size: 4,
        value_size: 4,
        max_entries: 2,
        ..MapCreateAttr::default()
    })?;

    let outer = create_map(MapCreateAttr {
        map_type: MAP_TYPE_ARRAY_OF_MAPS,
        key_size: 4,
        value_size: 4,
        max_entries: 2,
        inner_map_fd: u32::try_from(inner.as_raw_fd()).ok()?,
        ..MapCreateAttr::default()
    })?;

    Some((outer, inner))
}

/// Socket filter returning 2, named "test" where the kernel supports names.
pub fn create_socket_filter() -> Option<OwnedFd> {
    let insns = [
        BpfInsn::new(0x18, 0, 0, 0, 2), // r0 = 2 ll
        BpfInsn::new(0, 0, 0, 0, 0),
        BpfInsn::new(0x95, 0, 0, 0, 0), // exit
    ];
    let license = c"MIT";

    let mut attr = ProgLoadAttr {
        prog_type: PROG_TYPE_SOCKET_FILTER,
        insn_cnt: u32::try_from(insns.len()).ok()?,
        insns: insns.as_ptr() as u64,
        license: license.as_ptr() as u64,
        prog_name: object_name("test"),
        ..ProgLoadAttr::default()
    };

    // SAFETY: `insns` and `license` outlive both calls.
    let named = unsafe { sys::bpf_fd(BPF_PROG_LOAD, &mut attr) };
    let result = named.or_else(|_| {
        // Kernels before 4.15 reject prog_name
        attr.prog_name = [0; objinfo_common::BPF_OBJ_NAME_LEN];
        unsafe { sys::bpf_fd(BPF_PROG_LOAD, &mut attr) }
    });

    skip_on_error("socket filter", result)
}
