//! # objinfo - Metadata of Loaded BPF Objects
//!
//! objinfo recovers the type, sizing, name and fingerprint of BPF maps and
//! programs from the descriptors that refer to them. It never creates,
//! modifies or closes those objects.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Caller (loader, CLI, codegen)                   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ BorrowedFd
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     info::Resolver                              │
//! │  check once: UNKNOWN ──▶ NATIVE | FDINFO                        │
//! └──────────┬────────────────────────────────────┬─────────────────┘
//!            │ BPF_OBJ_GET_INFO_BY_FD             │ unknown command
//!            ▼                                    ▼
//! ┌──────────────────────┐          ┌───────────────────────────────┐
//! │   sys (bpf(2))       │          │  fdinfo (/proc/<pid>/fdinfo)  │
//! │   objinfo-common ABI │          │  scanner: key:\tvalue lines   │
//! └──────────┬───────────┘          └───────────────┬───────────────┘
//!            └──────────────┬───────────────────────┘
//!                           ▼
//!               MapInfo / ProgramInfo (+ ProgramTag)
//! ```
//!
//! ## Module Structure
//!
//! - [`info`]: result types and the resolver
//! - [`fdinfo`]: `/proc` record location and the key/value scanner
//! - [`sys`]: raw `bpf(2)` exchanges
//! - [`naming`]: raw kernel names to generated-code identifiers
//! - [`domain`]: kernel enumerations, program tag, errors
//! - [`cli`]: argument parsing and output of the `objinfo` binary
//!
//! ## Typical Usage
//!
//! ```no_run
//! use std::os::fd::OwnedFd;
//!
//! # fn demo(map_fd: OwnedFd) -> Result<(), objinfo::domain::InfoError> {
//! let info = objinfo::info::map_info(&map_fd)?;
//! println!("{} with {} entries", info.map_type(), info.max_entries());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod domain;
pub mod fdinfo;
pub mod info;
pub mod naming;
pub mod sys;
