//! Program metadata

use objinfo_common::BpfProgInfo;
use serde::Serialize;
use std::io::BufRead;

use crate::domain::{ProgramTag, ProgramType, ScanError};
use crate::fdinfo::{scan_fields, Field};

/// Metadata of a loaded program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
    program_type: ProgramType,
    name: String,
    tag: ProgramTag,
}

impl ProgramInfo {
    pub(crate) fn from_kernel(info: &BpfProgInfo) -> Self {
        let len = info.name.iter().position(|&b| b == 0).unwrap_or(info.name.len());
        Self {
            program_type: ProgramType::from(info.prog_type),
            name: String::from_utf8_lossy(&info.name[..len]).into_owned(),
            tag: ProgramTag::from_bytes(info.tag),
        }
    }

    /// Build from a fdinfo record. The record exposes the tag directly but
    /// never the name.
    pub(crate) fn scan<R: BufRead>(reader: R) -> Result<Self, ScanError> {
        let mut program_type = 0u32;
        let mut tag = String::new();

        scan_fields(
            reader,
            &mut [Field::u32("prog_type", &mut program_type), Field::string("prog_tag", &mut tag)],
        )?;

        let tag = tag
            .parse::<ProgramTag>()
            .map_err(|_| ScanError::Decode { field: "prog_tag".to_string(), value: tag.clone() })?;

        Ok(Self { program_type: ProgramType::from(program_type), name: String::new(), tag })
    }

    #[must_use]
    pub fn program_type(&self) -> ProgramType {
        self.program_type
    }

    /// Object name, empty on kernels older than 4.15 and from fdinfo
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tag(&self) -> ProgramTag {
        self.tag
    }
}
