//! Text and JSON rendering of resolved objects

use serde::Serialize;
use std::fmt;

use crate::info::{MapInfo, ProgramInfo};

/// One resolved object, as printed by `show` and `list`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectReport {
    Map {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
        #[serde(flatten)]
        info: MapInfo,
    },
    Program {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
        #[serde(flatten)]
        info: ProgramInfo,
    },
}

impl fmt::Display for ObjectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map { id, info } => {
                write_id(f, *id)?;
                write!(
                    f,
                    "map {}  key {}B  value {}B  max_entries {}  flags {:#x}",
                    info.map_type(),
                    info.key_size(),
                    info.value_size(),
                    info.max_entries(),
                    info.flags()
                )
            }
            Self::Program { id, info } => {
                write_id(f, *id)?;
                write!(f, "prog {}", info.program_type())?;
                if !info.name().is_empty() {
                    write!(f, "  name {}", info.name())?;
                }
                write!(f, "  tag {}", info.tag())
            }
        }
    }
}

fn write_id(f: &mut fmt::Formatter<'_>, id: Option<u32>) -> fmt::Result {
    match id {
        Some(id) => write!(f, "{id}: "),
        None => Ok(()),
    }
}
