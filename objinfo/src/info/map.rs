//! Map metadata

use objinfo_common::BpfMapInfo;
use serde::Serialize;
use std::io::BufRead;

use crate::domain::{MapType, ScanError};
use crate::fdinfo::{scan_fields, Field};

/// Metadata of a loaded map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapInfo {
    map_type: MapType,
    key_size: u32,
    value_size: u32,
    max_entries: u32,
    flags: u32,
}

impl MapInfo {
    pub(crate) fn from_kernel(info: &BpfMapInfo) -> Self {
        Self {
            map_type: MapType::from(info.map_type),
            key_size: info.key_size,
            value_size: info.value_size,
            max_entries: info.max_entries,
            flags: info.map_flags,
        }
    }

    /// Build from a fdinfo record. Map-in-map types print the same lines as
    /// flat maps, so there is a single field set.
    pub(crate) fn scan<R: BufRead>(reader: R) -> Result<Self, ScanError> {
        let (mut map_type, mut key_size, mut value_size, mut max_entries, mut flags) =
            (0u32, 0u32, 0u32, 0u32, 0u32);

        scan_fields(
            reader,
            &mut [
                Field::u32("map_type", &mut map_type),
                Field::u32("key_size", &mut key_size),
                Field::u32("value_size", &mut value_size),
                Field::u32("max_entries", &mut max_entries),
                Field::u32("map_flags", &mut flags),
            ],
        )?;

        Ok(Self { map_type: MapType::from(map_type), key_size, value_size, max_entries, flags })
    }

    #[must_use]
    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    #[must_use]
    pub fn key_size(&self) -> u32 {
        self.key_size
    }

    #[must_use]
    pub fn value_size(&self) -> u32 {
        self.value_size
    }

    #[must_use]
    pub fn max_entries(&self) -> u32 {
        self.max_entries
    }

    /// `map_flags` bitmask as passed at creation
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags
    }
}
