//! Scanner for `key:\tvalue` records
//!
//! The kernel describes open descriptors in `/proc/<pid>/fdinfo/<fd>` as one
//! `key:<whitespace>value` pair per line:
//!
//! ```text
//! pos:        0
//! flags:      02000002
//! map_type:   1
//! key_size:   4
//! map_flags:  0x1
//! ```
//!
//! Callers describe the keys they want as a slice of [`Field`]s, each
//! pointing at a typed destination. Keys nobody asked for are skipped
//! without being decoded, so newer kernels can add lines freely.

use std::io::BufRead;

use crate::domain::ScanError;

/// Typed destination of a scanned value.
#[derive(Debug)]
pub enum Slot<'a> {
    Str(&'a mut String),
    U32(&'a mut u32),
    U64(&'a mut u64),
}

/// A named field the scanner should fill in.
#[derive(Debug)]
pub struct Field<'a> {
    name: &'a str,
    slot: Slot<'a>,
    required: bool,
    seen: bool,
}

impl<'a> Field<'a> {
    /// A field that must appear in the record.
    #[must_use]
    pub fn new(name: &'a str, slot: Slot<'a>) -> Self {
        Self { name, slot, required: true, seen: false }
    }

    /// A field only some kernels print; its absence is not an error.
    #[must_use]
    pub fn optional(name: &'a str, slot: Slot<'a>) -> Self {
        Self { name, slot, required: false, seen: false }
    }

    #[must_use]
    pub fn string(name: &'a str, dest: &'a mut String) -> Self {
        Self::new(name, Slot::Str(dest))
    }

    #[must_use]
    pub fn u32(name: &'a str, dest: &'a mut u32) -> Self {
        Self::new(name, Slot::U32(dest))
    }

    #[must_use]
    pub fn u64(name: &'a str, dest: &'a mut u64) -> Self {
        Self::new(name, Slot::U64(dest))
    }

    /// Whether a matching line has been stored.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.seen
    }

    fn store(&mut self, value: &str) -> Result<(), ScanError> {
        let name = self.name;
        let decode_error =
            || ScanError::Decode { field: name.to_string(), value: value.to_string() };

        match &mut self.slot {
            Slot::Str(dest) => value.clone_into(dest),
            Slot::U32(dest) => {
                **dest = parse_unsigned(value)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(decode_error)?;
            }
            Slot::U64(dest) => **dest = parse_unsigned(value).ok_or_else(decode_error)?,
        }
        self.seen = true;
        Ok(())
    }
}

/// Read every line of `reader`, storing values of requested fields.
///
/// Lines are handled as bytes; only values of requested fields have to be
/// UTF-8.
///
/// # Errors
/// - [`ScanError::Decode`] if a requested value doesn't fit its slot
/// - [`ScanError::MissingField`] if a required field never appeared
/// - [`ScanError::Io`] if reading fails
pub fn scan_fields<R: BufRead>(mut reader: R, fields: &mut [Field<'_>]) -> Result<(), ScanError> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        let Some(colon) = line.iter().position(|&b| b == b':') else {
            continue;
        };
        let (key, value) = (line[..colon].trim_ascii(), &line[colon + 1..]);

        if let Some(field) = fields.iter_mut().find(|f| f.name.as_bytes() == key) {
            let value = std::str::from_utf8(value).map_err(|_| ScanError::Decode {
                field: field.name.to_string(),
                value: String::from_utf8_lossy(value).trim().to_string(),
            })?;
            field.store(value.trim())?;
        }
    }

    if let Some(missing) = fields.iter().find(|f| f.required && !f.seen) {
        return Err(ScanError::MissingField(missing.name.to_string()));
    }

    Ok(())
}

/// Parse an unsigned integer in decimal or with a `0x`, `0o` or `0b` prefix.
///
/// The kernel prints most values with `%u` but flags with `%#x`.
fn parse_unsigned(text: &str) -> Option<u64> {
    let (digits, radix) = if let Some(hex) =
        text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(octal) = text.strip_prefix("0o") {
        (octal, 8)
    } else if let Some(binary) = text.strip_prefix("0b") {
        (binary, 2)
    } else {
        (text, 10)
    };

    if digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
