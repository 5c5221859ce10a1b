//! Identifier normalization for generated code
//!
//! Kernel and ELF names (`.rodata`, `ipv6_test`, `MAX_ENTRIES`) become type
//! identifiers by upper-casing the first letter of every word. Names that
//! already read as constants are kept verbatim.

/// Turn a raw section, map or type name into a generated-code identifier.
///
/// - Leading underscores are dropped.
/// - A single `_` or `.` separates words; a run of two or more stays inside
///   the word.
/// - Names made only of `A-Z`, `0-9` and `_` are returned unchanged.
/// - Otherwise the first character of each word is upper-cased and the
///   words are joined.
///
/// ```
/// use objinfo::naming::identifier;
///
/// assert_eq!(identifier(".rodata"), "Rodata");
/// assert_eq!(identifier("ipv6_test"), "Ipv6Test");
/// assert_eq!(identifier("__FOO__BAR"), "FOO__BAR");
/// ```
#[must_use]
pub fn identifier(raw: &str) -> String {
    let name = raw.trim_start_matches('_');

    if is_constant_case(name) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    for word in split_words(name) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn is_separator(b: u8) -> bool {
    b == b'_' || b == b'.'
}

fn is_constant_case(name: &str) -> bool {
    name.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Split on isolated separators only.
fn split_words(name: &str) -> Vec<&str> {
    let bytes = name.as_bytes();
    let mut words = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if !is_separator(bytes[i]) {
            i += 1;
            continue;
        }

        let run_end =
            bytes[i..].iter().position(|&b| !is_separator(b)).map_or(bytes.len(), |n| i + n);
        if run_end - i == 1 {
            words.push(&name[start..i]);
            start = run_end;
        }
        i = run_end;
    }

    words.push(&name[start..]);
    words
}
