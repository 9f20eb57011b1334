//! Key code table and name lookups.
//!
//! The canonical representation everywhere in vkbd is the Linux evdev key
//! code (see [`linux`]).  This module adds the two lookups the CLI needs:
//! code → name for listing, and name → code for parsing user input.

pub mod linux;

pub use linux::{KEY_TABLE, MAX_KEY, MIN_KEY};

/// Stateless lookup helpers over [`KEY_TABLE`].
pub struct KeyMapper;

impl KeyMapper {
    /// Returns the kernel name (e.g. `"KEY_A"`) of `code`.
    ///
    /// Returns `None` for codes outside the table, including the unassigned
    /// gaps inside the legal range.
    pub fn key_name(code: i32) -> Option<&'static str> {
        KEY_TABLE
            .binary_search_by_key(&code, |(_, c)| *c)
            .ok()
            .map(|idx| KEY_TABLE[idx].0)
    }

    /// Looks a key up by name.
    ///
    /// Matching is case-insensitive and the `KEY_` prefix is optional, so
    /// `"KEY_ENTER"`, `"enter"` and `"Enter"` all resolve to `KEY_ENTER`.
    pub fn key_from_name(name: &str) -> Option<i32> {
        let wanted = name.trim();
        let wanted = strip_prefix_ignore_case(wanted, "KEY_").unwrap_or(wanted);
        if wanted.is_empty() {
            return None;
        }
        KEY_TABLE.iter().find_map(|(full, code)| {
            let short = &full["KEY_".len()..];
            short.eq_ignore_ascii_case(wanted).then_some(*code)
        })
    }

    /// Parses a user-supplied key: either a decimal code or a key name.
    ///
    /// Numeric input is returned as-is, even when out of range, so the range
    /// check stays with the validator and produces the usual error.
    pub fn parse_key(input: &str) -> Option<i32> {
        match input.trim().parse::<i32>() {
            Ok(code) => Some(code),
            Err(_) => Self::key_from_name(input),
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
