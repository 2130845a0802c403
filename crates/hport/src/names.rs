// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded, heap-free names stored inside registry records.

use crate::config::{MAX_NODE_NAME_LENGTH, MAX_PROCESS_NAME_LENGTH};

/// Name of the process owning a registry entry.
pub type ProcessName = heapless::String<MAX_PROCESS_NAME_LENGTH>;

/// Name of a node inside a process.
pub type NodeName = heapless::String<MAX_NODE_NAME_LENGTH>;

/// Copy `value` into a bounded string, dropping whatever does not fit.
///
/// Truncation happens on a `char` boundary so the result stays valid UTF-8.
#[must_use]
pub fn truncated<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in value.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_short_name_is_kept() {
        let name: ProcessName = truncated("radar");
        assert_eq!(name.as_str(), "radar");
    }

    #[test]
    fn test_truncated_long_name_is_cut_to_capacity() {
        let long = "x".repeat(MAX_PROCESS_NAME_LENGTH + 20);
        let name: ProcessName = truncated(&long);
        assert_eq!(name.len(), MAX_PROCESS_NAME_LENGTH);
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        let name: heapless::String<5> = truncated("ab\u{e9}\u{e9}\u{e9}");
        assert_eq!(name.as_str(), "ab\u{e9}");
    }
}
