// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent content sanitization.

/// Invisible characters used to hide or reorder text: zero-width spaces and
/// joiners, bidi embeddings and overrides, word joiners, BOM.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

/// Normalizes line endings, drops control and invisible characters, and
/// caps the length at `max_chars` characters.
///
/// `sanitize(sanitize(x)) == sanitize(x)` for every input.
pub fn sanitize(input: &str, max_chars: usize) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !(c.is_control() || is_invisible(c)))
        .take(max_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn strips_controls_and_bidi_overrides() {
        let input = "pay\u{202E}lasrever\u{202C} now\u{0007}\r\nok\u{200B}";
        assert_eq!(sanitize(input, 1000), "paylasrever now\nok");
    }

    #[test]
    fn keeps_tabs_and_newlines() {
        assert_eq!(sanitize("a\tb\nc", 1000), "a\tb\nc");
    }

    #[test]
    fn truncates_by_chars() {
        assert_eq!(sanitize("héllo wörld", 5), "héllo");
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(input in "\\PC*|[\\x00-\\x1f\\r\\n\u{200B}\u{202E}a-z]*", max in 1usize..64) {
            let once = sanitize(&input, max);
            prop_assert_eq!(sanitize(&once, max), once);
        }
    }
}
