// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Written-mode token extraction, shared by both parse modes.
//!
//! Works line by line. `[key:value]` tokens are matched first because their
//! values may contain spaces; everything else is a whitespace-delimited token.
//! A line is rebuilt from the tokens that were not consumed, so stripping and
//! extraction can never disagree.

use std::sync::LazyLock;

use regex::Regex;
use siphon_core::{InlineHints, Scope};
use tracing::debug;

use crate::dates;

static METADATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z_]+)\s*:\s*([^\[\]\n]*?)\s*\]").unwrap());

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(\p{L}[\p{L}\p{N}_\-/]*)$").unwrap());

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([\p{L}\p{N}_][\p{L}\p{N}_\-.]*)$").unwrap());

static COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([A-Za-z][A-Za-z0-9_\-]*)$").unwrap());

static SCOPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^~(private|work)$").unwrap());

static CAPITALISED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\p{Lu}\p{Ll}+$").unwrap());

/// Punctuation allowed to trail a token without being part of it.
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Extract every recognised token from `text` into `hints` and return the
/// text with those tokens removed.
///
/// Lines emptied by extraction are dropped, runs of blank lines collapse to
/// one, and whitespace inside a line collapses to single spaces.
pub fn extract(text: &str, hints: &mut InlineHints) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let (cleaned, consumed) = extract_line(line, hints);
        if consumed && cleaned.is_empty() {
            continue;
        }
        if cleaned.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(cleaned);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn extract_line(line: &str, hints: &mut InlineHints) -> (String, bool) {
    let mut consumed = false;
    let mut rest = String::with_capacity(line.len());
    let mut last = 0;

    for caps in METADATA.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        let before = &line[..whole.start()];
        let starts_clear = before.chars().next_back().is_none_or(char::is_whitespace);
        let ends_clear = line[whole.end()..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || TRAILING.contains(&c));
        if !starts_clear
            || !ends_clear
            || inside_brackets(before)
            || !apply_metadata(&caps[1], &caps[2], hints)
        {
            continue;
        }
        rest.push_str(&line[last..whole.start()]);
        rest.push(' ');
        last = whole.end();
        consumed = true;
    }
    rest.push_str(&line[last..]);

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let bare = token.trim_end_matches(TRAILING);
        let mut used = 1;
        let recognised = match token.chars().next() {
            Some('#') => TAG.captures(bare).map(|c| {
                hints.add_tag(c[1].trim_end_matches('/'));
            }),
            Some('@') => MENTION.captures(bare).map(|c| {
                let first = &c[1];
                // "@Ed Overy": a capitalised mention followed by a capitalised word.
                let second = tokens.get(i + 1).filter(|next| {
                    token == bare
                        && CAPITALISED.is_match(first)
                        && CAPITALISED.is_match(next.trim_end_matches(TRAILING))
                });
                match second {
                    Some(next) => {
                        used = 2;
                        hints.add_person(&normalize_person(&[
                            first,
                            next.trim_end_matches(TRAILING),
                        ]));
                    }
                    None => hints.add_person(&normalize_person(&[first])),
                }
            }),
            Some('/') => COMMAND.captures(bare).map(|c| {
                hints.add_command(&c[1].to_ascii_lowercase());
            }),
            Some('~') => SCOPE.captures(bare).map(|c| {
                if let Ok(scope) = c[1].parse::<Scope>() {
                    hints.offer_scope(scope);
                }
            }),
            _ => None,
        };
        if recognised.is_some() {
            consumed = true;
        } else {
            kept.extend(&tokens[i..i + used]);
        }
        i += used;
    }

    (kept.join(" "), consumed)
}

/// True when `prefix` leaves a `[` open, so a token after it would sit inside
/// an outer bracket and removing it could expose a new token.
fn inside_brackets(prefix: &str) -> bool {
    let mut depth = 0usize;
    for c in prefix.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth > 0
}

/// Lower-cases and joins a (possibly multi-word) mention with underscores.
pub fn normalize_person(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| w.trim_end_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Applies a known metadata key. Unknown keys are left in the text.
///
/// An empty value still consumes the token but never clears an earlier one.
fn apply_metadata(key: &str, value: &str, hints: &mut InlineHints) -> bool {
    let value = value.trim();
    let meta = &mut hints.metadata;
    let (slot, normalized) = match key.to_ascii_lowercase().as_str() {
        "source" => (&mut meta.source, value.to_string()),
        "device" => (&mut meta.device, value.to_string()),
        "user" => (&mut meta.user, value.to_string()),
        "type" => (&mut meta.doc_type, value.to_uppercase()),
        "category" => (&mut meta.category, value.to_uppercase()),
        "processor" => (&mut meta.processor, value.to_lowercase()),
        "date" => {
            match dates::parse_explicit(value) {
                Some(date) => meta.date = Some(date),
                None => debug!(value, "ignoring unparseable date hint"),
            }
            return true;
        }
        _ => return false,
    };
    if !normalized.is_empty() {
        *slot = Some(normalized);
    }
    true
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn run(text: &str) -> (InlineHints, String) {
        let mut hints = InlineHints::default();
        let cleaned = extract(text, &mut hints);
        (hints, cleaned)
    }

    #[test]
    fn extracts_every_family() {
        let (hints, cleaned) =
            run("#Project/alpha call @bob about /clip [type:invoice] ~work tomorrow");
        assert_eq!(hints.tags, vec!["Project/alpha"]);
        assert_eq!(hints.people, vec!["bob"]);
        assert_eq!(hints.commands, vec!["clip"]);
        assert_eq!(hints.metadata.doc_type.as_deref(), Some("INVOICE"));
        assert_eq!(hints.scope, Some(Scope::Work));
        assert_eq!(cleaned, "call about tomorrow");
    }

    #[test]
    fn url_paths_are_not_commands() {
        let (hints, cleaned) = run("read https://example.com/archive later");
        assert!(hints.commands.is_empty());
        assert_eq!(cleaned, "read https://example.com/archive later");
    }

    #[test]
    fn email_is_not_a_mention() {
        let (hints, _) = run("mail bob@example.com");
        assert!(hints.people.is_empty());
    }

    #[test]
    fn two_word_mention() {
        let (hints, cleaned) = run("lunch with @Ed Overy on friday");
        assert_eq!(hints.people, vec!["ed_overy"]);
        assert_eq!(cleaned, "lunch with on friday");
    }

    #[test]
    fn lowercase_follower_is_not_joined() {
        let (hints, cleaned) = run("ping @ed about it");
        assert_eq!(hints.people, vec!["ed"]);
        assert_eq!(cleaned, "ping about it");
    }

    #[test]
    fn metadata_values_with_spaces_and_case_rules() {
        let (hints, cleaned) =
            run("[category: home office] [processor:OCR] [source:Phone] scan of lease");
        assert_eq!(hints.metadata.category.as_deref(), Some("HOME OFFICE"));
        assert_eq!(hints.metadata.processor.as_deref(), Some("ocr"));
        assert_eq!(hints.metadata.source.as_deref(), Some("Phone"));
        assert_eq!(cleaned, "scan of lease");
    }

    #[test]
    fn unknown_metadata_key_is_left_intact() {
        let (hints, cleaned) = run("[colour:red] bag");
        assert!(hints.metadata.is_empty());
        assert_eq!(cleaned, "[colour:red] bag");
    }

    #[test]
    fn date_metadata_is_normalized() {
        let (hints, cleaned) = run("[date:15/06/2024] /archive Old contract");
        assert_eq!(hints.metadata.date, NaiveDate::from_ymd_opt(2024, 6, 15));
        assert_eq!(hints.commands, vec!["archive"]);
        assert_eq!(cleaned, "Old contract");
    }

    #[test]
    fn trailing_punctuation_is_consumed_with_token() {
        let (hints, cleaned) = run("finished the report #done.");
        assert_eq!(hints.tags, vec!["done"]);
        assert_eq!(cleaned, "finished the report");
    }

    #[test]
    fn hint_only_lines_disappear_but_paragraphs_stay() {
        let (_, cleaned) = run("First para\n#tag @bob\nstill first\n\n\n\nSecond para\n");
        assert_eq!(cleaned, "First para\nstill first\n\nSecond para");
    }

    #[test]
    fn first_scope_wins_but_both_tokens_strip() {
        let (hints, cleaned) = run("~private memo ~work");
        assert_eq!(hints.scope, Some(Scope::Private));
        assert_eq!(cleaned, "memo");
    }

    #[test]
    fn nested_metadata_is_left_alone() {
        let (hints, cleaned) = run("[source: [type:bill] phone] scan");
        assert!(hints.metadata.is_empty());
        assert_eq!(cleaned, "[source: [type:bill] phone] scan");

        let (again, recleaned) = run(&cleaned);
        assert!(again.metadata.is_empty());
        assert_eq!(recleaned, cleaned);
    }

    #[test]
    fn back_to_back_metadata_is_left_alone() {
        let (hints, cleaned) = run("[type:bill][type:bill] ");
        assert!(hints.metadata.is_empty());
        assert_eq!(cleaned, "[type:bill][type:bill]");
        assert_eq!(run(&cleaned).1, cleaned);
    }

    #[test]
    fn metadata_may_carry_trailing_punctuation() {
        let (hints, cleaned) = run("filed [type:bill]. done");
        assert_eq!(hints.metadata.doc_type.as_deref(), Some("BILL"));
        assert_eq!(cleaned, "filed . done");
    }

    #[test]
    fn glued_tokens_are_not_extracted() {
        let (hints, cleaned) = run("price#1 x[type:bill] a/b");
        assert!(hints.tags.is_empty());
        assert!(hints.metadata.is_empty());
        assert!(hints.commands.is_empty());
        assert_eq!(cleaned, "price#1 x[type:bill] a/b");
    }
}
