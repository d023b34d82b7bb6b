// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline hint extraction.
//!
//! Two-stage pipeline: spoken text is first rewritten into written token
//! forms by [`spoken::normalize`], then a single extractor handles both modes.
//! Spoken mode additionally consults the dictated scope and date resolver
//! chains when no explicit token was found.

pub mod dates;
pub mod extract;
pub mod merge;
pub mod resolve;
pub mod spoken;

use std::borrow::Cow;

use chrono::{Local, NaiveDate};
use siphon_core::InlineHints;
use tracing::debug;

pub use merge::merge_hints;

/// Commands recognised by the spoken normalizer when none are configured.
pub const DEFAULT_COMMANDS: &[&str] = &["archive", "receipt", "clip", "note", "keep"];

/// How the text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Typed text or captions.
    Written,
    /// Speech-to-text transcripts.
    Spoken,
}

/// Stateless hint parser.
#[derive(Debug, Clone)]
pub struct HintParser {
    known_commands: Vec<String>,
    today: Option<NaiveDate>,
}

impl Default for HintParser {
    fn default() -> Self {
        Self {
            known_commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
            today: None,
        }
    }
}

impl HintParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands the spoken normalizer treats as complete single words.
    pub fn with_known_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the date used for relative dictated dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn parse(&self, text: &str, mode: ParseMode) -> InlineHints {
        let source = match mode {
            ParseMode::Written => Cow::Borrowed(text),
            ParseMode::Spoken => Cow::Owned(spoken::normalize(text, &self.known_commands)),
        };

        let mut hints = InlineHints::default();
        let cleaned = extract::extract(&source, &mut hints);
        hints.cleaned_content = cleaned;

        if mode == ParseMode::Spoken {
            let today = self.today();
            if hints.scope.is_none()
                && let Some((detector, scope)) = resolve::SCOPE_CHAIN.resolve(&source, today)
            {
                debug!(detector, %scope, "dictated scope");
                hints.scope = Some(scope);
            }
            if hints.metadata.date.is_none()
                && let Some((detector, date)) = resolve::DATE_CHAIN.resolve(&source, today)
            {
                debug!(detector, %date, "dictated document date");
                hints.metadata.date = Some(date);
            }
        }

        debug!(
            ?mode,
            tags = hints.tags.len(),
            people = hints.people.len(),
            commands = ?hints.commands,
            scope = ?hints.scope,
            "parsed hints"
        );
        hints
    }
}

/// Parse with default settings.
pub fn parse(text: &str, mode: ParseMode) -> InlineHints {
    HintParser::default().parse(text, mode)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use siphon_core::Scope;

    use super::*;

    fn parser() -> HintParser {
        HintParser::new().with_today(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
    }

    #[test]
    fn spoken_hashtag_scenario() {
        let hints = parser().parse(
            "hashtag project pai this is a note about architecture",
            ParseMode::Spoken,
        );
        assert_eq!(hints.tags, vec!["project-pai"]);
        assert_eq!(hints.cleaned_content, "this is a note about architecture");
    }

    #[test]
    fn written_date_and_archive_scenario() {
        let hints = parser().parse("[date:15/06/2024] /archive Old contract", ParseMode::Written);
        assert_eq!(
            hints.metadata.date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        );
        assert_eq!(hints.commands, vec!["archive"]);
        assert_eq!(hints.cleaned_content, "Old contract");
    }

    #[test]
    fn spoken_mode_detects_dictated_scope_and_date() {
        let hints = parser().parse(
            "slash archive this is personal, the lease from the 3rd of March",
            ParseMode::Spoken,
        );
        assert_eq!(hints.commands, vec!["archive"]);
        assert_eq!(hints.scope, Some(Scope::Private));
        assert_eq!(
            hints.metadata.date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())
        );
    }

    #[test]
    fn explicit_scope_beats_dictated_scope() {
        let hints = parser().parse("scope work this is personal", ParseMode::Spoken);
        assert_eq!(hints.scope, Some(Scope::Work));
    }

    #[test]
    fn written_mode_skips_dictated_detection() {
        let hints = parser().parse("this is personal, bought yesterday", ParseMode::Written);
        assert!(hints.scope.is_none());
        assert!(hints.metadata.date.is_none());
    }

    #[test]
    fn spoken_mode_also_accepts_typed_tokens() {
        let hints = parser().parse("#inbox remember the milk", ParseMode::Spoken);
        assert_eq!(hints.tags, vec!["inbox"]);
        assert_eq!(hints.cleaned_content, "remember the milk");
    }

    fn hint_text() -> impl Strategy<Value = String> {
        let pieces = prop_oneof![
            Just("#tag".to_string()),
            Just("#a/b.".to_string()),
            Just("@Ed".to_string()),
            Just("Overy".to_string()),
            Just("@bob,".to_string()),
            Just("/archive".to_string()),
            Just("/".to_string()),
            Just("~work".to_string()),
            Just("~Private".to_string()),
            Just("[type:bill]".to_string()),
            Just("[date:15/06/2024]".to_string()),
            Just("[date:nope]".to_string()),
            Just("[colour:red]".to_string()),
            Just("[".to_string()),
            Just("]".to_string()),
            Just("x".to_string()),
            Just("word".to_string()),
            Just("https://a.b/c".to_string()),
            Just("#".to_string()),
            Just("@".to_string()),
        ];
        let seps = prop_oneof![
            Just(" ".to_string()),
            Just("  ".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            Just("\t".to_string()),
            Just(String::new()),
        ];
        prop::collection::vec((pieces, seps), 0..16).prop_map(|parts| {
            parts
                .into_iter()
                .map(|(piece, sep)| format!("{piece}{sep}"))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn cleaning_is_idempotent(text in hint_text()) {
            let first = parse(&text, ParseMode::Written);
            let second = parse(&first.cleaned_content, ParseMode::Written);
            prop_assert_eq!(&second.cleaned_content, &first.cleaned_content);
            prop_assert!(second.tags.is_empty());
            prop_assert!(second.people.is_empty());
            prop_assert!(second.commands.is_empty());
            prop_assert!(second.scope.is_none());
            prop_assert!(second.metadata.is_empty());
        }
    }
}
