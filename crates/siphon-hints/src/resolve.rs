// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-circuiting resolver chains for dictated scope and dates.
//!
//! Each chain is an ordered list of named detectors; the first one that
//! returns a value wins and the rest are not consulted.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use siphon_core::Scope;

use crate::dates;

/// A detector over free text. `today` anchors relative dates.
pub type Detector<T> = fn(&str, NaiveDate) -> Option<T>;

/// Ordered detectors, first non-`None` result wins.
pub struct ResolverChain<T: 'static> {
    detectors: &'static [(&'static str, Detector<T>)],
}

impl<T> ResolverChain<T> {
    pub const fn new(detectors: &'static [(&'static str, Detector<T>)]) -> Self {
        Self { detectors }
    }

    /// Returns the winning detector's name with its value.
    pub fn resolve(&self, text: &str, today: NaiveDate) -> Option<(&'static str, T)> {
        self.detectors
            .iter()
            .find_map(|(name, detect)| detect(text, today).map(|value| (*name, value)))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.detectors.iter().map(|(name, _)| *name)
    }
}

static PRIVATE_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(this is (personal|private)|personal (note|matter|stuff|thing)|keep (this|it) private|private (note|matter)|for my eyes only|just for me|not for work)\b",
    )
    .unwrap()
});

static WORK_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(for work|work[- ]related|this is (for )?work|professional(ly)?|for the office|work (note|task|item|meeting|project))\b",
    )
    .unwrap()
});

fn private_phrase(text: &str, _today: NaiveDate) -> Option<Scope> {
    PRIVATE_PHRASES.is_match(text).then_some(Scope::Private)
}

fn work_phrase(text: &str, _today: NaiveDate) -> Option<Scope> {
    WORK_PHRASES.is_match(text).then_some(Scope::Work)
}

/// Dictated scope. Private phrasing is checked first so "not for work"
/// cannot be read as work context.
pub static SCOPE_CHAIN: ResolverChain<Scope> = ResolverChain::new(&[
    ("private-phrase", private_phrase as Detector<Scope>),
    ("work-phrase", work_phrase as Detector<Scope>),
]);

/// Dictated document date.
pub static DATE_CHAIN: ResolverChain<NaiveDate> = ResolverChain::new(&[
    ("ordinal-month", dates::ordinal_month as Detector<NaiveDate>),
    ("month-ordinal", dates::month_ordinal as Detector<NaiveDate>),
    ("iso-date", dates::iso as Detector<NaiveDate>),
    ("last-month", dates::last_month as Detector<NaiveDate>),
    ("last-week", dates::last_week as Detector<NaiveDate>),
    ("yesterday", dates::yesterday as Detector<NaiveDate>),
]);

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[test]
    fn scope_private_beats_work() {
        let (name, scope) = SCOPE_CHAIN
            .resolve("this is personal, not for work", today())
            .unwrap();
        assert_eq!(name, "private-phrase");
        assert_eq!(scope, Scope::Private);
    }

    #[test]
    fn scope_work_phrase() {
        let (_, scope) = SCOPE_CHAIN
            .resolve("quick work-related reminder", today())
            .unwrap();
        assert_eq!(scope, Scope::Work);
        assert!(SCOPE_CHAIN.resolve("groceries list", today()).is_none());
    }

    #[test]
    fn date_chain_declared_order_wins() {
        // Both an ordinal date and "yesterday" appear; the ordinal detector is first.
        let (name, date) = DATE_CHAIN
            .resolve("yesterday I found the 3rd of May letter", today())
            .unwrap();
        assert_eq!(name, "ordinal-month");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }

    #[test]
    fn date_chain_falls_through_to_relative() {
        let (name, date) = DATE_CHAIN.resolve("bought this yesterday", today()).unwrap();
        assert_eq!(name, "yesterday");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 8, 31).unwrap());
    }

    #[test]
    fn chain_names_are_ordered() {
        let names: Vec<_> = DATE_CHAIN.names().collect();
        assert_eq!(names.first(), Some(&"ordinal-month"));
        assert_eq!(names.last(), Some(&"yesterday"));
    }
}
