// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spoken-to-symbol normalizer.
//!
//! Rewrites dictation patterns ("hashtag project pai", "slash archive",
//! "scope personal") into the written token forms so the written extractor
//! can handle both modes.

const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Trigger words; never captured as a hint argument.
const KEYWORDS: &[&str] = &["hashtag", "hash", "at", "slash", "forward", "scope", "tilde"];

/// Words after "at" that mark ordinary prepositional use.
const AT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "this", "that", "my", "your", "our", "their", "some", "any", "all", "no",
    "first", "last", "least", "most", "home", "work", "noon", "night", "midnight", "once",
    "times", "which", "what", "whatever",
];

/// Words never joined as the optional second word of a spoken hint.
const CONTINUATION_STOPWORDS: &[&str] = &[
    "this", "that", "these", "those", "is", "are", "was", "were", "be", "been", "and", "or",
    "but", "so", "then", "to", "for", "of", "in", "on", "with", "about", "from", "by", "as",
    "it", "its", "i", "me", "we", "you", "he", "she", "they", "them", "us", "please", "note",
    "remember", "today", "tomorrow", "yesterday", "tonight", "also", "just", "here", "there",
    "again", "who", "when", "where", "why", "how", "not", "do", "does", "did", "have", "has",
    "had", "will", "would", "should", "can", "could", "if", "up", "out", "into", "over",
    "after", "before", "the", "a", "an", "my", "your", "our", "their",
];

/// A spoken word split into its lower-cased bare form and trailing punctuation.
struct Word<'a> {
    bare: String,
    punct: &'a str,
}

impl<'a> Word<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let bare = raw.trim_end_matches(TRAILING);
        if bare.is_empty() || !bare.chars().all(|c| c.is_alphanumeric()) {
            return None;
        }
        Some(Word {
            bare: bare.to_lowercase(),
            punct: &raw[bare.len()..],
        })
    }

    fn is(&self, word: &str) -> bool {
        self.bare == word && self.punct.is_empty()
    }

    fn is_keyword(&self) -> bool {
        KEYWORDS.contains(&self.bare.as_str())
    }

    fn is_alphabetic(&self) -> bool {
        self.bare.chars().all(char::is_alphabetic)
    }

    /// Can this word extend the previous one into a two-word hint?
    fn joinable(&self) -> bool {
        !self.is_keyword() && !CONTINUATION_STOPWORDS.contains(&self.bare.as_str())
    }
}

fn word_at<'a>(words: &[&'a str], i: usize) -> Option<Word<'a>> {
    words.get(i).and_then(|w| Word::parse(w))
}

/// Rewrites spoken hint patterns in `text` into written tokens.
///
/// `known_commands` stops a command from swallowing the following word:
/// "slash archive old lease" becomes `/archive old lease`, not `/archive-old`.
pub fn normalize(text: &str, known_commands: &[String]) -> String {
    text.lines()
        .map(|line| normalize_line(line, known_commands))
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str, known_commands: &[String]) -> String {
    let words: Vec<&str> = line.split_whitespace().collect();
    let mut out = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        match rewrite_at(&words[i..], known_commands) {
            Some((token, used)) => {
                out.push(token);
                i += used;
            }
            None => {
                out.push(words[i].to_string());
                i += 1;
            }
        }
    }
    out.join(" ")
}

/// Tries to rewrite a pattern starting at `words[0]`, returning the token and
/// how many words it consumed.
fn rewrite_at(words: &[&str], known_commands: &[String]) -> Option<(String, usize)> {
    let head = word_at(words, 0)?;
    if !head.punct.is_empty() {
        return None;
    }

    match head.bare.as_str() {
        "hashtag" => hashtag(words, 1),
        "hash" if word_at(words, 1).is_some_and(|w| w.is("tag")) => hashtag(words, 2),
        "at" => mention(words),
        "slash" => command(words, 1, known_commands),
        "forward" if word_at(words, 1).is_some_and(|w| w.is("slash")) => {
            command(words, 2, known_commands)
        }
        "scope" | "tilde" => {
            let arg = word_at(words, 1)?;
            let scope = match arg.bare.as_str() {
                "private" | "personal" => "private",
                "work" => "work",
                _ => return None,
            };
            Some((format!("~{scope}{}", arg.punct), 2))
        }
        _ => None,
    }
}

fn hashtag(words: &[&str], at: usize) -> Option<(String, usize)> {
    let first = word_at(words, at)?;
    if first.is_keyword() {
        return None;
    }
    if !first.punct.is_empty() {
        return Some((format!("#{}{}", first.bare, first.punct), at + 1));
    }
    if word_at(words, at + 1).is_some_and(|w| w.is("slash"))
        && let Some(sub) = word_at(words, at + 2)
    {
        return Some((format!("#{}/{}{}", first.bare, sub.bare, sub.punct), at + 3));
    }
    match word_at(words, at + 1).filter(Word::joinable) {
        Some(second) => Some((
            format!("#{}-{}{}", first.bare, second.bare, second.punct),
            at + 2,
        )),
        None => Some((format!("#{}", first.bare), at + 1)),
    }
}

fn mention(words: &[&str]) -> Option<(String, usize)> {
    let first = word_at(words, 1)?;
    if !first.is_alphabetic()
        || first.is_keyword()
        || AT_STOPWORDS.contains(&first.bare.as_str())
    {
        return None;
    }
    if !first.punct.is_empty() {
        return Some((format!("@{}{}", first.bare, first.punct), 2));
    }
    match word_at(words, 2).filter(|w| w.joinable() && w.is_alphabetic()) {
        Some(second) => Some((
            format!("@{}_{}{}", first.bare, second.bare, second.punct),
            3,
        )),
        None => Some((format!("@{}", first.bare), 2)),
    }
}

fn command(words: &[&str], at: usize, known_commands: &[String]) -> Option<(String, usize)> {
    let first = word_at(words, at)?;
    if first.is_keyword() || !first.bare.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let known = known_commands.iter().any(|c| *c == first.bare);
    if known || !first.punct.is_empty() {
        return Some((format!("/{}{}", first.bare, first.punct), at + 1));
    }
    match word_at(words, at + 1).filter(Word::joinable) {
        Some(second) => Some((
            format!("/{}-{}{}", first.bare, second.bare, second.punct),
            at + 2,
        )),
        None => Some((format!("/{}", first.bare), at + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        ["archive", "receipt", "clip", "note", "keep"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn n(text: &str) -> String {
        normalize(text, &known())
    }

    #[test]
    fn hashtag_two_words_join_with_hyphen() {
        assert_eq!(
            n("hashtag project pai this is a note"),
            "#project-pai this is a note"
        );
    }

    #[test]
    fn hashtag_slash_builds_nested_tag() {
        assert_eq!(n("Hashtag work slash Q3 review"), "#work/q3 review");
    }

    #[test]
    fn hashtag_stops_at_stopword() {
        assert_eq!(n("hashtag urgent for tomorrow"), "#urgent for tomorrow");
    }

    #[test]
    fn hash_tag_split_word() {
        assert_eq!(n("hash tag travel."), "#travel.");
    }

    #[test]
    fn at_mention_two_words() {
        assert_eq!(n("call at Ed Overy later"), "call @ed_overy later");
    }

    #[test]
    fn at_prepositional_use_is_kept() {
        assert_eq!(n("look at the contract"), "look at the contract");
        assert_eq!(n("meet at 5 pm"), "meet at 5 pm");
        assert_eq!(n("arrive at noon"), "arrive at noon");
    }

    #[test]
    fn known_command_does_not_swallow_next_word() {
        assert_eq!(n("slash archive old lease"), "/archive old lease");
        assert_eq!(n("forward slash receipt"), "/receipt");
    }

    #[test]
    fn unknown_command_joins_second_word() {
        assert_eq!(n("slash daily log"), "/daily-log");
    }

    #[test]
    fn scope_personal_maps_to_private() {
        assert_eq!(n("scope personal shopping list"), "~private shopping list");
        assert_eq!(n("tilde work standup"), "~work standup");
        assert_eq!(n("scope creep again"), "scope creep again");
    }

    #[test]
    fn lines_are_preserved() {
        assert_eq!(n("hashtag a\nslash note"), "#a\n/note");
    }
}
