// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Combining hints from two sources (caption and transcript).

use siphon_core::InlineHints;

/// Merge `additional` into a copy of `base`.
///
/// Tags, people and commands are unioned without duplicates. Scope keeps the
/// base value when there is one. Metadata is a shallow merge where
/// `additional` wins per key. Cleaned content comes from `additional` unless
/// it is empty.
///
/// Not commutative: the first source to set a scope keeps it.
pub fn merge_hints(base: &InlineHints, additional: &InlineHints) -> InlineHints {
    let mut merged = base.clone();
    for tag in &additional.tags {
        merged.add_tag(tag);
    }
    for person in &additional.people {
        merged.add_person(person);
    }
    for command in &additional.commands {
        merged.add_command(command);
    }
    if let Some(scope) = additional.scope {
        merged.offer_scope(scope);
    }
    merged.metadata.overwrite_with(&additional.metadata);
    if !additional.cleaned_content.trim().is_empty() {
        merged.cleaned_content = additional.cleaned_content.clone();
    }
    merged
}
