// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dictated intent: pipeline, category and type signals in plain phrasing.
//!
//! Tables are scanned in declared order. The first table with any matching
//! phrase wins, and within a table the first matching pattern is reported.

use std::sync::LazyLock;

use regex::Regex;
use siphon_core::{HintMetadata, Pipeline};

type PhraseTable = Vec<(&'static str, Regex)>;

fn table(entries: &[(&'static str, &str)]) -> PhraseTable {
    entries
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(&format!("(?i){pattern}")).unwrap()))
        .collect()
}

static RECEIPT_PHRASES: LazyLock<PhraseTable> = LazyLock::new(|| {
    table(&[
        ("receipt", r"\breceipts?\b"),
        ("invoice", r"\binvoices?\b"),
        ("bill", r"\bbills?\b"),
        ("purchase", r"\bpurchase[sd]?\b"),
        ("expense", r"\bexpenses?\b"),
        ("bought", r"\bbought\b"),
        ("paid", r"\bpaid\b"),
    ])
});

static ARCHIVE_PHRASES: LazyLock<PhraseTable> = LazyLock::new(|| {
    table(&[
        ("archive", r"\barchive\b"),
        ("file", r"\bfile (?:this|it|away)\b"),
        ("store", r"\bstore (?:this|it)\b"),
        ("save-document", r"\bsave (?:this |the )?(?:document|doc)\b"),
        ("contract", r"\bcontracts?\b"),
        ("agreement", r"\bagreements?\b"),
        ("lease", r"\blease\b"),
        ("certificate", r"\bcertificates?\b"),
        ("keep-for-records", r"\bkeep (?:this |it )?for (?:my |the )?records\b"),
    ])
});

static CATEGORY_KEYWORDS: LazyLock<PhraseTable> = LazyLock::new(|| {
    table(&[
        (
            "HOME",
            r"\b(?:home|house|mortgage|rent|utilit(?:y|ies)|electricity|council tax)\b",
        ),
        ("WORK", r"\b(?:work|office|client|business|employer|payslip)\b"),
        ("CAR", r"\b(?:car|vehicle|mot|garage|tyres?|petrol|fuel)\b"),
        (
            "HEALTH",
            r"\b(?:health|doctor|dentist|medical|hospital|pharmacy|prescription)\b",
        ),
    ])
});

// More specific types first: "lease agreement" is a LEASE.
static TYPE_KEYWORDS: LazyLock<PhraseTable> = LazyLock::new(|| {
    table(&[
        ("LEASE", r"\blease\b"),
        ("DEED", r"\bdeeds?\b"),
        ("CERTIFICATE", r"\bcertificates?\b"),
        ("CONTRACT", r"\b(?:contract|agreement)s?\b"),
    ])
});

/// A pipeline inferred from phrasing, with any category/type sub-detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictatedIntent {
    pub pipeline: Pipeline,
    /// Name of the phrase pattern that matched.
    pub phrase: &'static str,
    pub category: Option<&'static str>,
    pub doc_type: Option<&'static str>,
}

impl DictatedIntent {
    pub fn metadata(&self) -> HintMetadata {
        HintMetadata {
            category: self.category.map(String::from),
            doc_type: self.doc_type.map(String::from),
            ..HintMetadata::default()
        }
    }
}

/// Scan text for receipt phrasing, then archive phrasing.
pub fn detect_dictated(text: &str) -> Option<DictatedIntent> {
    let tables: [(Pipeline, &PhraseTable); 2] = [
        (Pipeline::Receipt, &RECEIPT_PHRASES),
        (Pipeline::Archive, &ARCHIVE_PHRASES),
    ];
    tables.into_iter().find_map(|(pipeline, phrases)| {
        first_match(phrases, text).map(|phrase| DictatedIntent {
            pipeline,
            phrase,
            category: first_match(&CATEGORY_KEYWORDS, text),
            doc_type: first_match(&TYPE_KEYWORDS, text),
        })
    })
}

fn first_match(table: &PhraseTable, text: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
}
