// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical filenames for filed documents.
//!
//! `TYPE - YYYYMMDD - Description [(Details)] - CATEGORY.ext`. A source file
//! already in this form keeps its name, so reprocessing never renames twice.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use siphon_core::Pipeline;

/// Document types recognised in canonical names.
pub const DOCUMENT_TYPES: &[&str] = &[
    "INVOICE",
    "RECEIPT",
    "BILL",
    "CONTRACT",
    "LEASE",
    "DEED",
    "CERTIFICATE",
    "CORRESPONDENCE",
    "STATEMENT",
    "POLICY",
    "DOCUMENT",
];

/// Maximum length of each free-text field, in characters.
pub const MAX_FIELD_CHARS: usize = 80;

const DEFAULT_CATEGORY: &str = "GENERAL";
const DEFAULT_DESCRIPTION: &str = "Untitled";

static CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(?:{}) - \d{{8}} - ", DOCUMENT_TYPES.join("|"))).unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Whether a filename already follows the canonical archive convention.
pub fn should_preserve_archive_name(filename: &str) -> bool {
    CANONICAL.is_match(filename)
}

/// Inputs for one archive name.
#[derive(Debug, Clone, Default)]
pub struct NameRequest<'a> {
    pub doc_type: Option<&'a str>,
    /// Document date from metadata; today when absent.
    pub date: Option<NaiveDate>,
    pub description: &'a str,
    pub details: Option<&'a str>,
    pub category: Option<&'a str>,
    /// Without the leading dot. Empty means no extension.
    pub extension: &'a str,
    pub source_filename: Option<&'a str>,
}

/// Builds archive names against a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct ArchiveNamer {
    today: NaiveDate,
}

impl ArchiveNamer {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// A namer dated with the local calendar day.
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    /// Type used when neither the user, the router nor the content supplied one.
    pub fn default_type(pipeline: Pipeline) -> &'static str {
        match pipeline {
            Pipeline::Receipt => "RECEIPT",
            _ => "DOCUMENT",
        }
    }

    pub fn name(&self, request: &NameRequest<'_>) -> String {
        if let Some(source) = request.source_filename
            && should_preserve_archive_name(source)
        {
            return source.to_string();
        }

        // A type outside the known set files as DOCUMENT and keeps the
        // user's word at the front of the description.
        let requested = request.doc_type.map(sanitize_field).filter(|t| !t.is_empty());
        let (doc_type, label) = match requested {
            Some(t) if DOCUMENT_TYPES.contains(&t.to_uppercase().as_str()) => (t.to_uppercase(), None),
            Some(t) => ("DOCUMENT".to_string(), Some(t)),
            None => ("DOCUMENT".to_string(), None),
        };
        let date = request.date.unwrap_or(self.today).format("%Y%m%d");
        let description = match label {
            Some(label) => sanitize_field(&format!("{label} {}", request.description)),
            None => sanitize_field(request.description),
        };
        let description = Some(description)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        let category = request
            .category
            .map(|c| sanitize_field(c).to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let mut name = format!("{doc_type} - {date} - {description}");
        if let Some(details) = request.details.map(sanitize_field)
            && !details.is_empty()
        {
            name.push_str(&format!(" ({details})"));
        }
        name.push_str(" - ");
        name.push_str(&category);

        let extension = sanitize_extension(request.extension);
        if !extension.is_empty() {
            name.push('.');
            name.push_str(&extension);
        }
        name
    }
}

/// Strip filesystem-illegal characters, collapse whitespace and bound length.
pub fn sanitize_field(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if matches!(c, '(' | ')') { ' ' } else { c })
        .collect();
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    let truncated: String = collapsed.chars().take(MAX_FIELD_CHARS).collect();
    truncated
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.' || c == '-')
        .to_string()
}

fn sanitize_extension(ext: &str) -> String {
    ext.trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(10)
        .collect::<String>()
        .to_lowercase()
}
