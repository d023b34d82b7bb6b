// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-resort document typing from extracted content.

use std::sync::LazyLock;

use regex::Regex;
use siphon_core::{HintMetadata, Pipeline};
use tracing::debug;

/// Structural signatures, checked in order.
static SIGNATURES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "INVOICE",
            Regex::new(r"(?i)\btax invoice\b|\binvoice\s*(?:no\b\.?|number\b|#)").unwrap(),
        ),
        (
            "RECEIPT",
            Regex::new(r"(?i)\breceipt\b|\bpayment received\b").unwrap(),
        ),
        (
            "CONTRACT",
            Regex::new(r"(?i)\bcontract\b|\bagreement\b|\bterms and conditions\b").unwrap(),
        ),
        (
            "CERTIFICATE",
            Regex::new(r"(?i)\bcertificate\b|\bcertification\b").unwrap(),
        ),
        (
            "CORRESPONDENCE",
            Regex::new(
                r"(?im)^\s*dear\s+\S|\byours (?:sincerely|faithfully|truly)\b|\b(?:kind|best) regards\b",
            )
            .unwrap(),
        ),
        (
            "BILL",
            Regex::new(r"(?i)\bamount due\b|\bbalance due\b|\bbill\b").unwrap(),
        ),
    ]
});

/// The first document type whose signature appears in `content`.
pub fn classify_document(content: &str) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(_, re)| re.is_match(content))
        .map(|(name, _)| *name)
}

/// Fill an unset `type` for archival pipelines from the extracted content.
///
/// Returns the type that was filled in, if any.
pub fn fill_document_type(
    metadata: &mut HintMetadata,
    pipeline: Pipeline,
    content: &str,
) -> Option<&'static str> {
    if !pipeline.is_archival() || metadata.doc_type.is_some() {
        return None;
    }
    let doc_type = classify_document(content)?;
    debug!(doc_type, "document type detected from content");
    metadata.doc_type = Some(doc_type.to_string());
    Some(doc_type)
}
