// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `siphon status` command implementation.
//!
//! Reads the message store only: no channel, no config beyond storage.

use std::io::IsTerminal;

use colored::Color;
use siphon_agent::StatusReport;
use siphon_agent::status::FailureSummary;
use siphon_core::{FailureKind, SiphonError};
use siphon_storage::MessageStore;

/// Run the `siphon status` command.
///
/// If `--json` is passed, outputs the report as JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(store: &MessageStore, json: bool, plain: bool) -> Result<(), SiphonError> {
    let report = StatusReport::load(store).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render(&report, use_color));
    }
    Ok(())
}

fn render(report: &StatusReport, use_color: bool) -> String {
    let c = &report.counts;
    let mut out = String::new();
    out.push('\n');
    out.push_str("  siphon status\n");
    out.push_str(&format!("  {}\n", "-".repeat(35)));

    out.push_str(&count_line(c.pending, "pending", use_color.then_some(Color::Yellow)));
    out.push_str(&count_line(c.processing, "processing", use_color.then_some(Color::Cyan)));
    out.push_str(&count_line(c.completed, "completed", use_color.then_some(Color::Green)));
    out.push_str(&count_line(c.failed, "failed", use_color.then_some(Color::Red)));
    out.push_str(&format!(
        "          ({} retryable now, {} blocked)\n",
        c.retry_eligible, c.blocked
    ));
    match report.channel_offset {
        Some(offset) => out.push_str(&format!("  Channel offset: {offset}\n")),
        None => out.push_str("  Channel offset: none confirmed yet\n"),
    }

    if !report.recent_failures.is_empty() {
        out.push('\n');
        out.push_str("  Recent failures:\n");
        for failure in &report.recent_failures {
            out.push_str(&format!("    {}\n", failure_line(failure, use_color)));
        }
    }
    out.push('\n');
    out
}

/// `     3  failed`, colored only when non-zero.
fn count_line(n: u64, label: &str, color: Option<Color>) -> String {
    use colored::Colorize;

    let text = format!("{n:>6}  {label}");
    match color {
        Some(color) if n > 0 => format!("  {}\n", text.as_str().color(color)),
        _ => format!("  {text}\n"),
    }
}

fn failure_line(failure: &FailureSummary, use_color: bool) -> String {
    use colored::Colorize;

    let marker = match (failure.failure_kind, use_color) {
        (Some(FailureKind::Blocked), true) => "blocked".red().to_string(),
        (Some(FailureKind::Blocked), false) => "[BLOCKED]".to_string(),
        (_, true) if failure.retry_now => "retry".yellow().to_string(),
        (_, false) if failure.retry_now => "[RETRY]".to_string(),
        (_, true) => "failed".red().to_string(),
        (_, false) => "[FAIL]".to_string(),
    };
    format!(
        "#{} {} {} {}",
        failure.message_id, failure.content_type, marker, failure.error
    )
}

#[cfg(test)]
mod tests {
    use siphon_core::ContentType;
    use siphon_storage::StatusCounts;

    use super::*;

    fn report() -> StatusReport {
        StatusReport {
            counts: StatusCounts {
                pending: 2,
                processing: 0,
                completed: 10,
                failed: 3,
                retry_eligible: 2,
                blocked: 1,
            },
            channel_offset: Some(512),
            recent_failures: vec![
                FailureSummary {
                    message_id: 7,
                    content_type: ContentType::Voice,
                    failure_kind: Some(FailureKind::Tool),
                    retry_now: true,
                    failed_at: None,
                    error: "[tool-failure] transcription timed out".into(),
                },
                FailureSummary {
                    message_id: 8,
                    content_type: ContentType::Text,
                    failure_kind: Some(FailureKind::Blocked),
                    retry_now: false,
                    failed_at: None,
                    error: "[blocked] recursive-delete".into(),
                },
            ],
        }
    }

    #[test]
    fn plain_render_lists_counts_and_failures() {
        let out = render(&report(), false);
        assert!(out.contains("     2  pending"));
        assert!(out.contains("    10  completed"));
        assert!(out.contains("(2 retryable now, 1 blocked)"));
        assert!(out.contains("Channel offset: 512"));
        assert!(out.contains("#7 voice [RETRY] [tool-failure] transcription timed out"));
        assert!(out.contains("#8 text [BLOCKED] [blocked] recursive-delete"));
    }

    #[test]
    fn empty_store_renders_without_failures() {
        let empty = StatusReport {
            counts: StatusCounts::default(),
            channel_offset: None,
            recent_failures: vec![],
        };
        let out = render(&empty, false);
        assert!(out.contains("none confirmed yet"));
        assert!(!out.contains("Recent failures"));
    }

    #[test]
    fn report_serializes() {
        let json = serde_json::to_string(&report()).unwrap();
        assert!(json.contains("\"pending\":2"));
        assert!(json.contains("\"channel_offset\":512"));
        assert!(json.contains("\"retry_now\":true"));
    }
}
