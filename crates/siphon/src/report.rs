// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text output for `poll`, `process` and `retry`.

use siphon_agent::status::{ERROR_EXCERPT_CHARS, excerpt};
use siphon_agent::{MessagePlan, Outcome, PassSummary, PollSummary, RetryResult};
use siphon_core::MessageRecord;

pub fn print_poll(summary: &PollSummary) {
    println!(
        "fetched {} update(s), {} new, {} pending",
        summary.fetched, summary.new, summary.pending
    );
}

pub fn print_pass(summary: &PassSummary) {
    println!("{}", pass_line(summary));
}

fn pass_line(summary: &PassSummary) -> String {
    if summary.fetched == 0 {
        return "no new messages".to_string();
    }
    let mut line = format!(
        "processed {}: {} completed, {} failed, {} blocked",
        summary.processed(),
        summary.completed,
        summary.failed,
        summary.blocked
    );
    if summary.skipped > 0 {
        line.push_str(&format!(", {} skipped", summary.skipped));
    }
    if summary.interrupted {
        line.push_str(" (interrupted, remaining messages left pending)");
    }
    line
}

pub fn print_plans(plans: &[MessagePlan]) {
    if plans.is_empty() {
        println!("dry run: no pending messages");
        return;
    }
    println!("dry run: {} message(s), nothing will be written", plans.len());
    for plan in plans {
        println!();
        print!("{plan}");
    }
}

pub fn print_retryable(records: &[MessageRecord]) {
    if records.is_empty() {
        println!("no messages can be retried now");
        return;
    }
    for record in records {
        println!("{}", retryable_line(record));
    }
}

fn retryable_line(record: &MessageRecord) -> String {
    format!(
        "{:>10}  {:<8} attempts={}  {}",
        record.message_id,
        record.content_type.to_string(),
        record.attempts,
        excerpt(record.last_error.as_deref().unwrap_or(""), ERROR_EXCERPT_CHARS)
    )
}

pub fn print_retry_results(results: &[RetryResult]) {
    if results.is_empty() {
        println!("nothing to retry");
        return;
    }
    for result in results {
        println!("{}", retry_line(result));
    }
}

fn retry_line(result: &RetryResult) -> String {
    match &result.outcome {
        Outcome::Completed { paths } => {
            format!("{}: completed ({})", result.message_id, paths.join(", "))
        }
        Outcome::Failed { error } => format!(
            "{}: failed again: {}",
            result.message_id,
            excerpt(error, ERROR_EXCERPT_CHARS)
        ),
        Outcome::Blocked { error } => format!(
            "{}: blocked: {}",
            result.message_id,
            excerpt(error, ERROR_EXCERPT_CHARS)
        ),
    }
}

pub fn print_reset(count: usize) {
    println!("{count} message(s) reset to pending; the next process run picks them up");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pass_says_so() {
        assert_eq!(pass_line(&PassSummary::default()), "no new messages");
    }

    #[test]
    fn pass_line_reports_interruption() {
        let summary = PassSummary {
            fetched: 3,
            new: 3,
            completed: 1,
            failed: 1,
            interrupted: true,
            ..PassSummary::default()
        };
        let line = pass_line(&summary);
        assert!(line.starts_with("processed 2: 1 completed, 1 failed, 0 blocked"));
        assert!(line.ends_with("(interrupted, remaining messages left pending)"));
    }

    #[test]
    fn retry_lines() {
        let done = RetryResult {
            message_id: 5,
            outcome: Outcome::Completed {
                paths: vec!["/vault/Inbox/a.md".into()],
            },
        };
        assert_eq!(retry_line(&done), "5: completed (/vault/Inbox/a.md)");

        let failed = RetryResult {
            message_id: 6,
            outcome: Outcome::Failed {
                error: "processor transcription failed:\n exit 1".into(),
            },
        };
        assert_eq!(
            retry_line(&failed),
            "6: failed again: processor transcription failed: exit 1"
        );
    }
}
