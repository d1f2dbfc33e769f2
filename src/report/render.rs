//! Narrative rendering for human operators

use colored::{ColoredString, Colorize};
use std::fmt::Write;

use super::result::{CheckStatus, ProbeResult};
use super::summary::Report;
use crate::utils::format_duration;

/// Things the harness cannot check without a browser
pub const MANUAL_FOLLOW_UPS: &[&str] = &[
    "Sign-up flow and free-tier badge display",
    "Feature paywall modals (analytics, team, reports)",
    "Pricing page showing every tier",
    "End-to-end checkout with the payment provider",
    "Responsive layout on mobile, tablet and desktop",
];

fn status_icon(status: CheckStatus) -> ColoredString {
    match status {
        CheckStatus::Pass => "✓".green().bold(),
        CheckStatus::Warn => "!".yellow().bold(),
        CheckStatus::Fail => "✗".red().bold(),
    }
}

fn status_label(status: CheckStatus) -> ColoredString {
    match status {
        CheckStatus::Pass => status.label().green(),
        CheckStatus::Warn => status.label().yellow(),
        CheckStatus::Fail => status.label().red().bold(),
    }
}

/// Render one result with its notes and, when it did not pass, its snippet
fn render_result(out: &mut String, result: &ProbeResult) {
    let _ = writeln!(
        out,
        "{} {} {} {}",
        status_icon(result.status),
        result.name.bold(),
        format!("({})", format_duration(result.duration)).dimmed(),
        status_label(result.status)
    );
    let _ = writeln!(out, "    {}", result.detail);
    for note in &result.notes {
        let _ = writeln!(out, "    {} {}", "·".dimmed(), note);
    }
    if !result.passed() {
        if let Some(snippet) = &result.snippet {
            let _ = writeln!(out, "    {} {}", "Response:".dimmed(), snippet.dimmed());
        }
    }
}

/// Full narrative report as a string
pub fn render_narrative(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} Deployment verification ({} checks, {})\n",
        "→".cyan().bold(),
        report.results.len(),
        format_duration(report.duration)
    );

    for result in &report.results {
        render_result(&mut out, result);
    }

    if report.partial {
        let _ = writeln!(
            out,
            "\n{} Run cancelled; {} check(s) not run: {}",
            "!".yellow().bold(),
            report.not_run.len(),
            report.not_run.join(", ")
        );
    }

    let mutating: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.mutating)
        .map(|r| r.name.as_str())
        .collect();
    if !mutating.is_empty() {
        let _ = writeln!(
            out,
            "\n{} Checks with external side effects ran: {}",
            "!".yellow(),
            mutating.join(", ")
        );
    }

    let counts = report.counts();
    let _ = writeln!(
        out,
        "\n{} {} passed, {} warned, {} failed | overall {}",
        "Summary:".bold(),
        counts.passed,
        counts.warned,
        counts.failed,
        status_label(report.overall())
    );

    let _ = writeln!(out, "\n{}", "Manual verification still required:".dimmed());
    for item in MANUAL_FOLLOW_UPS {
        let _ = writeln!(out, "  {} {}", "−".dimmed(), item.dimmed());
    }

    out
}

/// Print the narrative report to stdout
pub fn print_report(report: &Report) {
    print!("{}", render_narrative(report));
}
