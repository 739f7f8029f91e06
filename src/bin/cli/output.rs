//! Console Output and Display Functions
//!
//! Run summaries, progress spinners and report rendering.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::cli::messages::Messages;
use knxrename_rs::RenameReport;

/// Spinner shown while a long operation runs
pub fn start_spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.blue} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print the human-readable summary of a rename run
pub fn display_report(report: &RenameReport, messages: &Messages, translation_requested: bool) {
    println!();
    println!("{}", format!("✅ {}", messages.finished).bright_green().bold());
    println!();

    for (label, value) in summary_rows(report, messages) {
        println!("   {:<42} {}", label, value.to_string().cyan());
    }

    if translation_requested && !report.translation_active {
        println!();
        println!("{}", format!("⚠️  {}", messages.translation_inactive).yellow());
    }

    println!();
    println!(
        "📄 {}: {}",
        messages.updated_document,
        report.updated_document.display().to_string().cyan()
    );
    if let Some(original) = &report.original_document {
        println!(
            "📄 {}: {}",
            messages.original_document,
            original.display().to_string().cyan()
        );
    }
    println!("{}", format!("   ({} ms)", report.duration_ms).dimmed());
}

fn summary_rows<'m>(report: &RenameReport, messages: &'m Messages) -> Vec<(&'m str, usize)> {
    let mut rows = vec![
        (messages.renamed, report.renamed()),
        (messages.skipped, report.skipped()),
        (messages.unlocated, report.stats.missing_locations),
        (messages.default_roles, report.stats.default_roles),
    ];
    if report.translation_active {
        rows.push((messages.translated, report.translated_labels));
    }
    if report.original_document.is_some() {
        rows.push((messages.pruned, report.pruned.len()));
    }
    rows
}
