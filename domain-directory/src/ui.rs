//! Display logic for the domain-directory CLI.
//!
//! This module handles all terminal output: colored record lines, import
//! report summaries, enrichment outcome lines, spinner animation, and the
//! final summary bar. Uses only the `console` crate.

use console::{pad_str, style, Alignment, Term};
use domain_directory_lib::{DomainRecord, EnrichOutcome, ImportReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message (e.g. "Enriching 8 domains...").
    ///
    /// Returns `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Record lines ─────────────────────────────────────────────────────────────

const DOMAIN_WIDTH: usize = 30;

/// Print one stored record with status and metadata.
pub fn print_record(record: &DomainRecord, debug: bool) {
    let padded = pad_str(&record.name, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    let status = if record.enriched {
        style("ENRICHED").green().bold()
    } else {
        style("PENDING ").yellow()
    };

    let info = format_record_info(record);
    if info.is_empty() {
        println!("  {}  {}", style(&padded).white(), status);
    } else {
        println!(
            "  {}  {}  {}",
            style(&padded).white(),
            status,
            style(info).dim()
        );
    }

    if debug {
        println!(
            "    {} source: {}",
            style("└─").dim(),
            record.source,
        );
    }
}

/// Print all records followed by a count line.
pub fn print_list(records: &[DomainRecord], debug: bool) {
    if records.is_empty() {
        println!("{}", style("Directory is empty.").dim());
        return;
    }

    for record in records {
        print_record(record, debug);
    }

    let enriched = records.iter().filter(|r| r.enriched).count();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} record{}  {}  {}  {}  {}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" },
        style("|").dim(),
        style(format!("{} enriched", enriched)).green(),
        style("|").dim(),
        style(format!("{} pending", records.len() - enriched)).yellow(),
    );
}

/// Format a record's metadata (registrar, dates, notes) into a concise string.
pub fn format_record_info(record: &DomainRecord) -> String {
    let mut parts = Vec::new();
    if let Some(registrar) = &record.registrar {
        parts.push(format!("Registrar: {}", registrar));
    }
    if let Some(created) = &record.created_at {
        parts.push(format!("Created: {}", created));
    }
    if let Some(expires) = &record.expires_at {
        parts.push(format!("Expires: {}", expires));
    }
    if let Some(notes) = &record.notes {
        parts.push(format!("Notes: {}", notes));
    }
    parts.join(", ")
}

// ── Import report ────────────────────────────────────────────────────────────

/// Print the aggregated outcome of a batch import.
pub fn print_import_report(report: &ImportReport) {
    println!(
        "  {} inserted  {}  {} merged  {}  {} rejected",
        style(report.inserted).green().bold(),
        style("|").dim(),
        style(report.merged).cyan(),
        style("|").dim(),
        style(report.rejected.len()).red(),
    );

    for rejected in &report.rejected {
        println!(
            "  {} {}  {}",
            style("✗").red(),
            rejected.input,
            style(&rejected.reason).dim(),
        );
    }

    for warning in &report.warnings {
        println!("  {} {}", style("!").yellow(), style(warning).dim());
    }
}

// ── Enrichment outcome lines ─────────────────────────────────────────────────

/// Print a single enrichment outcome line.
pub fn print_enrich_outcome(name: &str, outcome: &EnrichOutcome) {
    let padded = pad_str(name, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    match outcome {
        EnrichOutcome::Success(_) => {
            println!(
                "  {}  {}",
                style(&padded).white(),
                style("ENRICHED").green().bold(),
            );
        }
        EnrichOutcome::PartialFailure { missing, .. } => {
            println!(
                "  {}  {}  {}",
                style(&padded).white(),
                style("ENRICHED").green(),
                style(format!("(response lacked: {})", missing.join(", "))).dim(),
            );
        }
        EnrichOutcome::Unavailable => {
            println!(
                "  {}  {}  {}",
                style(&padded).white(),
                style("UNCHANGED").yellow(),
                style("(WHOIS unavailable, fill fields manually)").dim(),
            );
        }
        EnrichOutcome::NotFound => {
            println!(
                "  {}  {}  {}",
                style(&padded).white(),
                style("NOT FOUND").red(),
                style("(registry does not know this domain)").dim(),
            );
        }
    }
}

/// Print the final enrichment summary bar.
pub fn print_enrich_summary(outcomes: &[(String, EnrichOutcome)], duration: Duration) {
    let enriched = outcomes
        .iter()
        .filter(|(_, o)| o.fields().is_some())
        .count();
    let unavailable = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, EnrichOutcome::Unavailable))
        .count();
    let not_found = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, EnrichOutcome::NotFound))
        .count();

    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} lookup{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(outcomes.len()).bold(),
        if outcomes.len() == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} enriched", enriched)).green(),
        style("|").dim(),
        style(format!("{} unavailable", unavailable)).yellow(),
        style("|").dim(),
        style(format!("{} not found", not_found)).red(),
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────
