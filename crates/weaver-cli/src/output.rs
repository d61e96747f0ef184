//! Report rendering: console tables, JSON and CSV

use crate::cli::OutputFormat;
use crate::vault::display_path;
use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use weaver_core::{DeadLink, IssueSeverity, RunReport, ValidationReport, VaultStats};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ReportRow<'a> {
    kind: &'a str,
    document: &'a str,
    path: String,
    line: usize,
    text: &'a str,
    detail: String,
}

/// Render a linking run
pub fn render_report(report: &RunReport, root: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Csv => write_report_csv(report, root, std::io::stdout().lock()),
        OutputFormat::Console => {
            print_report_console(report, root);
            Ok(())
        }
    }
}

/// One CSV row per edit, pending choice, skipped link and diagnostic
pub fn write_report_csv(report: &RunReport, root: &Path, out: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for doc in &report.documents {
        let path = display_path(root, &doc.path);
        for edit in &doc.edits {
            writer.serialize(ReportRow {
                kind: "edit",
                document: &doc.document_id,
                path: path.clone(),
                line: edit.line,
                text: &edit.replacement.original_text,
                detail: edit.replacement.replacement_text.clone(),
            })?;
        }
        for pending in &doc.pending {
            let choices: Vec<&str> = pending.shortlist.iter().map(|t| t.document_id.as_str()).collect();
            writer.serialize(ReportRow {
                kind: "pending",
                document: &doc.document_id,
                path: path.clone(),
                line: pending.line,
                text: &pending.source_text,
                detail: choices.join(" | "),
            })?;
        }
        for skipped in &doc.skipped_links {
            writer.serialize(ReportRow {
                kind: "skipped",
                document: &doc.document_id,
                path: path.clone(),
                line: 0,
                text: &skipped.source_text,
                detail: format!("{:?}", skipped.reason).to_lowercase(),
            })?;
        }
        for diag in &doc.diagnostics {
            writer.serialize(ReportRow {
                kind: "diagnostic",
                document: &doc.document_id,
                path: path.clone(),
                line: diag.line,
                text: "",
                detail: diag.message.to_string(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_report_console(report: &RunReport, root: &Path) {
    for doc in report.documents.iter().filter(|d| !d.is_quiet()) {
        let path = display_path(root, &doc.path);
        if !doc.edits.is_empty() || !doc.pending.is_empty() || !doc.diagnostics.is_empty() {
            println!("{}", path.bold());
        }
        for edit in &doc.edits {
            println!(
                "  {:>5}  {} {} {}",
                edit.line.to_string().dimmed(),
                edit.replacement.original_text,
                "->".dimmed(),
                edit.replacement.replacement_text.green()
            );
        }
        for pending in &doc.pending {
            let choices: Vec<&str> = pending.shortlist.iter().map(|t| t.document_id.as_str()).collect();
            println!(
                "  {:>5}  {} {} {}",
                pending.line.to_string().dimmed(),
                pending.source_text,
                "ambiguous:".yellow(),
                choices.join(", ")
            );
        }
        for diag in &doc.diagnostics {
            println!("  {:>5}  {}", diag.line.to_string().dimmed(), diag.message.red());
        }
    }

    if !report.alias_additions.is_empty() {
        println!("\n{}", "Aliases".bold());
        for addition in &report.alias_additions {
            println!("  {} {} {}", addition.document_id, "+".green(), addition.new_alias);
        }
    }
    for skipped in &report.skipped_aliases {
        println!(
            "  {} {} {} ({:?})",
            skipped.document_id,
            "skipped".yellow(),
            skipped.alias,
            skipped.reason
        );
    }
    for collision in &report.collisions {
        println!(
            "{} \"{}\" claimed by {} and {}; using {}",
            "collision:".yellow(),
            collision.name,
            collision.previous_id,
            collision.winning_id,
            collision.winning_id
        );
    }
    for err in &report.load_errors {
        println!("{} {}: {}", "not loaded:".red(), err.path.display(), err.message);
    }
    for err in &report.write_errors {
        println!("{} {}: {}", "not written:".red(), err.document_id, err.message);
    }
    if report.backend_unavailable {
        println!("{}", "similarity backend unavailable; rule confidences used".yellow());
    }

    let s = &report.summary;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Notes", "Changed", "Candidates", "Links", "Aliases", "Pending", "Diagnostics"]);
    table.add_row(vec![
        Cell::new(s.documents_scanned),
        Cell::new(s.documents_changed),
        Cell::new(s.candidates),
        Cell::new(s.links_applied).fg(Color::Green),
        Cell::new(s.aliases_added),
        Cell::new(s.pending).fg(if s.pending > 0 { Color::Yellow } else { Color::Reset }),
        Cell::new(s.diagnostics).fg(if s.diagnostics > 0 { Color::Red } else { Color::Reset }),
    ]);
    println!("\n{table}");

    if report.dry_run && s.links_applied + s.aliases_added > 0 {
        println!("{}", "Dry run: nothing written. Re-run with --execute to apply.".dimmed());
    }
}

/// Render dead links
pub fn render_dead_links(dead: &[DeadLink], root: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&dead),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
            writer.write_record(["path", "line", "kind", "target", "suggestions"])?;
            for d in dead {
                writer.write_record([
                    display_path(root, &d.path),
                    d.line.to_string(),
                    d.kind.describe().to_string(),
                    d.target.clone(),
                    d.suggestions.join(" | "),
                ])?;
            }
            writer.flush()?;
            Ok(())
        }
        OutputFormat::Console => {
            if dead.is_empty() {
                println!("{}", "No dead links.".green());
                return Ok(());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["File", "Line", "Problem", "Target", "Did you mean"]);
            for d in dead {
                table.add_row(vec![
                    Cell::new(display_path(root, &d.path)),
                    Cell::new(d.line),
                    Cell::new(d.kind.describe()).fg(Color::Red),
                    Cell::new(&d.target),
                    Cell::new(d.suggestions.join(", ")),
                ]);
            }
            println!("{table}");
            println!("{} dead link(s)", dead.len());
            Ok(())
        }
    }
}

/// Render link statistics
pub fn render_stats(stats: &VaultStats, orphans_only: bool, format: OutputFormat) -> Result<()> {
    let rows: Vec<_> = stats
        .documents
        .iter()
        .filter(|d| !orphans_only || stats.orphans.contains(&d.document_id))
        .collect();

    match format {
        OutputFormat::Json if orphans_only => print_json(&stats.orphans),
        OutputFormat::Json => print_json(stats),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            Ok(())
        }
        OutputFormat::Console => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec![
                "Note", "Words", "Wikilinks", "Inline", "Refs", "Density", "Targets", "Incoming",
            ]);
            for d in rows {
                table.add_row(vec![
                    Cell::new(&d.document_id),
                    Cell::new(d.words),
                    Cell::new(d.wikilinks),
                    Cell::new(d.inline_links),
                    Cell::new(d.reference_definitions),
                    Cell::new(format!("{:.2}", d.density)),
                    Cell::new(d.unique_targets),
                    Cell::new(d.incoming),
                ]);
            }
            println!("{table}");
            println!(
                "{} words, {} links, {:.2} links per 100 words, {} orphan(s)",
                stats.total_words,
                stats.total_links,
                stats.density,
                stats.orphans.len()
            );
            Ok(())
        }
    }
}

/// One CSV row per header issue
pub fn write_validation_csv(report: &ValidationReport, root: &Path, out: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["path", "severity", "problem"])?;
    for issue in &report.issues {
        let severity = match issue.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        writer.write_record([display_path(root, &issue.path), severity.to_string(), issue.problem.describe()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Render frontmatter validation results
pub fn render_validation(report: &ValidationReport, root: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Csv => write_validation_csv(report, root, std::io::stdout().lock()),
        OutputFormat::Console => {
            if !report.issues.is_empty() {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["File", "Severity", "Problem"]);
                for issue in &report.issues {
                    let severity = match issue.severity {
                        IssueSeverity::Error => Cell::new("error").fg(Color::Red),
                        IssueSeverity::Warning => Cell::new("warning").fg(Color::Yellow),
                    };
                    table.add_row(vec![
                        Cell::new(display_path(root, &issue.path)),
                        severity,
                        Cell::new(issue.problem.describe()),
                    ]);
                }
                println!("{table}");
            }
            println!(
                "{} files checked, {} valid, {} invalid ({} error(s), {} warning(s))",
                report.files_checked,
                report.valid_files,
                report.invalid_files(),
                report.errors(),
                report.warnings()
            );
            Ok(())
        }
    }
}
