//! Format registry contents and operation reports as text or JSON.

use crate::avatar::{ReconcileReport, TopUpReport};
use crate::error::{ApiError, StorageError};
use crate::merge::{MergeOutcome, MergeReport};
use crate::store::{BackupRecord, Registry};
use crate::types::EntryKind;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn format_warning(message: &str) -> String {
    format!("{} {}", "warning:".yellow().bold(), message)
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e.to_string())))
}

/// Registry contents grouped by level, nouns first.
pub fn format_registry_text(registry: &Registry) -> String {
    let mut out = String::new();
    for kind in [EntryKind::Noun, EntryKind::Adjective] {
        let title = match kind {
            EntryKind::Noun => "Nouns",
            EntryKind::Adjective => "Adjectives",
        };
        out.push_str(&format!("{}\n\n", format_section_heading(title)));
        let grouped = registry.names_by_level(kind);
        if grouped.is_empty() {
            out.push_str("  (none)\n\n");
            continue;
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Level", "Count", "Names"]);
        for (level, names) in &grouped {
            table.add_row(vec![
                level.to_string(),
                names.len().to_string(),
                names.join(", "),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }
    out.push_str(&format!(
        "{} nouns, {} adjectives, {} avatars\n",
        registry.nouns.len(),
        registry.adjectives.len(),
        registry.avatar_count()
    ));
    out
}

pub fn format_registry_json(registry: &Registry) -> Result<String, ApiError> {
    let group = |kind| {
        registry
            .names_by_level(kind)
            .into_iter()
            .map(|(level, names)| (level.to_string(), json!(names)))
            .collect::<serde_json::Map<_, _>>()
    };
    to_pretty_json(&json!({
        "nouns": group(EntryKind::Noun),
        "adjectives": group(EntryKind::Adjective),
    }))
}

pub fn format_merge_report_text(report: &MergeReport) -> String {
    let mut out = String::new();
    for line in &report.lines {
        let text = match line.outcome {
            MergeOutcome::Added => format!("{} {} {}", "added".green(), report.kind, line.value),
            MergeOutcome::Updated { previous_level } => format!(
                "{} {} {}: level {} -> {}",
                "updated".cyan(),
                report.kind,
                line.value,
                previous_level,
                report.level
            ),
            MergeOutcome::SkippedExists { existing_level } => format_warning(&format!(
                "{} {} already exists at level {}, skipped (use --force to overwrite)",
                report.kind, line.value, existing_level
            )),
            MergeOutcome::Invalid => format_warning("empty value skipped"),
        };
        out.push_str(&text);
        out.push('\n');
    }
    out.push_str(&format!(
        "{} added, {} updated, {} skipped, {} invalid",
        report.added(),
        report.updated(),
        report.skipped(),
        report.invalid()
    ));
    out
}

pub fn format_reconcile_report_text(report: &ReconcileReport) -> String {
    if report.is_clean() {
        return "Avatar references are consistent.".to_string();
    }
    let mut out = String::new();
    if !report.removed.is_empty() {
        out.push_str(&format!(
            "{}\n\n",
            format_section_heading("Removed dangling references")
        ));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Noun", "Reference"]);
        for row in &report.removed {
            table.add_row(vec![row.noun.clone(), row.reference.clone()]);
        }
        out.push_str(&format!("{}\n\n", table));
    }
    if !report.orphans.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Orphan avatar files")));
        for orphan in &report.orphans {
            out.push_str(&format_warning(&format!(
                "{} is not referenced by any noun",
                orphan.path.display()
            )));
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "{} removed, {} orphans",
        report.removed.len(),
        report.orphans.len()
    ));
    out
}

pub fn format_top_up_report_text(report: &TopUpReport) -> String {
    let mut out = String::new();
    for name in &report.unknown {
        out.push_str(&format_warning(&format!("unknown creature {}, skipped", name)));
        out.push('\n');
    }
    let touched: Vec<_> = report.lines.iter().filter(|l| !l.generated.is_empty()).collect();
    if !touched.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Noun", "Generated", "References"]);
        for line in touched {
            table.add_row(vec![
                line.noun.clone(),
                line.generated.len().to_string(),
                line.generated.join("\n"),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out.push_str(&format!(
        "{} avatars generated for {} nouns",
        report.generated(),
        report.lines.iter().filter(|l| !l.generated.is_empty()).count()
    ));
    out
}

pub fn format_backups_text(records: &[BackupRecord]) -> String {
    if records.is_empty() {
        return "No backups.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Timestamp", "File"]);
    for record in records {
        table.add_row(vec![
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.path.display().to_string(),
        ]);
    }
    format!("{}\n{} backups", table, records.len())
}

pub fn format_backups_json(records: &[BackupRecord]) -> Result<String, ApiError> {
    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            json!({
                "path": r.path,
                "timestamp": r.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "sequence": r.sequence,
            })
        })
        .collect();
    to_pretty_json(&rows)
}
