//! Terminal rendering for tables, detail cards and notices.

use arrow::util::pretty::pretty_format_batches;
use inspectdesk_core::{DetailView, TableView};
use inspectdesk_session::{Level, Notice, Outcome};
use inspectdesk_store::link::Preview;
use inspectdesk_store::Sheet;

/// Print a list projection as a bordered table.
pub fn print_table(view: &TableView) -> anyhow::Result<()> {
    println!("=== {} ({} of {}) ===", view.kind, view.rows.len(), view.total);
    if view.rows.is_empty() {
        println!("  (no records)");
        println!();
        return Ok(());
    }

    let mut columns = vec!["id"];
    columns.extend(view.columns.iter().copied());
    // Inspections already carry a status column of their own.
    let with_status =
        !view.columns.contains(&"status") && view.rows.iter().any(|r| r.status.is_some());
    if with_status {
        columns.push("status");
    }
    let mut sheet = Sheet::new(columns);
    for row in &view.rows {
        let mut cells = vec![row.id.to_string()];
        cells.extend(row.cells.iter().cloned());
        if with_status {
            cells.push(row.status.map(|s| s.as_str()).unwrap_or_default().to_string());
        }
        sheet.push_row(cells);
    }
    println!("{}", pretty_format_batches(&[sheet.to_batch()?])?);
    println!();
    Ok(())
}

/// Print a detail projection as a vertical card grouped by section.
pub fn print_card(view: &DetailView) {
    println!("=== {} ===", view.title);
    println!();
    for section in &view.sections {
        if section.fields.iter().all(|(_, v)| v.is_empty()) {
            continue;
        }
        println!("{}", section.header);
        for (label, value) in &section.fields {
            if value.is_empty() {
                continue;
            }
            println!("  {:<26} {}", label, value);
        }
        println!();
    }
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let tag = match notice.level {
            Level::Info => "info",
            Level::Success => "ok",
            Level::Error => "error",
        };
        println!("[{tag}] {}", notice.message);
    }
}

pub fn print_outcome(outcome: &Outcome) -> anyhow::Result<()> {
    match outcome {
        Outcome::Table(view) => print_table(view)?,
        Outcome::Detail(view) => print_card(view),
        Outcome::Preview(preview)
        | Outcome::FormOpened {
            preview: Some(preview),
            ..
        } => print_preview(preview),
        Outcome::Exported(paths) => {
            for path in paths {
                println!("  wrote {}", path.display());
            }
        }
        _ => {}
    }
    Ok(())
}

fn print_preview(preview: &Preview) {
    if let Preview::Loaded {
        snapshot,
        has_penalty,
    } = preview
    {
        let r = &snapshot.record;
        println!("  {:<26} {}", "original", r.candidate_label());
        println!("  {:<26} {}", "sector", r.sector);
        println!("  {:<26} {}", "case_subject", r.case_subject);
        if !has_penalty {
            println!("  {:<26} {}", "note", "no penalty recorded");
        }
    }
}
