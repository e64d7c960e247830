//! Two-phase table editing.
//!
//! The operator exports a snapshot, edits it in a spreadsheet, and this
//! command submits the whole edited table as one atomic `replace_all`.
//! The store never observes partial, in-progress edits.

use anyhow::{Context, Result};
use boothline_store::{Lead, LeadPatch, LeadStore};
use std::path::Path;

pub fn run(store: &LeadStore, edited: &Path) -> Result<()> {
    let patches = read_edited(edited)?;
    let rows = store.replace_all(patches)?;
    println!("Applied edited table: {} row(s)", rows.len());
    Ok(())
}

/// Read a human-edited copy of the table. Rows deserialize against the
/// full schema; edits to `captured_at`/`source` are dropped here since
/// those fields are not editable.
fn read_edited(path: &Path) -> Result<Vec<LeadPatch>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open edited table: {}", path.display()))?;

    let mut patches = Vec::new();
    for record in reader.deserialize::<Lead>() {
        let lead =
            record.with_context(|| format!("Malformed row in {}", path.display()))?;
        patches.push(LeadPatch::from(lead));
    }
    Ok(patches)
}
