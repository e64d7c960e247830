//! Table export for spreadsheet consumers

use anyhow::Result;
use boothline_store::LeadStore;
use std::path::Path;

pub fn run(store: &LeadStore, dest: &Path) -> Result<()> {
    let rows = store.export_to(dest)?;
    println!("Exported {} lead(s) to {}", rows, dest.display());
    Ok(())
}
