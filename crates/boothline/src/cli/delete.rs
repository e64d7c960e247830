//! Single-row deletion

use anyhow::Result;
use boothline_store::LeadStore;

pub fn run(store: &LeadStore, row_id: u64) -> Result<()> {
    store.delete(row_id)?;
    println!("Deleted lead #{row_id}");
    Ok(())
}
