//! Table listing

use super::output;
use anyhow::Result;
use boothline_store::LeadStore;

pub fn run(store: &LeadStore, json: bool) -> Result<()> {
    let rows = store.read_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No leads captured yet.");
        return Ok(());
    }

    let table_rows = rows
        .iter()
        .map(|l| {
            vec![
                l.row_id.to_string(),
                l.full_name.clone(),
                l.email.clone(),
                l.phone.clone(),
                l.company.clone(),
                l.note.clone(),
                l.captured_at.format("%Y-%m-%d %H:%M").to_string(),
                l.source.to_string(),
            ]
        })
        .collect();

    output::print_table(
        &["id", "name", "email", "phone", "company", "note", "captured", "source"],
        table_rows,
    );
    println!("{} lead(s)", rows.len());
    Ok(())
}
