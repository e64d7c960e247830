//! Manual lead capture

use anyhow::Result;
use boothline_store::{LeadSource, LeadStore, NewLead};

/// Arguments for the add command
#[derive(Debug)]
pub struct AddArgs {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub note: String,
    pub consent: bool,
    pub source: LeadSource,
}

pub fn run(store: &LeadStore, args: AddArgs) -> Result<()> {
    let lead = store.append(NewLead {
        full_name: args.name,
        email: args.email,
        phone: args.phone,
        company: args.company,
        note: args.note,
        consent: args.consent,
        source: args.source,
    })?;

    println!("Saved lead #{} ({})", lead.row_id, lead.full_name);
    Ok(())
}
