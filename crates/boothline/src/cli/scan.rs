//! Lead capture from decoded QR payload text.
//!
//! The scanner hardware (or a phone) decodes the QR; this command only
//! consumes the decoded text.

use anyhow::{anyhow, Context, Result};
use boothline_capture::parse_payload;
use boothline_store::LeadStore;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Arguments for the scan command
#[derive(Debug)]
pub struct ScanArgs {
    /// Payload file, or `-` for stdin
    pub payload: PathBuf,
    pub consent: bool,
    pub dry_run: bool,
}

pub fn run(store: &LeadStore, args: ScanArgs) -> Result<()> {
    let text = read_payload(&args.payload)?;
    let card = parse_payload(&text)
        .ok_or_else(|| anyhow!("no contact recognized in payload (expected vCard or MeCard)"))?;

    println!("Recognized fields:");
    println!("  name:    {}", card.full_name);
    println!("  email:   {}", card.email);
    println!("  phone:   {}", card.phone);
    println!("  company: {}", card.company);
    println!("  note:    {}", card.note);

    if args.dry_run {
        return Ok(());
    }

    let lead = store.append(card.into_new_lead(args.consent))?;
    println!("Saved lead #{} ({})", lead.row_id, lead.full_name);
    Ok(())
}

fn read_payload(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload: {}", path.display()))
    }
}
