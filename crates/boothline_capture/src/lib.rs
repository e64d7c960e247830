//! Boothline Capture - Contact Extraction
//!
//! Turns decoded QR payload text into a candidate lead. How the payload
//! was obtained (camera, photo, image import) is the scanner's business;
//! this crate consumes text only.
//!
//! Recognized shapes:
//! - vCard 3.0 (`BEGIN:VCARD` ... `END:VCARD`), including folded lines
//! - MeCard (`MECARD:N:Last,First;TEL:...;;`)
//!
//! Anything else yields no card and the operator falls back to manual
//! entry. Consent is never inferred from a payload.

use boothline_store::{LeadSource, NewLead};
use tracing::debug;

/// Contact fields recognized in a payload. All fields are optional in the
/// wire formats, so any of these may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactCard {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    /// Job title or role, when the payload carries one
    pub note: String,
}

impl ContactCard {
    /// True when nothing usable was recognized.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.company.is_empty()
            && self.note.is_empty()
    }

    /// Shape the card into a store candidate. Consent comes from an
    /// explicit operator gesture, never from the payload itself.
    pub fn into_new_lead(self, consent: bool) -> NewLead {
        NewLead {
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            note: self.note,
            consent,
            source: LeadSource::Qr,
        }
    }
}

/// Best-effort extraction of contact fields from decoded payload text.
/// Returns `None` when the payload is not a recognizable contact shape.
pub fn parse_payload(text: &str) -> Option<ContactCard> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let card = if trimmed.to_ascii_uppercase().contains("BEGIN:VCARD") {
        parse_vcard(trimmed)
    } else if trimmed.to_ascii_uppercase().starts_with("MECARD:") {
        parse_mecard(trimmed)
    } else {
        debug!("Payload is neither vCard nor MeCard ({} bytes)", trimmed.len());
        return None;
    };

    if card.is_empty() {
        None
    } else {
        Some(card)
    }
}

/// Undo RFC 2426 line folding: a CRLF (or LF) followed by a space or tab
/// continues the previous line.
fn unfold(text: &str) -> String {
    text.replace("\r\n ", "")
        .replace("\r\n\t", "")
        .replace("\n ", "")
        .replace("\n\t", "")
}

fn parse_vcard(text: &str) -> ContactCard {
    let mut card = ContactCard::default();
    let mut fn_line = String::new();

    for line in unfold(text).replace('\r', "").lines() {
        let line = line.trim();
        let upper = line.to_ascii_uppercase();

        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if upper.starts_with("N:") {
            // N:Last;First;Additional;Prefix;Suffix
            let mut parts = value.split(';');
            let last = parts.next().unwrap_or("").trim();
            let first = parts.next().unwrap_or("").trim();
            card.full_name = join_name(first, last);
        } else if upper.starts_with("FN:") {
            fn_line = value.to_string();
        } else if upper.starts_with("EMAIL") {
            card.email = value.to_string();
        } else if upper.starts_with("TEL") {
            card.phone = value.to_string();
        } else if upper.starts_with("ORG:") {
            card.company = value.to_string();
        } else if upper.starts_with("TITLE:") {
            card.note = value.to_string();
        }
    }

    // FN is the fallback when the structured N line is absent
    if card.full_name.is_empty() {
        card.full_name = fn_line;
    }
    card
}

fn parse_mecard(text: &str) -> ContactCard {
    let mut card = ContactCard::default();
    let body = &text[7..]; // strip "MECARD:"

    for field in body.split(';') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "N" => {
                // N:Last,First
                let mut parts = value.split(',');
                let last = parts.next().unwrap_or("").trim();
                let first = parts.next().unwrap_or("").trim();
                card.full_name = if first.is_empty() {
                    last.to_string()
                } else {
                    join_name(first, last)
                };
            }
            "TEL" => card.phone = value.to_string(),
            "EMAIL" => card.email = value.to_string(),
            "ORG" => card.company = value.to_string(),
            "TITLE" => card.note = value.to_string(),
            _ => {}
        }
    }
    card
}

fn join_name(first: &str, last: &str) -> String {
    match (first.is_empty(), last.is_empty()) {
        (true, true) => String::new(),
        (true, false) => last.to_string(),
        (false, true) => first.to_string(),
        (false, false) => format!("{first} {last}"),
    }
}
