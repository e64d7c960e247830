//! Record types for the lead table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column order of the durable table. The header and every row follow it.
pub const LEAD_COLUMNS: [&str; 9] = [
    "row_id",
    "full_name",
    "email",
    "phone",
    "company",
    "note",
    "consent",
    "captured_at",
    "source",
];

/// How a lead was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    /// Typed into the kiosk form by the operator or visitor
    #[default]
    Manual,
    /// Extracted from a decoded QR payload
    Qr,
    /// Provisioned over NFC
    Nfc,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Manual => "manual",
            LeadSource::Qr => "qr",
            LeadSource::Nfc => "nfc",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(LeadSource::Manual),
            "qr" => Ok(LeadSource::Qr),
            "nfc" => Ok(LeadSource::Nfc),
            other => Err(format!("unknown lead source: {other}")),
        }
    }
}

/// One captured contact record. Field order matches [`LEAD_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Stable identity, assigned at append, never reused within a session
    pub row_id: u64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub note: String,
    pub consent: bool,
    /// Stamped at append, not editable afterwards
    pub captured_at: DateTime<Utc>,
    /// Not editable afterwards
    pub source: LeadSource,
}

/// A candidate record from a Capture Source: a [`Lead`] before
/// `row_id`/`captured_at` exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub note: String,
    pub consent: bool,
    pub source: LeadSource,
}

/// One row of a human-edited table, keyed by the `row_id` it replaces.
/// `captured_at` and `source` are deliberately absent: they are not
/// editable and are carried over from the stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    pub row_id: u64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub note: String,
    pub consent: bool,
}

impl From<Lead> for LeadPatch {
    fn from(lead: Lead) -> Self {
        Self {
            row_id: lead.row_id,
            full_name: lead.full_name,
            email: lead.email,
            phone: lead.phone,
            company: lead.company,
            note: lead.note,
            consent: lead.consent,
        }
    }
}
