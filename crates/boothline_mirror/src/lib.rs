//! Boothline Mirror - Spreadsheet Replication
//!
//! Pushes appended rows to a remote spreadsheet over its values-append
//! endpoint. Strictly best-effort: the local table is authoritative and
//! the mirror may lag or miss rows. Every request carries a hard timeout
//! so a dead network cannot stall the kiosk.

use boothline_store::{Lead, LeadMirror, MirrorError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Mirror wiring, usually deserialized from the `[mirror]` config table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsMirrorConfig {
    /// Spreadsheet to append into
    pub sheet_id: String,

    /// Base URL of the spreadsheet service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token for the service account, if the endpoint requires one
    #[serde(default)]
    pub token: Option<String>,

    /// Hard per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Spreadsheet-backed [`LeadMirror`].
pub struct SheetsMirror {
    config: SheetsMirrorConfig,
    client: reqwest::blocking::Client,
}

impl SheetsMirror {
    pub fn new(config: SheetsMirrorConfig) -> Result<Self, MirrorError> {
        if config.sheet_id.trim().is_empty() {
            return Err(MirrorError::Disabled);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| MirrorError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn append_url(&self) -> String {
        format!(
            "{}/{}/values/Leads:append?valueInputOption=RAW",
            self.config.endpoint.trim_end_matches('/'),
            self.config.sheet_id
        )
    }
}

impl LeadMirror for SheetsMirror {
    fn append_row(&self, lead: &Lead) -> Result<(), MirrorError> {
        let body = json!({ "values": [row_values(lead)] });

        let mut request = self.client.post(self.append_url()).json(&body);
        if let Some(token) = self.config.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| MirrorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MirrorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Mirrored lead {} to sheet {}", lead.row_id, self.config.sheet_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "sheets"
    }
}

/// One spreadsheet row in the table's column order.
fn row_values(lead: &Lead) -> Vec<String> {
    vec![
        lead.row_id.to_string(),
        lead.full_name.clone(),
        lead.email.clone(),
        lead.phone.clone(),
        lead.company.clone(),
        lead.note.clone(),
        lead.consent.to_string(),
        lead.captured_at.to_rfc3339(),
        lead.source.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use boothline_store::{LeadSource, LEAD_COLUMNS};
    use chrono::Utc;

    fn sample_lead() -> Lead {
        Lead {
            row_id: 3,
            full_name: "Ada Lovelace".to_string(),
            email: "ada@analytical.example".to_string(),
            phone: String::new(),
            company: "Analytical Engines".to_string(),
            note: String::new(),
            consent: true,
            captured_at: Utc::now(),
            source: LeadSource::Qr,
        }
    }

    #[test]
    fn test_row_values_follow_column_order() {
        let values = row_values(&sample_lead());
        assert_eq!(values.len(), LEAD_COLUMNS.len());
        assert_eq!(values[0], "3");
        assert_eq!(values[1], "Ada Lovelace");
        assert_eq!(values[6], "true");
        assert_eq!(values[8], "qr");
    }

    #[test]
    fn test_append_url_shape() {
        let mirror = SheetsMirror::new(SheetsMirrorConfig {
            sheet_id: "abc123".to_string(),
            endpoint: "https://sheets.example/v4/spreadsheets/".to_string(),
            token: None,
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            mirror.append_url(),
            "https://sheets.example/v4/spreadsheets/abc123/values/Leads:append?valueInputOption=RAW"
        );
    }

    #[test]
    fn test_blank_sheet_id_is_disabled() {
        let result = SheetsMirror::new(SheetsMirrorConfig {
            sheet_id: "  ".to_string(),
            endpoint: default_endpoint(),
            token: None,
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(MirrorError::Disabled)));
    }

    #[test]
    fn test_config_defaults() {
        let config: SheetsMirrorConfig =
            toml::from_str("sheet_id = \"abc\"").expect("minimal config");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.token.is_none());
    }
}
