//! Configuration for the Boothline kiosk
//!
//! The store itself needs only the table path; everything else here wires
//! collaborators (mirror credentials, kiosk display toggles).

use anyhow::{Context, Result};
use boothline_mirror::SheetsMirrorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration, stored as TOML at `$BOOTHLINE_HOME/boothline.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoothlineConfig {
    /// Lead table location
    #[serde(default = "default_lead_path")]
    pub lead_path: PathBuf,

    /// Show the business-card QR in the kiosk header
    #[serde(default = "default_show_qr")]
    pub show_qr_in_header: bool,

    /// When set, the header QR is generated for this URL instead of a
    /// pre-rendered image
    #[serde(default)]
    pub qr_target_url: Option<String>,

    /// Camera preference for the scanner page ("rear" or "front")
    #[serde(default = "default_camera_facing")]
    pub camera_facing: String,

    /// Spreadsheet mirror; absent means local-only operation
    #[serde(default)]
    pub mirror: Option<SheetsMirrorConfig>,
}

fn default_lead_path() -> PathBuf {
    boothline_home().join("leads.csv")
}

fn default_show_qr() -> bool {
    true
}

fn default_camera_facing() -> String {
    "rear".to_string()
}

impl Default for BoothlineConfig {
    fn default() -> Self {
        Self {
            lead_path: default_lead_path(),
            show_qr_in_header: default_show_qr(),
            qr_target_url: None,
            camera_facing: default_camera_facing(),
            mirror: None,
        }
    }
}

impl BoothlineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: BoothlineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit config path, or the default one when it exists,
    /// or fall back to defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Get the Boothline home directory: ~/.boothline
pub fn boothline_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("BOOTHLINE_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".boothline")
}

/// Default config file path: ~/.boothline/boothline.toml
pub fn default_config_path() -> PathBuf {
    boothline_home().join("boothline.toml")
}
