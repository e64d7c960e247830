//! CLI command implementations

pub mod add;
pub mod delete;
pub mod edit;
pub mod export;
pub mod list;
pub mod output;
pub mod scan;

use crate::config::BoothlineConfig;
use anyhow::{Context, Result};
use boothline_mirror::SheetsMirror;
use boothline_store::LeadStore;
use tracing::warn;

/// Open the lead store described by the config, attaching the mirror when
/// one is configured. A misconfigured mirror degrades to local-only
/// operation instead of blocking capture.
pub fn open_store(config: &BoothlineConfig) -> Result<LeadStore> {
    let store = LeadStore::open(config.lead_path.clone())
        .with_context(|| format!("Failed to open lead table: {}", config.lead_path.display()))?;

    let Some(mirror_config) = config.mirror.clone() else {
        return Ok(store);
    };

    match SheetsMirror::new(mirror_config) {
        Ok(mirror) => Ok(store.with_mirror(Box::new(mirror))),
        Err(e) => {
            warn!("Mirror disabled, capturing locally only: {}", e);
            Ok(store)
        }
    }
}
