//! Best-effort replication seam.
//!
//! After a local append commits, the store offers the finalized row to an
//! optional mirror. The local table is authoritative: mirror failures are
//! reported as warnings and never fail, block, or roll back the append.

use crate::types::Lead;
use thiserror::Error;

/// Errors from a mirror implementation. These never escape the store as
/// operation failures.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("mirror transport error: {0}")]
    Transport(String),

    #[error("mirror rejected row: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("mirror is not configured")]
    Disabled,
}

/// A replica that receives appended rows.
pub trait LeadMirror: Send + Sync {
    /// Replicate one appended row. Must be time-bounded; the store calls
    /// this after the local write has already committed.
    fn append_row(&self, lead: &Lead) -> Result<(), MirrorError>;

    /// Short name for log messages.
    fn name(&self) -> &str {
        "mirror"
    }
}
