//! Boothline Store - Durable Lead Table
//!
//! Sole owner of the lead table collected at a kiosk. All readers and
//! writers of lead data go through [`LeadStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   Capture    │     │  LeadStore  │     │    Mirror    │
//! │ (form / QR)  │────▶│ (leads.csv) │────▶│ (spreadsheet)│
//! └──────────────┘     └─────────────┘     └──────────────┘
//!                            │
//!                            ▼
//!                      ┌─────────────┐
//!                      │ Presentation │
//!                      │ (list/edit)  │
//!                      └─────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Lead**: one captured contact record with a stable `row_id`
//! - **NewLead**: a candidate record before `row_id`/`captured_at` exist
//! - **Atomic rewrite**: every mutation commits via temp file + rename
//! - **Mirror seam**: appended rows are offered to a best-effort replica

pub mod error;
pub mod mirror;
pub mod store;
pub mod types;

mod lock;

pub use error::{Result, StoreError};
pub use mirror::{LeadMirror, MirrorError};
pub use store::LeadStore;
pub use types::{Lead, LeadPatch, LeadSource, NewLead, LEAD_COLUMNS};
