//! Durable lead table.
//!
//! Every mutation follows the same commit path: read the current table,
//! compute the next table in memory, write it to a dot-prefixed temp file
//! in the same directory, then rename it onto the canonical path. A reader
//! never observes a half-written table; a crash before the rename leaves
//! the previous table intact. Stray temp files from an interrupted commit
//! are invisible to readers and overwritten by the next commit.

use crate::error::{Result, StoreError};
use crate::lock;
use crate::mirror::LeadMirror;
use crate::types::{Lead, LeadPatch, NewLead, LEAD_COLUMNS};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email shape regex"));

/// Sole owner of the durable lead table.
///
/// The backing file path is injected at construction; there is no
/// process-wide default. Mutating operations serialize through an
/// exclusive advisory file lock held across the read-modify-rename
/// sequence, so a second process pointed at the same table cannot lose an
/// update.
pub struct LeadStore {
    path: PathBuf,
    mirror: Option<Box<dyn LeadMirror>>,
    /// Session high-water mark for row id assignment. Deletes never lower
    /// it, so ids are not reused within a session.
    next_row_id: Mutex<u64>,
}

impl LeadStore {
    /// Open a store over the given table path, creating the parent
    /// directory if needed. The file itself is created on first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            mirror: None,
            next_row_id: Mutex::new(1),
        })
    }

    /// Attach a best-effort mirror that receives appended rows.
    pub fn with_mirror(mut self, mirror: Box<dyn LeadMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Path of the backing table file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate a candidate, assign the next row id, stamp `captured_at`,
    /// and durably append. Returns the finalized lead.
    ///
    /// Nothing is written when validation fails. The mirror is offered the
    /// row only after the local write has committed.
    pub fn append(&self, candidate: NewLead) -> Result<Lead> {
        validate_fields(&candidate.full_name, &candidate.email, candidate.consent)?;

        let _guard = self.lock_table()?;
        let mut rows = read_table(&self.path)?;
        let lead = Lead {
            row_id: self.next_id(&rows),
            full_name: candidate.full_name.trim().to_string(),
            email: candidate.email.trim().to_string(),
            phone: candidate.phone.trim().to_string(),
            company: candidate.company.trim().to_string(),
            note: candidate.note.trim().to_string(),
            consent: candidate.consent,
            captured_at: Utc::now(),
            source: candidate.source,
        };
        rows.push(lead.clone());
        self.commit(&rows)?;
        debug!("Appended lead {} ({})", lead.row_id, lead.full_name);

        self.offer_to_mirror(&lead);
        Ok(lead)
    }

    /// Full ordered table (insertion order). Never mutates storage. A
    /// missing file reads as an empty table; a present-but-unparseable
    /// file is reported, not repaired.
    pub fn read_all(&self) -> Result<Vec<Lead>> {
        read_table(&self.path)
    }

    /// Atomically overwrite the table with a human-edited copy.
    ///
    /// Every patch must target a distinct existing row id; required fields
    /// and consent are re-validated for every surviving row. Rows absent
    /// from `edited` are dropped. `captured_at` and `source` are carried
    /// over from the stored rows. On any failure the durable table is
    /// untouched.
    pub fn replace_all(&self, edited: Vec<LeadPatch>) -> Result<Vec<Lead>> {
        let _guard = self.lock_table()?;
        let current = read_table(&self.path)?;
        let by_id: HashMap<u64, &Lead> = current.iter().map(|l| (l.row_id, l)).collect();

        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(edited.len());
        for patch in &edited {
            let stored = by_id
                .get(&patch.row_id)
                .ok_or(StoreError::NotFound(patch.row_id))?;
            if !seen.insert(patch.row_id) {
                return Err(StoreError::DuplicateId(patch.row_id));
            }
            validate_fields(&patch.full_name, &patch.email, patch.consent)?;
            next.push(Lead {
                row_id: patch.row_id,
                full_name: patch.full_name.trim().to_string(),
                email: patch.email.trim().to_string(),
                phone: patch.phone.trim().to_string(),
                company: patch.company.trim().to_string(),
                note: patch.note.trim().to_string(),
                consent: patch.consent,
                captured_at: stored.captured_at,
                source: stored.source,
            });
        }

        self.commit(&next)?;
        debug!("Replaced table: {} -> {} rows", current.len(), next.len());
        Ok(next)
    }

    /// Remove exactly one row. All other rows and their ids are unchanged.
    pub fn delete(&self, row_id: u64) -> Result<()> {
        let _guard = self.lock_table()?;
        let rows = read_table(&self.path)?;
        let before = rows.len();
        let remaining: Vec<Lead> = rows.into_iter().filter(|l| l.row_id != row_id).collect();
        if remaining.len() == before {
            return Err(StoreError::NotFound(row_id));
        }
        self.commit(&remaining)?;
        debug!("Deleted lead {}", row_id);
        Ok(())
    }

    /// Re-serialize the current table to `dest` for spreadsheet consumers.
    /// Same fixed schema, same temp-and-rename commit. Returns the number
    /// of rows exported.
    pub fn export_to(&self, dest: &Path) -> Result<u64> {
        let rows = read_table(&self.path)?;
        write_table(dest, &rows)?;
        debug!("Exported {} leads to {}", rows.len(), dest.display());
        Ok(rows.len() as u64)
    }

    fn lock_table(&self) -> Result<lock::TableLockGuard> {
        lock::lock_exclusive(&self.path)
            .map_err(|e| StoreError::unavailable(format!("could not lock lead table: {e}")))
    }

    fn next_id(&self, rows: &[Lead]) -> u64 {
        let mut hwm = self
            .next_row_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let max_stored = rows.iter().map(|l| l.row_id).max().unwrap_or(0);
        let id = (*hwm).max(max_stored + 1);
        *hwm = id + 1;
        id
    }

    fn commit(&self, rows: &[Lead]) -> Result<()> {
        write_table(&self.path, rows)
    }

    fn offer_to_mirror(&self, lead: &Lead) {
        let Some(mirror) = self.mirror.as_ref() else {
            return;
        };
        match mirror.append_row(lead) {
            Ok(()) => debug!("Mirrored lead {} to {}", lead.row_id, mirror.name()),
            Err(e) => warn!(
                "Mirror {} failed for lead {} (local write already committed): {}",
                mirror.name(),
                lead.row_id,
                e
            ),
        }
    }
}

impl fmt::Debug for LeadStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadStore")
            .field("path", &self.path)
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

fn validate_fields(full_name: &str, email: &str, consent: bool) -> Result<()> {
    let mut fields = Vec::new();
    if full_name.trim().is_empty() {
        fields.push("full_name".to_string());
    }
    let email = email.trim();
    if !email.is_empty() && !EMAIL_SHAPE.is_match(email) {
        fields.push("email".to_string());
    }
    if !consent {
        fields.push("consent".to_string());
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Validation { fields })
    }
}

fn read_table(path: &Path) -> Result<Vec<Lead>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| StoreError::unavailable(format!("cannot open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| StoreError::unavailable(format!("corrupt header in {}: {}", path.display(), e)))?;
    if headers.iter().ne(LEAD_COLUMNS.iter().copied()) {
        return Err(StoreError::unavailable(format!(
            "unexpected header in {}: expected {:?}, found {:?}",
            path.display(),
            LEAD_COLUMNS,
            headers
        )));
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let lead: Lead = record.map_err(|e| {
            StoreError::unavailable(format!("corrupt row in {}: {}", path.display(), e))
        })?;
        rows.push(lead);
    }
    Ok(rows)
}

/// Write the full table to `path` via temp file + rename. The header is
/// written even for an empty table so the file always parses against the
/// fixed schema.
fn write_table(path: &Path, rows: &[Lead]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "leads.csv".to_string());
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&temp_path)?;
    writer.write_record(LEAD_COLUMNS)?;
    for lead in rows {
        writer.serialize(lead)?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::MirrorError;
    use crate::types::LeadSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn candidate(name: &str, consent: bool, source: LeadSource) -> NewLead {
        NewLead {
            full_name: name.to_string(),
            consent,
            source,
            ..NewLead::default()
        }
    }

    fn open_store(dir: &TempDir) -> LeadStore {
        LeadStore::open(dir.path().join("leads.csv")).unwrap()
    }

    #[test]
    fn test_append_grows_table_by_one() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let lead = store
            .append(NewLead {
                full_name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                consent: true,
                source: LeadSource::Qr,
                ..NewLead::default()
            })
            .unwrap();
        assert_eq!(lead.row_id, 1);

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], lead);

        let second = store.append(candidate("Bob", true, LeadSource::Manual)).unwrap();
        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        // New row is last in insertion order
        assert_eq!(rows[1].row_id, second.row_id);
    }

    #[test]
    fn test_append_without_consent_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.append(candidate("Alice", true, LeadSource::Qr)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let err = store
            .append(candidate("Bob", false, LeadSource::Manual))
            .unwrap_err();
        match err {
            StoreError::Validation { fields } => assert_eq!(fields, vec!["consent"]),
            other => panic!("expected validation error, got {other:?}"),
        }

        let after = fs::read(store.path()).unwrap();
        assert_eq!(before, after, "durable file must be byte-identical");
    }

    #[test]
    fn test_append_requires_full_name() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let err = store
            .append(candidate("   ", true, LeadSource::Manual))
            .unwrap_err();
        match err {
            StoreError::Validation { fields } => assert_eq!(fields, vec!["full_name"]),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_rejects_malformed_email() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let err = store
            .append(NewLead {
                full_name: "Alice".to_string(),
                email: "not-an-email".to_string(),
                consent: true,
                ..NewLead::default()
            })
            .unwrap_err();
        match err {
            StoreError::Validation { fields } => assert_eq!(fields, vec!["email"]),
            other => panic!("expected validation error, got {other:?}"),
        }
        // Empty email is fine
        store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
    }

    #[test]
    fn test_row_ids_never_reused_after_delete() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let alice = store
            .append(NewLead {
                full_name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                consent: true,
                source: LeadSource::Qr,
                ..NewLead::default()
            })
            .unwrap();
        assert_eq!(alice.row_id, 1);

        assert!(matches!(
            store.append(candidate("Bob", false, LeadSource::Manual)),
            Err(StoreError::Validation { .. })
        ));
        assert_eq!(store.read_all().unwrap().len(), 1);

        store.delete(1).unwrap();
        assert!(store.read_all().unwrap().is_empty());

        let carol = store
            .append(candidate("Carol", true, LeadSource::Manual))
            .unwrap();
        assert_eq!(carol.row_id, 2, "deleted id 1 must not be reused");
    }

    #[test]
    fn test_delete_removes_only_target() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
        let b = store.append(candidate("Bob", true, LeadSource::Qr)).unwrap();
        let c = store.append(candidate("Carol", true, LeadSource::Nfc)).unwrap();

        store.delete(b.row_id).unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|l| l.row_id != b.row_id));
        assert_eq!(rows[0], a);
        assert_eq!(rows[1], c);
    }

    #[test]
    fn test_delete_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
        assert!(matches!(store.delete(42), Err(StoreError::NotFound(42))));
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_all_edits_fields_preserves_capture_metadata() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let original = store
            .append(NewLead {
                full_name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                consent: true,
                source: LeadSource::Qr,
                ..NewLead::default()
            })
            .unwrap();

        let mut patch = LeadPatch::from(original.clone());
        patch.email = "alice@corp.example".to_string();
        store.replace_all(vec![patch]).unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_id, original.row_id);
        assert_eq!(rows[0].email, "alice@corp.example");
        assert_eq!(rows[0].captured_at, original.captured_at);
        assert_eq!(rows[0].source, LeadSource::Qr);
    }

    #[test]
    fn test_replace_all_unknown_id_is_rejected_whole() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();

        let mut good = LeadPatch::from(a.clone());
        good.note = "edited".to_string();
        let bogus = LeadPatch {
            row_id: 99,
            full_name: "Ghost".to_string(),
            email: String::new(),
            phone: String::new(),
            company: String::new(),
            note: String::new(),
            consent: true,
        };

        assert!(matches!(
            store.replace_all(vec![good, bogus]),
            Err(StoreError::NotFound(99))
        ));

        // No partial overwrite
        let rows = store.read_all().unwrap();
        assert_eq!(rows, vec![a]);
    }

    #[test]
    fn test_replace_all_duplicate_id_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();

        let patch = LeadPatch::from(a);
        assert!(matches!(
            store.replace_all(vec![patch.clone(), patch]),
            Err(StoreError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_replace_all_drops_missing_rows() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
        let _b = store.append(candidate("Bob", true, LeadSource::Manual)).unwrap();

        let kept = store.replace_all(vec![LeadPatch::from(a.clone())]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(store.read_all().unwrap(), vec![a]);
    }

    #[test]
    fn test_replace_all_revoked_consent_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();

        let mut patch = LeadPatch::from(a);
        patch.consent = false;
        assert!(matches!(
            store.replace_all(vec![patch]),
            Err(StoreError::Validation { .. })
        ));
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_stray_temp_file_is_invisible_to_readers() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();

        // Simulate a crash between temp write and rename: a half-written
        // temp file sits next to the committed table.
        let temp = dir.path().join(".leads.csv.tmp");
        fs::write(&temp, "row_id,full_name\n2,Trunc").unwrap();

        assert_eq!(store.read_all().unwrap(), vec![a.clone()]);

        // The next commit replaces the stray temp and succeeds.
        let b = store.append(candidate("Bob", true, LeadSource::Manual)).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_corrupt_file_is_reported_not_repaired() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();

        fs::write(store.path(), "id,name\n1,Alice\n").unwrap();
        let garbled = fs::read(store.path()).unwrap();

        assert!(matches!(
            store.read_all(),
            Err(StoreError::Unavailable(_))
        ));
        // Mutations fail the same way and leave the file alone
        assert!(matches!(
            store.append(candidate("Bob", true, LeadSource::Manual)),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(fs::read(store.path()).unwrap(), garbled);
    }

    #[test]
    fn test_empty_table_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
        store.delete(a.row_id).unwrap();

        // Header-only file still parses as the fixed schema
        assert!(store.path().exists());
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_table_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.csv");
        {
            let store = LeadStore::open(&path).unwrap();
            store.append(candidate("Alice", true, LeadSource::Qr)).unwrap();
            store.append(candidate("Bob", true, LeadSource::Manual)).unwrap();
        }

        let store = LeadStore::open(&path).unwrap();
        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].full_name, "Alice");

        // Ids continue past the stored maximum
        let c = store.append(candidate("Carol", true, LeadSource::Manual)).unwrap();
        assert_eq!(c.row_id, 3);
    }

    #[test]
    fn test_export_copies_table() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
        store.append(candidate("Bob", true, LeadSource::Qr)).unwrap();

        let dest = dir.path().join("export.csv");
        let exported = store.export_to(&dest).unwrap();
        assert_eq!(exported, 2);
        assert_eq!(fs::read(&dest).unwrap(), fs::read(store.path()).unwrap());
    }

    struct FailingMirror;

    impl LeadMirror for FailingMirror {
        fn append_row(&self, _lead: &Lead) -> std::result::Result<(), MirrorError> {
            Err(MirrorError::Transport("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct CountingMirror {
        rows: Arc<AtomicUsize>,
    }

    impl LeadMirror for CountingMirror {
        fn append_row(&self, _lead: &Lead) -> std::result::Result<(), MirrorError> {
            self.rows.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_mirror_failure_never_fails_append() {
        let dir = TempDir::new().unwrap();
        let store = LeadStore::open(dir.path().join("leads.csv"))
            .unwrap()
            .with_mirror(Box::new(FailingMirror));

        let lead = store.append(candidate("Alice", true, LeadSource::Qr)).unwrap();
        assert_eq!(lead.row_id, 1);
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_mirror_receives_appended_rows() {
        let rows = Arc::new(AtomicUsize::new(0));
        let dir = TempDir::new().unwrap();
        let store = LeadStore::open(dir.path().join("leads.csv"))
            .unwrap()
            .with_mirror(Box::new(CountingMirror { rows: rows.clone() }));

        store.append(candidate("Alice", true, LeadSource::Manual)).unwrap();
        store.append(candidate("Bob", true, LeadSource::Manual)).unwrap();
        assert_eq!(rows.load(Ordering::SeqCst), 2);

        // Deletes and edits do not propagate
        store.delete(1).unwrap();
        assert_eq!(rows.load(Ordering::SeqCst), 2);
    }
}
