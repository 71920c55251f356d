//! # API Facade
//!
//! [`ExerciseStore`] is the single entry point for every operation on the
//! store, and `save` is the only path by which a document changes state.
//! The facade composes the components — validator, version store, index
//! manager — and returns structured outcome types. It never prints and
//! never assumes a terminal; the CLI (or an HTTP layer) sits on top.
//!
//! Validation failures and not-found are values, not errors:
//! `save`/`restore` return outcome enums and `load` returns an `Option`.
//! Only I/O failures and corruption travel as `Err`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::checksum;
use crate::error::{Result, StoreError};
use crate::index::{Index, IndexManager};
use crate::model::{index_key, Document, ExerciseType, IndexRecord, ListFilter};
use crate::paths::StorePaths;
use crate::validate;
use crate::version::{pad, VersionStore};

/// Outcome of a `save`: the persisted payload (version, timestamps and
/// checksum stamped) or the full list of validation errors. Nothing was
/// written in the `Rejected` case.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Document),
    Rejected(Vec<String>),
}

/// Outcome of a `restore`.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Restored(Document),
    TargetMissing,
    Rejected(Vec<String>),
}

/// Report from [`ExerciseStore::doctor`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DoctorReport {
    /// Current pointers rewritten to the highest version on disk.
    pub repaired_pointers: usize,
    /// Identities present in the rebuilt index.
    pub indexed_documents: usize,
    /// Index entries dropped because their files are gone.
    pub dropped_entries: usize,
}

/// A versioned document store for structured exercises on a plain
/// filesystem: immutable snapshots, current-pointer indirection, and a
/// derived global index.
pub struct ExerciseStore {
    paths: StorePaths,
    snapshots: VersionStore,
    index: IndexManager,
}

impl ExerciseStore {
    /// Open a store rooted at `base`. Directories are created lazily on
    /// first write; opening never touches the filesystem.
    pub fn open(base: impl Into<PathBuf>) -> Self {
        let paths = StorePaths::new(base);
        Self {
            snapshots: VersionStore::new(paths.clone()),
            index: IndexManager::new(paths.clone()),
            paths,
        }
    }

    /// The directory this store reads and writes under.
    pub fn base_dir(&self) -> &Path {
        self.paths.base()
    }

    /// Load one version of an exercise. `version` is `"current"` or a
    /// number (`"3"` and `"003"` are equivalent). `Ok(None)` when the
    /// identity or version does not exist. A stored checksum is
    /// re-verified on the way out.
    pub fn load(&self, kind: ExerciseType, slug: &str, version: &str) -> Result<Option<Document>> {
        let Some(resolved) = self.snapshots.resolve(kind, slug, version)? else {
            return Ok(None);
        };
        let Some(doc) = self.snapshots.read_version(kind, slug, &resolved)? else {
            return Ok(None);
        };
        if !checksum::verify(&doc)? {
            return Err(StoreError::ChecksumMismatch {
                key: index_key(kind, slug),
                version: resolved,
            });
        }
        Ok(Some(doc))
    }

    /// Filtered view of the global index.
    pub fn list(&self, filter: Option<&ListFilter>) -> Result<Index> {
        self.index.list(filter)
    }

    /// Version numbers on disk for an identity, sorted ascending.
    pub fn versions(&self, kind: ExerciseType, slug: &str) -> Result<Vec<String>> {
        Ok(self
            .snapshots
            .scan_versions(kind, slug)?
            .into_iter()
            .map(pad)
            .collect())
    }

    /// Validate and persist `payload` as the next immutable version,
    /// advance the current pointer, and upsert the index record.
    ///
    /// Two concurrent saves of the same identity can race the version
    /// number decision; callers needing multi-writer safety must add
    /// their own lock keyed by (type, slug).
    pub fn save(&self, payload: Document, actor: &str) -> Result<SaveOutcome> {
        let errors = validate::validate_document(&payload);
        if !errors.is_empty() {
            return Ok(SaveOutcome::Rejected(errors));
        }

        // Validation guarantees both fields parse.
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<ExerciseType>().ok())
            .ok_or_else(|| StoreError::Store("validated payload lost its 'type'".to_string()))?;
        let slug = payload
            .get("slug")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Store("validated payload lost its 'slug'".to_string()))?
            .to_string();

        let version = self.snapshots.next_version(kind, &slug)?;
        let doc = self.snapshots.write_version(kind, &slug, &version, payload, actor)?;
        self.snapshots.set_current(kind, &slug, &version)?;

        let record = IndexRecord::from_document(kind, &doc, &version);
        self.index.upsert(kind, &slug, record)?;

        info!(kind = %kind, slug = %slug, version = %version, actor, "saved exercise");
        Ok(SaveOutcome::Saved(doc))
    }

    /// Delete an exercise. Soft (default) archives the index record and
    /// keeps every file; hard removes the identity's whole directory and
    /// its index entry, irreversibly. `Ok(false)` when not indexed.
    pub fn delete(&self, kind: ExerciseType, slug: &str, hard: bool) -> Result<bool> {
        if !hard {
            let archived = self.index.archive(kind, slug)?;
            if archived {
                info!(kind = %kind, slug, "soft-deleted exercise");
            }
            return Ok(archived);
        }

        if !self.index.contains(kind, slug)? {
            return Ok(false);
        }
        match fs::remove_dir_all(self.paths.slug_dir(kind, slug)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.index.remove(kind, slug)?;
        info!(kind = %kind, slug, "hard-deleted exercise");
        Ok(true)
    }

    /// Restore an old version by appending it as a new one. History is
    /// never rewritten: the clone gets a fresh timestamp, the actor
    /// `"restore"`, and a recomputed checksum.
    pub fn restore(&self, kind: ExerciseType, slug: &str, version: &str) -> Result<RestoreOutcome> {
        let Some(mut doc) = self.load(kind, slug, version)? else {
            return Ok(RestoreOutcome::TargetMissing);
        };
        doc.remove("checksum");
        doc.remove("created_at");
        doc.remove("created_by");

        info!(kind = %kind, slug, version, "restoring exercise version");
        match self.save(doc, "restore")? {
            SaveOutcome::Saved(saved) => Ok(RestoreOutcome::Restored(saved)),
            SaveOutcome::Rejected(errors) => Ok(RestoreOutcome::Rejected(errors)),
        }
    }

    /// Ensure and return the per-exercise media directory. The engine
    /// never inspects media bytes; upload handling lives elsewhere.
    pub fn media_dir(&self, kind: ExerciseType, slug: &str) -> Result<PathBuf> {
        let dir = self.paths.media_dir(kind, slug);
        StorePaths::ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Repair pass. Rewrites any missing or stale current pointer to the
    /// highest version on disk, then rebuilds the index from current
    /// versions. Existing entries keep their `status` and `updated_at`,
    /// so an archived document stays archived; entries whose files are
    /// gone are dropped.
    pub fn doctor(&self) -> Result<DoctorReport> {
        let mut report = DoctorReport::default();
        let previous = self.index.snapshot()?;
        let mut rebuilt = Index::new();

        for kind in ExerciseType::ALL {
            let type_dir = self.paths.type_dir(kind);
            if !type_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&type_dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let Some(slug) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let versions = self.snapshots.scan_versions(kind, &slug)?;
                let Some(&highest) = versions.last() else {
                    continue;
                };

                // A pointer that lags behind the highest snapshot means the
                // pointer update never landed; re-aim it at the top.
                let current = match self.snapshots.read_current(kind, &slug)? {
                    Some(v) if v.parse::<u32>() == Ok(highest) => v,
                    _ => {
                        let padded = pad(highest);
                        self.snapshots.set_current(kind, &slug, &padded)?;
                        report.repaired_pointers += 1;
                        padded
                    }
                };

                let Some(doc) = self.snapshots.read_version(kind, &slug, &current)? else {
                    continue;
                };
                let key = index_key(kind, &slug);
                let mut record = IndexRecord::from_document(kind, &doc, &current);
                if let Some(prev) = previous.get(&key) {
                    record.status = prev.status;
                    record.updated_at = prev.updated_at.clone();
                }
                rebuilt.insert(key, record);
                report.indexed_documents += 1;
            }
        }

        report.dropped_entries = previous
            .keys()
            .filter(|key| !rebuilt.contains_key(*key))
            .count();
        self.index.replace(rebuilt)?;

        info!(
            repaired = report.repaired_pointers,
            indexed = report.indexed_documents,
            dropped = report.dropped_entries,
            "doctor pass complete"
        );
        Ok(report)
    }
}
