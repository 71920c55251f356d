//! Immutable version snapshots and the per-identity current pointer.
//!
//! A version file is written once and never touched again; "editing" an
//! exercise always appends the next number. Numbers are derived by
//! scanning the identity's directory for `NNN.json` names, so they stay
//! strictly increasing without a separate counter.

use std::fs;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::atomic::{read_opt, write_atomic};
use crate::checksum;
use crate::error::{Result, StoreError};
use crate::model::{now_iso, CurrentPointer, Document, ExerciseType};
use crate::paths::StorePaths;

/// Version reference that resolves through the current pointer.
pub const CURRENT: &str = "current";

static VERSION_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3})\.json$").expect("version file pattern"));

/// Format a version number the way it appears on disk and in pointers.
pub fn pad(version: u32) -> String {
    format!("{:03}", version)
}

#[derive(Debug, Clone)]
pub struct VersionStore {
    paths: StorePaths,
}

impl VersionStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    /// Version numbers present on disk for an identity, sorted ascending.
    /// A missing directory is an empty history, not an error.
    pub fn scan_versions(&self, kind: ExerciseType, slug: &str) -> Result<Vec<u32>> {
        let dir = self.paths.slug_dir(kind, slug);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(caps) = VERSION_FILE_RE.captures(name) {
                if let Ok(n) = caps[1].parse::<u32>() {
                    versions.push(n);
                }
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// `"001"` for a fresh identity, otherwise highest-on-disk plus one.
    pub fn next_version(&self, kind: ExerciseType, slug: &str) -> Result<String> {
        let versions = self.scan_versions(kind, slug)?;
        Ok(pad(versions.last().map_or(1, |last| last + 1)))
    }

    /// Normalize a version reference to padded form. `"current"` resolves
    /// through the pointer file; `"2"` and `"002"` are equivalent. `None`
    /// when the pointer is missing or the reference does not parse.
    pub fn resolve(&self, kind: ExerciseType, slug: &str, version: &str) -> Result<Option<String>> {
        if version == CURRENT {
            return self.read_current(kind, slug);
        }
        Ok(version.parse::<u32>().ok().map(pad))
    }

    /// Read the current pointer. A missing, unparseable, or stale pointer
    /// file reads as `None`; `doctor` can rewrite it later.
    pub fn read_current(&self, kind: ExerciseType, slug: &str) -> Result<Option<String>> {
        let Some(raw) = read_opt(&self.paths.current_path(kind, slug))? else {
            return Ok(None);
        };
        let Ok(pointer) = serde_json::from_str::<CurrentPointer>(&raw) else {
            return Ok(None);
        };
        Ok(pointer.version.parse::<u32>().ok().map(pad))
    }

    /// Read one immutable snapshot. `version` must already be padded.
    pub fn read_version(
        &self,
        kind: ExerciseType,
        slug: &str,
        version: &str,
    ) -> Result<Option<Document>> {
        let Some(raw) = read_opt(&self.paths.version_path(kind, slug, version))? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Stamp bookkeeping fields, compute the checksum, and atomically
    /// commit the snapshot. `created_at`/`created_by` are only written
    /// when absent so clones and status flips keep their provenance.
    pub fn write_version(
        &self,
        kind: ExerciseType,
        slug: &str,
        version: &str,
        mut doc: Document,
        actor: &str,
    ) -> Result<Document> {
        let number: u32 = version
            .parse()
            .map_err(|_| StoreError::Store(format!("bad version number '{}'", version)))?;
        doc.insert("version".to_string(), Value::from(number));
        if !field_present(&doc, "created_at") {
            doc.insert("created_at".to_string(), Value::from(now_iso()));
        }
        if !field_present(&doc, "created_by") {
            doc.insert("created_by".to_string(), Value::from(actor));
        }

        let digest = checksum::compute(&doc)?;
        doc.insert(checksum::CHECKSUM_KEY.to_string(), Value::from(digest));

        let path = self.paths.version_path(kind, slug, version);
        write_atomic(&path, &serde_json::to_string_pretty(&doc)?)?;
        debug!(kind = %kind, slug, version, "wrote version snapshot");
        Ok(doc)
    }

    /// Atomically point `current.json` at the given padded version.
    pub fn set_current(&self, kind: ExerciseType, slug: &str, version: &str) -> Result<()> {
        let pointer = CurrentPointer { version: version.to_string() };
        write_atomic(
            &self.paths.current_path(kind, slug),
            &serde_json::to_string(&pointer)?,
        )
    }
}

fn field_present(doc: &Document, key: &str) -> bool {
    doc.get(key)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}
