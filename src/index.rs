//! The global listing index.
//!
//! `index.json` holds one denormalized record per identity so listing and
//! filtering never read version files. It is a derived cache: `doctor`
//! can rebuild it from version files at any time. The read-modify-write
//! cycle is guarded by a mutex so interleaved in-process updates to
//! different identities cannot drop each other's writes; cross-process
//! coordination is the caller's problem.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::atomic::{read_opt, write_atomic};
use crate::error::{Result, StoreError};
use crate::model::{index_key, now_iso, ExerciseType, IndexRecord, ListFilter, Status};
use crate::paths::StorePaths;

/// The full index, keyed `"type/slug"`.
pub type Index = BTreeMap<String, IndexRecord>;

pub struct IndexManager {
    paths: StorePaths,
    lock: Mutex<()>,
}

impl IndexManager {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths, lock: Mutex::new(()) }
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Store("index lock poisoned".to_string()))
    }

    fn read(&self) -> Result<Index> {
        match read_opt(&self.paths.index_path())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Index::new()),
        }
    }

    fn write(&self, index: &Index) -> Result<()> {
        // Through Value so record keys come out sorted, like every other
        // file in the store
        let value = serde_json::to_value(index)?;
        write_atomic(&self.paths.index_path(), &serde_json::to_string_pretty(&value)?)
    }

    /// Insert or replace the record for an identity.
    pub fn upsert(&self, kind: ExerciseType, slug: &str, record: IndexRecord) -> Result<()> {
        let _guard = self.guard()?;
        let mut index = self.read()?;
        index.insert(index_key(kind, slug), record);
        self.write(&index)
    }

    /// Soft delete: flip the record to `archived`, keeping all files.
    /// Returns `false` when the identity is not indexed.
    pub fn archive(&self, kind: ExerciseType, slug: &str) -> Result<bool> {
        let _guard = self.guard()?;
        let mut index = self.read()?;
        let Some(record) = index.get_mut(&index_key(kind, slug)) else {
            return Ok(false);
        };
        record.status = Status::Archived;
        record.updated_at = now_iso();
        self.write(&index)?;
        debug!(kind = %kind, slug, "archived index record");
        Ok(true)
    }

    /// Drop an identity's record entirely. Returns `false` when absent.
    pub fn remove(&self, kind: ExerciseType, slug: &str) -> Result<bool> {
        let _guard = self.guard()?;
        let mut index = self.read()?;
        if index.remove(&index_key(kind, slug)).is_none() {
            return Ok(false);
        }
        self.write(&index)?;
        Ok(true)
    }

    pub fn contains(&self, kind: ExerciseType, slug: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(&index_key(kind, slug)))
    }

    /// A filtered snapshot of the index. Never mutates stored state.
    pub fn list(&self, filter: Option<&ListFilter>) -> Result<Index> {
        let index = self.read()?;
        match filter {
            None => Ok(index),
            Some(filter) => Ok(index
                .into_iter()
                .filter(|(_, record)| filter.matches(record))
                .collect()),
        }
    }

    /// The whole index, unfiltered. Used by the repair pass.
    pub fn snapshot(&self) -> Result<Index> {
        self.read()
    }

    /// Replace the whole index, atomically. Used by the repair pass.
    pub fn replace(&self, index: Index) -> Result<()> {
        let _guard = self.guard()?;
        self.write(&index)
    }
}
