use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ExerciseType;

/// Deterministic mapping from (type, slug, version) to storage locations.
///
/// Layout under the base directory:
///
/// ```text
/// <base>/index.json
/// <base>/<type>/<slug>/<NNN>.json
/// <base>/<type>/<slug>/current.json
/// <base>/<type>/<slug>/media/
/// ```
///
/// Pure path arithmetic apart from [`StorePaths::ensure_dir`]. Slug
/// legality is the validator's job, not done here.
#[derive(Debug, Clone)]
pub struct StorePaths {
    base: PathBuf,
}

impl StorePaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn index_path(&self) -> PathBuf {
        self.base.join("index.json")
    }

    pub fn type_dir(&self, kind: ExerciseType) -> PathBuf {
        self.base.join(kind.as_str())
    }

    pub fn slug_dir(&self, kind: ExerciseType, slug: &str) -> PathBuf {
        self.type_dir(kind).join(slug)
    }

    pub fn version_path(&self, kind: ExerciseType, slug: &str, version: &str) -> PathBuf {
        self.slug_dir(kind, slug).join(format!("{}.json", version))
    }

    pub fn current_path(&self, kind: ExerciseType, slug: &str) -> PathBuf {
        self.slug_dir(kind, slug).join("current.json")
    }

    pub fn media_dir(&self, kind: ExerciseType, slug: &str) -> PathBuf {
        self.slug_dir(kind, slug).join("media")
    }

    /// Create a directory (and parents) if missing. Idempotent.
    pub fn ensure_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}
