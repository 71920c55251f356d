//! # exstore
//!
//! A versioned document store for structured language exercises
//! (true/false, multiple choice, drag-and-drop, fill-in-blank,
//! dictation), built from first principles on a plain filesystem:
//! immutable version snapshots, atomic commit, integrity checksums, a
//! derived listing index, and soft/hard deletion with restore.
//!
//! This is a **UI-agnostic storage library**. The bundled `exstore`
//! binary is a thin maintenance client; an HTTP admin layer would sit on
//! the same facade. From [`api`] inward, code takes plain arguments,
//! returns plain `Result` types, never prints, and never exits.
//!
//! ## Storage layout
//!
//! ```text
//! <base>/
//! ├── index.json                  # global index: "type/slug" -> summary
//! └── <type>/<slug>/
//!     ├── 001.json ... NNN.json   # immutable, checksummed snapshots
//!     ├── current.json            # {"version": "NNN"}
//!     └── media/                  # externally managed binary assets
//! ```
//!
//! Every file write goes through temp-file-then-rename, so a reader
//! never sees partial contents. Version files are write-once: saving
//! always appends the next number and moves the `current` pointer.
//!
//! ## Module overview
//!
//! - [`api`]: the [`ExerciseStore`] facade — entry point for everything
//! - [`validate`]: per-type structural validation, all errors collected
//! - [`version`]: immutable snapshots, numbering, current pointer
//! - [`index`]: the derived global index for listing and filtering
//! - [`paths`]: identity-to-location mapping
//! - [`checksum`]: canonical JSON and `sha256:` digests
//! - [`atomic`]: the write-to-temp-then-rename primitive
//! - [`model`]: core types ([`ExerciseType`], [`Status`], [`IndexRecord`])
//! - [`config`]: base-directory resolution for the CLI
//! - [`error`]: error types
//!
//! ## Concurrency model
//!
//! Single-process, synchronous, blocking I/O; one conceptual writer per
//! identity. Readers never block writers because snapshots are immutable
//! once renamed into place. The global index is guarded by an in-process
//! mutex; the version-number decision between two racing saves of the
//! *same* identity is not, and needs an external lock if that pattern
//! ever appears.

pub mod api;
pub mod atomic;
pub mod checksum;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod paths;
pub mod validate;
pub mod version;

pub use api::{DoctorReport, ExerciseStore, RestoreOutcome, SaveOutcome};
pub use error::{Result, StoreError};
pub use model::{Document, ExerciseType, IndexRecord, ListFilter, Status};
