//! Document checksums.
//!
//! A checksum covers the canonical serialization of the full payload with
//! the `checksum` key itself removed. Canonical means sorted object keys,
//! which serde_json's default `BTreeMap`-backed `Map` gives for free, so
//! the digest is reproducible regardless of the field order a caller
//! supplied.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::model::Document;

pub const CHECKSUM_KEY: &str = "checksum";

const PREFIX: &str = "sha256:";

/// Canonical JSON form of a document: compact, sorted keys, no checksum.
pub fn canonical_json(doc: &Document) -> Result<String> {
    let mut doc = doc.clone();
    doc.remove(CHECKSUM_KEY);
    Ok(serde_json::to_string(&doc)?)
}

/// `"sha256:" + hex` digest of the canonical form.
pub fn compute(doc: &Document) -> Result<String> {
    let canonical = canonical_json(doc)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{}{}", PREFIX, hex::encode(digest)))
}

/// Recompute the digest and compare it against the stored `checksum`.
/// Documents without one pass (files written before checksums existed).
pub fn verify(doc: &Document) -> Result<bool> {
    match doc.get(CHECKSUM_KEY).and_then(Value::as_str) {
        Some(stored) => Ok(stored == compute(doc)?),
        None => Ok(true),
    }
}
