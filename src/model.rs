use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A full exercise payload as stored on disk.
///
/// The shape varies per exercise type and editors are free to carry extra
/// fields; the validator is the gatekeeper, storage treats the document as
/// opaque. serde_json's default `Map` is backed by a `BTreeMap`, so every
/// serialization comes out with sorted keys.
pub type Document = Map<String, Value>;

/// The five supported exercise kinds. The kind selects the validation
/// rule set; storage is common across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Tf,
    Mcq,
    Dnd,
    Fitb,
    Dictation,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 5] = [
        ExerciseType::Tf,
        ExerciseType::Mcq,
        ExerciseType::Dnd,
        ExerciseType::Fitb,
        ExerciseType::Dictation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Tf => "tf",
            ExerciseType::Mcq => "mcq",
            ExerciseType::Dnd => "dnd",
            ExerciseType::Fitb => "fitb",
            ExerciseType::Dictation => "dictation",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tf" => Ok(ExerciseType::Tf),
            "mcq" => Ok(ExerciseType::Mcq),
            "dnd" => Ok(ExerciseType::Dnd),
            "fitb" => Ok(ExerciseType::Fitb),
            "dictation" => Ok(ExerciseType::Dictation),
            other => Err(format!("unknown exercise type: {}", other)),
        }
    }
}

/// Lifecycle status of an exercise, as recorded in the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
    Archived,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Archived => "archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            "archived" => Ok(Status::Archived),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Contents of the per-identity `current.json` pointer file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPointer {
    pub version: String,
}

/// One denormalized entry in the global `index.json`.
///
/// We store titles and classification in the index so listing never has
/// to read version files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub title_es: Option<String>,
    pub title_en: Option<String>,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    pub level: Option<String>,
    #[serde(default)]
    pub taxonomy_paths: Vec<String>,
    // Legacy field kept for compatibility with older payloads
    #[serde(default)]
    pub tags: Vec<String>,
    pub version: String,
    pub status: Status,
    pub updated_at: String,
    pub checksum: String,
}

impl IndexRecord {
    /// Build the summary record for a persisted document. `doc` must
    /// already carry its stamped checksum.
    pub(crate) fn from_document(kind: ExerciseType, doc: &Document, version: &str) -> Self {
        IndexRecord {
            title_es: str_field(doc, "title_es"),
            title_en: str_field(doc, "title_en"),
            kind,
            level: str_field(doc, "level"),
            taxonomy_paths: string_list(doc, "taxonomy_paths"),
            tags: string_list(doc, "tags"),
            version: version.to_string(),
            status: doc
                .get("status")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            updated_at: now_iso(),
            checksum: doc
                .get("checksum")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Exact-match filters over the queryable index fields. Unset fields
/// match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub kind: Option<ExerciseType>,
    pub status: Option<Status>,
    pub level: Option<String>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.status.is_none() && self.level.is_none()
    }

    pub fn matches(&self, record: &IndexRecord) -> bool {
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(level) = &self.level {
            if record.level.as_deref() != Some(level.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Index key for an identity: `"type/slug"`.
pub fn index_key(kind: ExerciseType, slug: &str) -> String {
    format!("{}/{}", kind, slug)
}

/// UTC timestamp in the stored format: ISO-8601, seconds precision, `Z`.
pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn str_field(doc: &Document, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(doc: &Document, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exercise_type_roundtrip() {
        for kind in ExerciseType::ALL {
            assert_eq!(kind.as_str().parse::<ExerciseType>(), Ok(kind));
        }
        assert!("quiz".parse::<ExerciseType>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Published).unwrap(), "\"published\"");
        assert_eq!(Status::default(), Status::Draft);
    }

    #[test]
    fn index_key_format() {
        assert_eq!(index_key(ExerciseType::Tf, "ser-vs-estar"), "tf/ser-vs-estar");
    }

    #[test]
    fn record_from_document_picks_summary_fields() {
        let doc = json!({
            "type": "tf",
            "slug": "ser-vs-estar",
            "title_es": "Ser vs Estar",
            "level": "A2",
            "taxonomy_paths": ["grammar/verbs", 42],
            "status": "published",
            "checksum": "sha256:abc",
        });
        let doc = doc.as_object().unwrap().clone();
        let record = IndexRecord::from_document(ExerciseType::Tf, &doc, "002");

        assert_eq!(record.title_es.as_deref(), Some("Ser vs Estar"));
        assert_eq!(record.title_en, None);
        assert_eq!(record.level.as_deref(), Some("A2"));
        // Non-string taxonomy entries are dropped, not errors
        assert_eq!(record.taxonomy_paths, vec!["grammar/verbs"]);
        assert_eq!(record.version, "002");
        assert_eq!(record.status, Status::Published);
        assert_eq!(record.checksum, "sha256:abc");
        assert!(!record.updated_at.is_empty());
    }

    #[test]
    fn record_status_defaults_to_draft() {
        let doc = json!({"type": "mcq", "slug": "x"}).as_object().unwrap().clone();
        let record = IndexRecord::from_document(ExerciseType::Mcq, &doc, "001");
        assert_eq!(record.status, Status::Draft);
    }

    #[test]
    fn filter_matches_subsets() {
        let doc = json!({"type": "tf", "slug": "x", "level": "B1", "status": "draft"})
            .as_object()
            .unwrap()
            .clone();
        let record = IndexRecord::from_document(ExerciseType::Tf, &doc, "001");

        assert!(ListFilter::default().matches(&record));
        assert!(ListFilter { kind: Some(ExerciseType::Tf), ..Default::default() }.matches(&record));
        assert!(!ListFilter { kind: Some(ExerciseType::Mcq), ..Default::default() }.matches(&record));
        assert!(ListFilter {
            status: Some(Status::Draft),
            level: Some("B1".into()),
            ..Default::default()
        }
        .matches(&record));
        assert!(!ListFilter { level: Some("C2".into()), ..Default::default() }.matches(&record));
    }

    #[test]
    fn now_iso_has_z_suffix() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        assert!(!ts.contains('.'));
    }
}
