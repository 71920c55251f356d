//! Structural validation of exercise payloads.
//!
//! Validation rejects documents the player and editor cannot render; it
//! does not judge pedagogical content. Every violated rule is collected
//! (no short-circuiting) in a stable order — shared rules first, then the
//! type-specific rules item by item — so one pass reports every problem
//! and error lists are reproducible. The validator never mutates its
//! input and never fails: an empty result means valid.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{ExerciseType, Status};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern"));

const DND_MEDIA_KEYS: [&str; 3] = ["image_url", "audio_url", "video_url"];
const DICTATION_BOOL_OPTIONS: [&str; 6] = [
    "ignoreCase",
    "ignorePunctuation",
    "normalizeWhitespace",
    "ignoreAccents",
    "autoPlay",
    "allowRetry",
];

/// Validate an arbitrary JSON value as an exercise payload.
pub fn validate(payload: &Value) -> Vec<String> {
    match payload.as_object() {
        Some(doc) => validate_document(doc),
        None => vec!["Payload must be a JSON object.".to_string()],
    }
}

/// Validate a payload already known to be an object.
pub fn validate_document(doc: &Map<String, Value>) -> Vec<String> {
    let mut errs = Vec::new();

    let kind = doc
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<ExerciseType>().ok());
    if kind.is_none() {
        errs.push(format!(
            "Unsupported \"type\": {}",
            doc.get("type").unwrap_or(&Value::Null)
        ));
    }

    let slug_ok = doc
        .get("slug")
        .and_then(Value::as_str)
        .map(|s| SLUG_RE.is_match(s))
        .unwrap_or(false);
    if !slug_ok {
        errs.push("Field \"slug\" is required (lowercase-with-hyphens).".to_string());
    }

    let items = doc.get("items").and_then(Value::as_array);
    if items.map_or(true, |a| a.is_empty()) {
        errs.push("Field \"items\" must be a non-empty array.".to_string());
    }

    if !has_text(doc, "title_es") && !has_text(doc, "title_en") {
        errs.push("One of \"title_es\"/\"title_en\" is required.".to_string());
    }
    if !has_text(doc, "instructions_es") && !has_text(doc, "instructions_en") {
        errs.push("One of \"instructions_es\"/\"instructions_en\" is required.".to_string());
    }

    if let Some(status) = doc.get("status").and_then(Value::as_str) {
        if status.parse::<Status>().is_err() {
            errs.push(format!(
                "Field \"status\" must be one of draft/published/archived, got '{}'.",
                status
            ));
        }
    }

    // Type-specific rules run whenever items is an array at all, so an
    // invalid slug still yields the full per-item report.
    if let (Some(kind), Some(items)) = (kind, items) {
        match kind {
            ExerciseType::Tf => validate_tf(items, &mut errs),
            ExerciseType::Mcq => validate_mcq(items, &mut errs),
            ExerciseType::Dnd => validate_dnd(doc, items, &mut errs),
            ExerciseType::Dictation => validate_dictation(doc, items, &mut errs),
            // fitb carries free-form blanks; shared rules are enough
            ExerciseType::Fitb => {}
        }
    }

    errs
}

fn validate_tf(items: &[Value], errs: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let n = i + 1;
        let Some(it) = item.as_object() else {
            errs.push(format!("Item #{}: must be an object.", n));
            continue;
        };
        if !has_text(it, "statement_es") && !has_text(it, "statement_en") {
            errs.push(format!("Item #{}: statement_es/en required.", n));
        }
        if !is_bool_answer(it.get("answer")) {
            errs.push(format!("Item #{}: answer must be 'true' or 'false'.", n));
        }
        if !is_int(it.get("order")) {
            errs.push(format!("Item #{}: integer 'order' is required.", n));
        }
    }
}

fn validate_mcq(items: &[Value], errs: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let n = i + 1;
        let Some(it) = item.as_object() else {
            errs.push(format!("Item #{}: must be an object.", n));
            continue;
        };
        if !has_text(it, "question_es") && !has_text(it, "question_en") {
            errs.push(format!("Item #{}: question_es/en required.", n));
        }
        // First non-empty of the language-specific lists, then the generic one
        let options = ["options_es", "options_en", "options"]
            .iter()
            .find_map(|k| it.get(*k).filter(|v| truthy(v)));
        match options.and_then(Value::as_array) {
            None => errs.push(format!("Item #{}: options array required.", n)),
            Some(options) => {
                let any_correct = options
                    .iter()
                    .filter_map(Value::as_object)
                    .any(|o| o.get("correct").map(truthy).unwrap_or(false));
                if !any_correct {
                    errs.push(format!("Item #{}: at least one option must be correct.", n));
                }
            }
        }
        if !is_int(it.get("order")) {
            errs.push(format!("Item #{}: integer 'order' is required.", n));
        }
    }
}

fn validate_dnd(doc: &Map<String, Value>, items: &[Value], errs: &mut Vec<String>) {
    if items.len() != 1 {
        errs.push("For 'dnd', exactly one item is required (single slide).".to_string());
    } else if let Some(it) = items[0].as_object() {
        if !is_int(it.get("order")) {
            errs.push("Item #1: integer 'order' is required.".to_string());
        }

        let columns = it.get("columns").and_then(Value::as_array);
        let mut column_ids: Vec<&str> = Vec::new();
        match columns {
            Some(columns) if columns.len() >= 2 => {
                for (ci, column) in columns.iter().enumerate() {
                    let n = ci + 1;
                    let col = column.as_object();
                    let id = col
                        .and_then(|c| c.get("id"))
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty());
                    match id {
                        None => errs.push(format!("Item #1: column #{} must have string 'id'.", n)),
                        Some(id) => {
                            if column_ids.contains(&id) {
                                errs.push(format!("Item #1: duplicate column id '{}'.", id));
                            }
                            column_ids.push(id);
                        }
                    }
                    let labeled = col
                        .map(|c| has_text(c, "label_es") || has_text(c, "label_en"))
                        .unwrap_or(false);
                    if !labeled {
                        errs.push(format!("Item #1: column #{} needs label_es/en.", n));
                    }
                }
            }
            _ => errs.push("Item #1: at least two columns are required.".to_string()),
        }

        let tokens = it.get("tokens").and_then(Value::as_array);
        match tokens {
            Some(tokens) if !tokens.is_empty() => {
                for (ti, token) in tokens.iter().enumerate() {
                    let n = ti + 1;
                    let Some(tok) = token.as_object() else {
                        errs.push(format!("Item #1: token #{} must be an object.", n));
                        continue;
                    };
                    if !has_text(tok, "text_es") && !has_text(tok, "text_en") {
                        errs.push(format!("Item #1: token #{} needs text_es/en.", n));
                    }
                    let correct = tok
                        .get("correct")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty());
                    match correct {
                        None => errs.push(format!(
                            "Item #1: token #{} must have 'correct' column id.",
                            n
                        )),
                        // Only check membership when the columns parsed
                        Some(correct) if columns.is_some() && !column_ids.contains(&correct) => {
                            errs.push(format!(
                                "Item #1: token #{} 'correct' refers to unknown column '{}'.",
                                n, correct
                            ));
                        }
                        Some(_) => {}
                    }
                    // Media is defined once at the document level for dnd
                    if tok.get("media").map(truthy).unwrap_or(false) {
                        errs.push(format!(
                            "Item #1: token #{} may not define 'media' (use top-level media).",
                            n
                        ));
                    }
                }
            }
            _ => errs.push("Item #1: at least one token is required.".to_string()),
        }
    } else {
        errs.push("Item #1: must be an object.".to_string());
    }

    if let Some(media) = doc.get("media").filter(|v| !v.is_null()) {
        match media.as_object() {
            None => errs.push("Field 'media' must be an object if provided.".to_string()),
            Some(media) => {
                for key in media.keys() {
                    if !DND_MEDIA_KEYS.contains(&key.as_str()) {
                        errs.push(format!(
                            "media.{}: unsupported key (allowed: image_url, audio_url, video_url)",
                            key
                        ));
                    }
                }
                for key in DND_MEDIA_KEYS {
                    if let Some(value) = media.get(key) {
                        let ok = value.as_str().map(|s| !s.trim().is_empty()).unwrap_or(false);
                        if !ok {
                            errs.push(format!("media.{} must be a non-empty string if provided.", key));
                        }
                    }
                }
            }
        }
    }
}

fn validate_dictation(doc: &Map<String, Value>, items: &[Value], errs: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        let n = i + 1;
        let Some(it) = item.as_object() else {
            errs.push(format!("Item #{}: must be an object.", n));
            continue;
        };
        let audio_ok = it
            .get("audio_url")
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !audio_ok {
            errs.push(format!("Item #{}: audio_url is required.", n));
        }
        let transcript_ok = it
            .get("transcript")
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !transcript_ok {
            errs.push(format!("Item #{}: transcript is required.", n));
        }
        if let Some(variants) = it.get("variants").filter(|v| !v.is_null()) {
            let ok = variants
                .as_array()
                .map(|a| a.iter().all(Value::is_string))
                .unwrap_or(false);
            if !ok {
                errs.push(format!(
                    "Item #{}: variants must be an array of strings if provided.",
                    n
                ));
            }
        }
        if !is_int(it.get("order")) {
            errs.push(format!("Item #{}: integer 'order' is required.", n));
        }
    }

    if let Some(options) = doc.get("options").and_then(Value::as_object) {
        for key in DICTATION_BOOL_OPTIONS {
            if let Some(value) = options.get(key) {
                if !value.is_boolean() && !value.is_null() {
                    errs.push(format!("Option '{}' must be boolean.", key));
                }
            }
        }
        if let Some(value) = options.get("minCharsToEnableCheck") {
            if value.as_u64().is_none() {
                errs.push("Option 'minCharsToEnableCheck' must be a non-negative integer.".to_string());
            }
        }
        // attemptsMax: 0 means unlimited
        if let Some(value) = options.get("attemptsMax") {
            if value.as_u64().is_none() {
                errs.push("Option 'attemptsMax' must be an integer >= 0.".to_string());
            }
        }
    }
}

fn has_text(doc: &Map<String, Value>, key: &str) -> bool {
    doc.get(key)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}

fn is_int(value: Option<&Value>) -> bool {
    value.map_or(false, |v| v.is_i64() || v.is_u64())
}

fn is_bool_answer(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(_)) => true,
        Some(Value::String(s)) => {
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
        }
        _ => false,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tf_payload() -> Value {
        json!({
            "type": "tf",
            "slug": "ser-vs-estar",
            "title_es": "Ser o estar",
            "instructions_es": "Marca verdadero o falso.",
            "items": [
                {"statement_es": "Soy alto.", "answer": "true", "order": 1},
                {"statement_en": "She is tired.", "answer": "False", "order": 2},
            ],
        })
    }

    #[test]
    fn accepts_valid_tf_payload() {
        assert!(validate(&tf_payload()).is_empty());
    }

    #[test]
    fn rejects_non_object_payload() {
        assert_eq!(validate(&json!([1, 2])), vec!["Payload must be a JSON object."]);
        assert_eq!(validate(&json!("x")), vec!["Payload must be a JSON object."]);
    }

    #[test]
    fn collects_every_shared_violation() {
        let errs = validate(&json!({"type": "quiz", "slug": "Bad Slug", "items": []}));
        assert_eq!(errs.len(), 5);
        assert!(errs[0].contains("Unsupported \"type\""));
        assert!(errs[1].contains("\"slug\""));
        assert!(errs[2].contains("\"items\""));
        assert!(errs[3].contains("title_es"));
        assert!(errs[4].contains("instructions_es"));
    }

    #[test]
    fn slug_rules() {
        for bad in ["", "UPPER", "has space", "trailing-", "-leading", "double--hyphen", "año"] {
            let mut payload = tf_payload();
            payload["slug"] = json!(bad);
            assert!(
                validate(&payload).iter().any(|e| e.contains("\"slug\"")),
                "slug {:?} should be rejected",
                bad
            );
        }
        let mut payload = tf_payload();
        payload["slug"] = json!("a1-b2-c3");
        assert!(validate(&payload).is_empty());
    }

    #[test]
    fn rejects_unknown_status() {
        let mut payload = tf_payload();
        payload["status"] = json!("live");
        let errs = validate(&payload);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("\"status\""));

        payload["status"] = json!("published");
        assert!(validate(&payload).is_empty());
    }

    #[test]
    fn tf_item_rules_are_per_item() {
        let mut payload = tf_payload();
        payload["items"] = json!([
            {"answer": "maybe", "order": "first"},
            {"statement_es": "Bien.", "answer": true, "order": 2},
        ]);
        let errs = validate(&payload);
        assert_eq!(
            errs,
            vec![
                "Item #1: statement_es/en required.",
                "Item #1: answer must be 'true' or 'false'.",
                "Item #1: integer 'order' is required.",
            ]
        );
    }

    #[test]
    fn mcq_requires_a_correct_option() {
        let payload = json!({
            "type": "mcq",
            "slug": "articles",
            "title_en": "Articles",
            "instructions_en": "Pick one.",
            "items": [{
                "question_en": "Which?",
                "options": [{"text": "el", "correct": false}, {"text": "la"}],
                "order": 1,
            }],
        });
        assert_eq!(
            validate(&payload),
            vec!["Item #1: at least one option must be correct."]
        );
    }

    #[test]
    fn mcq_prefers_language_specific_options() {
        let payload = json!({
            "type": "mcq",
            "slug": "articles",
            "title_en": "Articles",
            "instructions_en": "Pick one.",
            "items": [{
                "question_en": "Which?",
                "options_es": [{"text": "el", "correct": true}],
                "options": [{"text": "stale"}],
                "order": 1,
            }],
        });
        assert!(validate(&payload).is_empty());
    }

    #[test]
    fn mcq_missing_options() {
        let payload = json!({
            "type": "mcq",
            "slug": "articles",
            "title_en": "Articles",
            "instructions_en": "Pick one.",
            "items": [{"question_en": "Which?", "options": [], "order": 1}],
        });
        assert_eq!(validate(&payload), vec!["Item #1: options array required."]);
    }

    fn dnd_payload() -> Value {
        json!({
            "type": "dnd",
            "slug": "gender-sort",
            "title_es": "Clasifica",
            "instructions_es": "Arrastra cada palabra.",
            "items": [{
                "order": 1,
                "columns": [
                    {"id": "m", "label_es": "Masculino"},
                    {"id": "f", "label_es": "Femenino"},
                ],
                "tokens": [
                    {"text_es": "gato", "correct": "m"},
                    {"text_es": "mesa", "correct": "f"},
                ],
            }],
        })
    }

    #[test]
    fn accepts_valid_dnd_payload() {
        assert!(validate(&dnd_payload()).is_empty());
    }

    #[test]
    fn dnd_requires_single_slide() {
        let mut payload = dnd_payload();
        let item = payload["items"][0].clone();
        payload["items"] = json!([item.clone(), item]);
        assert_eq!(
            validate(&payload),
            vec!["For 'dnd', exactly one item is required (single slide)."]
        );
    }

    #[test]
    fn dnd_duplicate_and_unknown_columns() {
        let mut payload = dnd_payload();
        payload["items"][0]["columns"][1]["id"] = json!("m");
        payload["items"][0]["tokens"][1]["correct"] = json!("f");
        let errs = validate(&payload);
        assert_eq!(
            errs,
            vec![
                "Item #1: duplicate column id 'm'.",
                "Item #1: token #2 'correct' refers to unknown column 'f'.",
            ]
        );
    }

    #[test]
    fn dnd_rejects_per_token_media() {
        let mut payload = dnd_payload();
        payload["items"][0]["tokens"][0]["media"] = json!({"image_url": "/x.png"});
        assert_eq!(
            validate(&payload),
            vec!["Item #1: token #1 may not define 'media' (use top-level media)."]
        );
    }

    #[test]
    fn dnd_media_key_rules() {
        let mut payload = dnd_payload();
        payload["media"] = json!({"gif_url": "/x.gif", "image_url": "  "});
        let errs = validate(&payload);
        assert_eq!(errs.len(), 2);
        assert!(errs[0].contains("media.gif_url: unsupported key"));
        assert!(errs[1].contains("media.image_url must be a non-empty string"));

        payload["media"] = json!({"image_url": "/img/board.png"});
        assert!(validate(&payload).is_empty());
    }

    fn dictation_payload() -> Value {
        json!({
            "type": "dictation",
            "slug": "greetings",
            "title_es": "Saludos",
            "instructions_es": "Escucha y escribe.",
            "items": [{
                "audio_url": "/media/dictation/greetings/audio/01.mp3",
                "transcript": "Buenos días.",
                "variants": ["Buenos dias."],
                "order": 1,
            }],
            "options": {"ignoreCase": true, "attemptsMax": 0},
        })
    }

    #[test]
    fn accepts_valid_dictation_payload() {
        assert!(validate(&dictation_payload()).is_empty());
    }

    #[test]
    fn dictation_requires_audio_and_transcript() {
        let mut payload = dictation_payload();
        payload["items"][0]["audio_url"] = json!("   ");
        payload["items"][0]["transcript"] = json!(null);
        let errs = validate(&payload);
        assert_eq!(
            errs,
            vec!["Item #1: audio_url is required.", "Item #1: transcript is required."]
        );
    }

    #[test]
    fn dictation_option_types() {
        let mut payload = dictation_payload();
        payload["options"] = json!({
            "ignoreCase": "yes",
            "minCharsToEnableCheck": -1,
            "attemptsMax": 2.5,
        });
        let errs = validate(&payload);
        assert_eq!(
            errs,
            vec![
                "Option 'ignoreCase' must be boolean.",
                "Option 'minCharsToEnableCheck' must be a non-negative integer.",
                "Option 'attemptsMax' must be an integer >= 0.",
            ]
        );
    }

    #[test]
    fn dictation_variants_must_be_strings() {
        let mut payload = dictation_payload();
        payload["items"][0]["variants"] = json!(["ok", 3]);
        assert_eq!(
            validate(&payload),
            vec!["Item #1: variants must be an array of strings if provided."]
        );
    }

    #[test]
    fn fitb_only_needs_shared_rules() {
        let payload = json!({
            "type": "fitb",
            "slug": "por-vs-para",
            "title_en": "Por vs Para",
            "instructions_en": "Fill in the blank.",
            "items": [{"text": "Gracias ___ todo.", "blanks": ["por"]}],
        });
        assert!(validate(&payload).is_empty());
    }
}
