//! Index records and their metadata schema

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Raw metadata as stored in the vector index
pub type Metadata = serde_json::Map<String, Value>;

/// Key under which the cleaned post body is stored
pub const BODY_TEXT_KEY: &str = "body_text";
/// Older indexes stored the cleaned body under this key
pub const LEGACY_BODY_TEXT_KEY: &str = "selftext_clean";

const NULL_TOKENS: [&str; 2] = ["nan", "none"];

/// A post as stored in the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Return a copy whose metadata satisfies the storage contract
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.metadata = normalize_metadata(self.metadata);
        self
    }
}

/// Typed view over index metadata.
///
/// Missing strings read as `""`, missing numbers as zero, and keys outside the
/// schema are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentMetadata {
    pub subreddit: String,
    pub title: String,
    pub body_text: String,
    pub created_day: String,
    pub score: f64,
    pub text_length: i64,
    #[serde(flatten)]
    pub extra: Metadata,
}

impl DocumentMetadata {
    #[must_use]
    pub fn from_map(mut map: Metadata) -> Self {
        let mut body_text = take_string(&mut map, BODY_TEXT_KEY);
        let legacy_body = take_string(&mut map, LEGACY_BODY_TEXT_KEY);
        if body_text.is_empty() {
            body_text = legacy_body;
        }

        Self {
            subreddit: take_string(&mut map, "subreddit"),
            title: take_string(&mut map, "title"),
            body_text,
            created_day: take_string(&mut map, "created_day"),
            score: map.remove("score").as_ref().map_or(0.0, coerce_f64),
            text_length: map.remove("text_length").as_ref().map_or(0, coerce_i64),
            extra: map,
        }
    }
}

fn take_string(map: &mut Metadata, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn coerce_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().filter(|f| f.is_finite()).map_or(0, |f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn is_null_token(s: &str) -> bool {
    let trimmed = s.trim();
    NULL_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Normalize metadata before it is written to the index.
///
/// - `null` and the string tokens "nan"/"none" (any case) become `""`
/// - `score` is stored as a float and `text_length` as an integer
/// - the legacy `selftext_clean` key is moved to `body_text`
#[must_use]
pub fn normalize_metadata(metadata: Metadata) -> Metadata {
    let mut normalized = Metadata::new();

    for (key, value) in metadata {
        let key = if key == LEGACY_BODY_TEXT_KEY {
            BODY_TEXT_KEY.to_string()
        } else {
            key
        };

        let value = match key.as_str() {
            "score" => serde_json::Number::from_f64(coerce_f64(&value))
                .map_or_else(|| Value::from(0.0), Value::Number),
            "text_length" => Value::from(coerce_i64(&value)),
            _ => match value {
                Value::Null => Value::String(String::new()),
                Value::String(s) if is_null_token(&s) => Value::String(String::new()),
                other => other,
            },
        };

        // body_text wins over the legacy key when both are present
        if key == BODY_TEXT_KEY && normalized.contains_key(BODY_TEXT_KEY) {
            let existing_empty = normalized
                .get(BODY_TEXT_KEY)
                .and_then(Value::as_str)
                .map_or(true, str::is_empty);
            if !existing_empty {
                continue;
            }
        }
        normalized.insert(key, value);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_null_tokens_become_empty() {
        let normalized = normalize_metadata(map(json!({
            "subreddit": "LocalLLaMA",
            "title": "NaN",
            "created_day": " None ",
            "flair": null,
        })));

        assert_eq!(normalized["subreddit"], json!("LocalLLaMA"));
        assert_eq!(normalized["title"], json!(""));
        assert_eq!(normalized["created_day"], json!(""));
        assert_eq!(normalized["flair"], json!(""));
    }

    #[test]
    fn test_numeric_fields_are_coerced() {
        let normalized = normalize_metadata(map(json!({
            "score": "42",
            "text_length": 118.0,
        })));
        assert_eq!(normalized["score"], json!(42.0));
        assert_eq!(normalized["text_length"], json!(118));

        let garbage = normalize_metadata(map(json!({ "score": "nan", "text_length": "n/a" })));
        assert_eq!(garbage["score"], json!(0.0));
        assert_eq!(garbage["text_length"], json!(0));
    }

    #[test]
    fn test_legacy_body_key_is_renamed() {
        let normalized = normalize_metadata(map(json!({ "selftext_clean": "post body" })));
        assert_eq!(normalized[BODY_TEXT_KEY], json!("post body"));
        assert!(!normalized.contains_key(LEGACY_BODY_TEXT_KEY));
    }

    #[test]
    fn test_from_map_reads_schema_and_keeps_extra() {
        let metadata = DocumentMetadata::from_map(map(json!({
            "subreddit": "MachineLearning",
            "title": "Courses for GenAI",
            "selftext_clean": "Start with the fast.ai course",
            "created_day": "2024-03-02",
            "score": 17.0,
            "text_length": "29",
            "author": "someone",
        })));

        assert_eq!(metadata.subreddit, "MachineLearning");
        assert_eq!(metadata.body_text, "Start with the fast.ai course");
        assert!((metadata.score - 17.0).abs() < f64::EPSILON);
        assert_eq!(metadata.text_length, 29);
        assert_eq!(metadata.extra.get("author"), Some(&json!("someone")));
    }

    #[test]
    fn test_from_map_missing_fields_default() {
        let metadata = DocumentMetadata::from_map(Metadata::new());
        assert_eq!(metadata, DocumentMetadata::default());
    }

    #[test]
    fn test_document_deserializes_without_metadata() {
        let doc: Document = serde_json::from_str(r#"{"id":"7","embedding":[0.1,0.2]}"#).unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.embedding.len(), 2);
    }
}
