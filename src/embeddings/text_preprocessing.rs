//! Text preprocessing utilities for embedding generation
//!
//! Provides utilities for cleaning and normalizing query text before embedding.

use tracing::debug;
use tracing::warn;

use crate::errors::PostRagError;

/// Preprocess text for embedding generation
///
/// This function handles:
/// - Normalizing whitespace and newlines
/// - Replacing control characters
/// - Cutting texts longer than `max_chars` at a word boundary
pub fn preprocess_text_for_embedding(text: &str, max_chars: usize) -> Result<String, PostRagError> {
    let sanitized = sanitize_text(text);

    if sanitized.is_empty() {
        return Err(PostRagError::InvalidQuery(
            "Text contains only whitespace after preprocessing".to_string(),
        ));
    }

    let char_count = sanitized.chars().count();
    if char_count > max_chars {
        warn!(
            "Text too long ({} chars), truncating to {} chars",
            char_count, max_chars
        );
        return Ok(smart_truncate_text(&sanitized, max_chars));
    }

    debug!("Preprocessed text: {} -> {} chars", text.len(), sanitized.len());
    Ok(sanitized)
}

/// Replace control characters (newlines, tabs, NUL, ...) with spaces and
/// collapse runs of whitespace
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Truncate at the last word boundary before `max_chars`, or hard-cut when the
/// first word is already longer
fn smart_truncate_text(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(' ') {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated,
    }
}
