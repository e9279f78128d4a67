//! Persisted result tables (JSON Lines, one row per document)

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::errors::Result;
use crate::models::DocumentMetadata;
use crate::rag::Candidate;
use crate::rag::RerankedCandidate;

/// One snapshot row; `score` is the retrieval similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "selftext_clean")]
    pub body_text: String,
    #[serde(default)]
    pub created_day: String,
    #[serde(default)]
    pub text_length: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

impl From<&Candidate> for SnapshotRow {
    fn from(candidate: &Candidate) -> Self {
        let metadata = &candidate.metadata;
        Self {
            id: candidate.id.clone(),
            score: candidate.similarity_score,
            subreddit: metadata.subreddit.clone(),
            title: metadata.title.clone(),
            body_text: metadata.body_text.clone(),
            created_day: metadata.created_day.clone(),
            text_length: metadata.text_length,
            rerank_score: None,
        }
    }
}

impl From<&RerankedCandidate> for SnapshotRow {
    fn from(reranked: &RerankedCandidate) -> Self {
        Self {
            rerank_score: Some(reranked.relevance_score),
            ..Self::from(&reranked.candidate)
        }
    }
}

impl SnapshotRow {
    /// Rebuild a retrieval candidate, e.g. to rerank a saved result set
    #[must_use]
    pub fn into_candidate(self) -> Candidate {
        Candidate {
            id: self.id,
            similarity_score: self.score,
            metadata: DocumentMetadata {
                subreddit: self.subreddit,
                title: self.title,
                body_text: self.body_text,
                created_day: self.created_day,
                text_length: self.text_length,
                ..DocumentMetadata::default()
            },
        }
    }
}

/// Write rows to `path`, creating parent directories
pub fn write_snapshot<P: AsRef<Path>>(path: P, rows: &[SnapshotRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read rows written by [`write_snapshot`]; blank lines are ignored
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<SnapshotRow>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f32) -> Candidate {
        Candidate {
            id: id.to_string(),
            similarity_score: score,
            metadata: DocumentMetadata {
                subreddit: "LocalLLaMA".to_string(),
                title: "Which GPU?".to_string(),
                body_text: "A used 3090 is fine".to_string(),
                created_day: "2024-05-01".to_string(),
                text_length: 19,
                ..DocumentMetadata::default()
            },
        }
    }

    #[test]
    fn test_reranked_row_carries_both_scores() {
        let reranked = RerankedCandidate {
            candidate: candidate("p1", 0.42),
            relevance_score: 7.5,
        };
        let row = SnapshotRow::from(&reranked);
        assert!((row.score - 0.42).abs() < f32::EPSILON);
        assert_eq!(row.rerank_score, Some(7.5));
        assert_eq!(row.body_text, "A used 3090 is fine");
    }

    #[test]
    fn test_retrieved_rows_omit_rerank_column() {
        let row = SnapshotRow::from(&candidate("p1", 0.4));
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("rerank_score").is_none());
    }

    #[test]
    fn test_write_then_read_into_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrieved").join("query_results.jsonl");
        let rows: Vec<SnapshotRow> = [candidate("a", 0.9), candidate("b", 0.8)]
            .iter()
            .map(SnapshotRow::from)
            .collect();

        write_snapshot(&path, &rows).unwrap();
        let candidates: Vec<Candidate> = read_snapshot(&path)
            .unwrap()
            .into_iter()
            .map(SnapshotRow::into_candidate)
            .collect();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].id, "b");
        assert_eq!(candidates[0].metadata.subreddit, "LocalLLaMA");
    }

    #[test]
    fn test_reads_legacy_body_column() {
        let row: SnapshotRow =
            serde_json::from_str(r#"{"id":"x","score":0.5,"selftext_clean":"old body"}"#).unwrap();
        assert_eq!(row.body_text, "old body");
        assert_eq!(row.rerank_score, None);
    }
}
