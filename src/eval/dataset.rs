//! Question sets in, result tables out (JSON Lines)

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use tracing::warn;

use crate::errors::PostRagError;
use crate::errors::Result;

/// One evaluation question
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvalCase {
    pub question: String,
    /// Lowercased, trimmed, empty entries dropped
    #[serde(default, deserialize_with = "deserialize_keywords")]
    pub expected_keywords: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordsField {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_keywords<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<KeywordsField>::deserialize(deserializer)?;
    Ok(match raw {
        Some(KeywordsField::List(items)) => clean_keywords(items.iter().map(String::as_str)),
        Some(KeywordsField::Joined(joined)) => clean_keywords(joined.split(';')),
        None => Vec::new(),
    })
}

fn clean_keywords<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub question: String,
    pub expected_keywords: Vec<String>,
    pub answer: String,
    pub grounded: bool,
    /// `None` when the case has no expected keywords
    pub precision: Option<f64>,
    pub latency_sec: f64,
    pub search_error: Option<String>,
    pub generate_error: Option<String>,
}

impl EvalRecord {
    #[must_use]
    pub fn failed(&self) -> bool {
        self.search_error.is_some() || self.generate_error.is_some()
    }
}

/// Load a question set; lines without a question are skipped with a warning
pub fn load_cases<P: AsRef<Path>>(path: P) -> Result<Vec<EvalCase>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut cases = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let case: EvalCase = serde_json::from_str(&line)?;
        if case.question.trim().is_empty() {
            warn!("{}:{}: empty question, skipping", path.display(), line_no + 1);
            continue;
        }
        cases.push(case);
    }

    if cases.is_empty() {
        return Err(PostRagError::InvalidConfiguration(format!(
            "no questions in {}",
            path.display()
        )));
    }
    Ok(cases)
}

/// Write the results table, creating parent directories
pub fn write_records<P: AsRef<Path>>(path: P, records: &[EvalRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
