//! Ingestion handler: load pre-embedded documents into the index

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::config::AppConfig;
use crate::errors::PostRagError;
use crate::index::ensure_dimension;
use crate::index::upsert_in_batches;
use crate::index::PineconeIndex;
use crate::models::Document;
use crate::Result;

/// Read JSON Lines of `{id, embedding, metadata}`; blank lines are ignored
pub fn read_documents(path: &Path, dimension: usize) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: Document = serde_json::from_str(&line)?;
        if document.embedding.len() != dimension {
            return Err(PostRagError::InvalidConfiguration(format!(
                "{}:{}: document '{}' has {} dims, index expects {}",
                path.display(),
                line_no + 1,
                document.id,
                document.embedding.len(),
                dimension
            )));
        }
        documents.push(document);
    }
    Ok(documents)
}

pub async fn handle_ingest(config: &AppConfig, path: &Path, batch_size: Option<usize>) -> Result<()> {
    let batch_size = batch_size.unwrap_or(config.index.upsert_batch_size);
    let dimension = config.embedding_dimension();

    let documents = read_documents(path, dimension)?;
    print_info(&format!(
        "📥 Loaded {} documents from {}",
        documents.len(),
        path.display()
    ));

    let index = PineconeIndex::connect(&config.index).await?;
    ensure_dimension(&index, dimension)?;

    let upserted = upsert_in_batches(&index, documents, batch_size).await?;
    info!("Ingestion finished: {} vectors", upserted);
    print_success(&format!("Upserted {upserted} vectors into '{}'", config.index.index_name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_read_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":"a","embedding":[0.1,0.2],"metadata":{{"title":"nan"}}}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"b","embedding":[0.3,0.4]}}"#).unwrap();

        let docs = read_documents(file.path(), 2).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "b");
    }

    #[test]
    fn test_read_documents_rejects_wrong_dimension() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"a","embedding":[0.1,0.2,0.3]}}"#).unwrap();
        assert!(matches!(
            read_documents(file.path(), 2),
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }
}
