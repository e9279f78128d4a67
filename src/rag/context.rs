//! Context assembly from reranked documents

use crate::rag::RerankedCandidate;

/// Builds the bounded context handed to the language model
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_docs: usize,
    max_doc_chars: Option<usize>,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_docs: usize, max_doc_chars: Option<usize>) -> Self {
        Self {
            max_docs,
            max_doc_chars,
        }
    }

    /// Body texts of the first `max_docs` candidates, in order, separated by a
    /// blank line. Empty bodies are skipped but still count against `max_docs`.
    #[must_use]
    pub fn assemble(&self, candidates: &[RerankedCandidate]) -> String {
        candidates
            .iter()
            .take(self.max_docs)
            .map(|c| c.body_text().trim())
            .filter(|body| !body.is_empty())
            .map(|body| match self.max_doc_chars {
                Some(limit) => body.chars().take(limit).collect::<String>(),
                None => body.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(5, None)
    }
}
