//! Fixed instructions and fallback texts for answer generation

/// Returned whenever the context cannot support an answer
pub const FALLBACK_ANSWER: &str = "I don't have enough information from the data.";

/// Alternate refusal phrasing some models produce
pub const NO_RELEVANT_INFO_MARKER: &str = "No relevant info found";

pub const DEFAULT_ANSWER_INSTRUCTION: &str = "You are a QA assistant. Answer the question ONLY using the provided context. \
If the context is irrelevant or empty, reply exactly: I don't have enough information from the data. \
Do not summarize all context, extract only what answers the query.";

pub const DEFAULT_SUMMARIZATION_PROMPT: &str = "Summarize the following text:";

/// Whether a model reply is a refusal rather than an answer
#[must_use]
pub fn is_insufficient_context(reply: &str) -> bool {
    let normalized = reply.replace(['\u{2018}', '\u{2019}'], "'").to_lowercase();
    normalized.contains(&FALLBACK_ANSWER.to_lowercase())
        || normalized.contains(&NO_RELEVANT_INFO_MARKER.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_fallback_sentence() {
        assert!(is_insufficient_context(FALLBACK_ANSWER));
        assert!(is_insufficient_context(
            "Sorry. I don\u{2019}t have enough information from the data."
        ));
        assert!(is_insufficient_context("no relevant info found"));
    }

    #[test]
    fn test_real_answer_is_not_fallback() {
        assert!(!is_insufficient_context(
            "Start with the free Hugging Face course, then build a small project."
        ));
    }

    #[test]
    fn test_instruction_demands_exact_fallback() {
        assert!(DEFAULT_ANSWER_INSTRUCTION.contains(FALLBACK_ANSWER));
    }
}
