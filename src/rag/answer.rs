//! Grounded answer generation and summarization over reranked documents

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::llm::prompts::QaPrompts;
use crate::llm::CompletionParams;
use crate::llm::LanguageModel;
use crate::rag::prompts::is_insufficient_context;
use crate::rag::prompts::DEFAULT_ANSWER_INSTRUCTION;
use crate::rag::prompts::DEFAULT_SUMMARIZATION_PROMPT;
use crate::rag::Answer;
use crate::rag::ContextAssembler;
use crate::rag::RerankedCandidate;

/// Generation settings resolved from configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub params: CompletionParams,
    pub timeout: Duration,
    pub answer_instruction: String,
    pub summarization_prompt: String,
    pub max_doc_chars: Option<usize>,
}

impl GenerationConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            params: CompletionParams {
                model: config.llm_model()?.to_string(),
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            },
            timeout: config.llm_timeout(),
            answer_instruction: config
                .llm
                .answer_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_ANSWER_INSTRUCTION.to_string()),
            summarization_prompt: config
                .llm
                .summarization_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_PROMPT.to_string()),
            max_doc_chars: config.search.max_doc_chars,
        })
    }
}

/// Turns reranked candidates into an [`Answer`]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    config: GenerationConfig,
}

impl AnswerGenerator {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    /// Answer `query` from the first `max_context_docs` candidates.
    ///
    /// Empty context yields the fallback answer without a model call.
    pub async fn answer(
        &self,
        query: &str,
        candidates: &[RerankedCandidate],
        max_context_docs: usize,
    ) -> Result<Answer> {
        let context = self.assembler(max_context_docs).assemble(candidates);
        if context.is_empty() {
            info!("No usable context, returning fallback answer");
            return Ok(Answer::insufficient_context());
        }

        let values = HashMap::from([("question", query), ("context", context.as_str())]);
        let user_content = QaPrompts::grounded_question().render(&values);
        debug!("Answer prompt: {} chars of context", context.len());

        let reply = self
            .complete(&self.config.answer_instruction, &user_content)
            .await?;

        if is_insufficient_context(&reply) {
            info!("Model reported insufficient context");
            return Ok(Answer::insufficient_context());
        }

        Ok(Answer {
            text: reply,
            grounded: true,
        })
    }

    /// Summarize the first `max_context_docs` candidates
    pub async fn summarize(
        &self,
        candidates: &[RerankedCandidate],
        max_context_docs: usize,
    ) -> Result<Answer> {
        let context = self.assembler(max_context_docs).assemble(candidates);
        if context.is_empty() {
            return Ok(Answer::insufficient_context());
        }

        let reply = self
            .complete(&self.config.summarization_prompt, &context)
            .await?;
        if is_insufficient_context(&reply) {
            info!("Model reported nothing to summarize");
            return Ok(Answer::insufficient_context());
        }

        Ok(Answer {
            text: reply,
            grounded: true,
        })
    }

    async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String> {
        let reply = tokio::time::timeout(
            self.config.timeout,
            self.model
                .complete(system_instruction, user_content, &self.config.params),
        )
        .await
        .map_err(|_| PostRagError::GenerationTimeout(self.config.timeout))??;

        if reply.trim().is_empty() {
            warn!("Language model returned an empty reply");
            return Err(PostRagError::GenerationUnavailable(
                "empty completion".to_string(),
            ));
        }
        Ok(reply.trim().to_string())
    }

    fn assembler(&self, max_context_docs: usize) -> ContextAssembler {
        ContextAssembler::new(max_context_docs, self.config.max_doc_chars)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::LlmProvider;
    use crate::models::DocumentMetadata;
    use crate::rag::Candidate;
    use crate::rag::prompts::FALLBACK_ANSWER;

    struct ScriptedModel {
        reply: String,
        delay: Duration,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(
            &self,
            system_instruction: &str,
            user_content: &str,
            _params: &CompletionParams,
        ) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((system_instruction.to_string(), user_content.to_string()));
            tokio::time::sleep(self.delay).await;
            Ok(self.reply.clone())
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::Ollama
        }
    }

    fn config() -> GenerationConfig {
        GenerationConfig {
            params: CompletionParams {
                model: "mistral".to_string(),
                max_tokens: 64,
                temperature: 0.0,
            },
            timeout: Duration::from_secs(1),
            answer_instruction: DEFAULT_ANSWER_INSTRUCTION.to_string(),
            summarization_prompt: DEFAULT_SUMMARIZATION_PROMPT.to_string(),
            max_doc_chars: None,
        }
    }

    fn reranked(body: &str) -> RerankedCandidate {
        RerankedCandidate {
            candidate: Candidate {
                id: body.to_string(),
                similarity_score: 0.5,
                metadata: DocumentMetadata {
                    body_text: body.to_string(),
                    ..DocumentMetadata::default()
                },
            },
            relevance_score: 1.0,
        }
    }

    #[tokio::test]
    async fn test_grounded_answer() {
        let model = Arc::new(ScriptedModel::replying("  Take the fast.ai course. "));
        let generator = AnswerGenerator::new(model.clone(), config());

        let answer = generator
            .answer("How to learn GenAI?", &[reranked("fast.ai is great")], 5)
            .await
            .unwrap();
        assert!(answer.grounded);
        assert_eq!(answer.text, "Take the fast.ai course.");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].0, DEFAULT_ANSWER_INSTRUCTION);
        assert!(seen[0].1.contains("fast.ai is great"));
    }

    #[tokio::test]
    async fn test_refusal_becomes_fallback() {
        let model = Arc::new(ScriptedModel::replying(
            "Unfortunately I don't have enough information from the data.",
        ));
        let generator = AnswerGenerator::new(model, config());
        let answer = generator
            .answer("Best pizza in Naples?", &[reranked("GPU prices")], 5)
            .await
            .unwrap();
        assert_eq!(answer, Answer::insufficient_context());
        assert_eq!(answer.text, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_empty_context_skips_model() {
        let model = Arc::new(ScriptedModel::replying("should not be used"));
        let generator = AnswerGenerator::new(model.clone(), config());
        let answer = generator.answer("q", &[reranked("")], 5).await.unwrap();
        assert!(!answer.grounded);
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_is_unavailable() {
        let generator = AnswerGenerator::new(Arc::new(ScriptedModel::replying("   ")), config());
        assert!(matches!(
            generator.answer("q", &[reranked("ctx")], 5).await,
            Err(PostRagError::GenerationUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_generation_timeout() {
        let model = Arc::new(ScriptedModel {
            reply: "late".to_string(),
            delay: Duration::from_secs(30),
            seen: Mutex::new(Vec::new()),
        });
        let mut cfg = config();
        cfg.timeout = Duration::from_millis(50);
        let generator = AnswerGenerator::new(model, cfg);

        let started = std::time::Instant::now();
        let result = generator.answer("q", &[reranked("ctx")], 5).await;
        assert!(matches!(result, Err(PostRagError::GenerationTimeout(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_summarize_uses_summarization_prompt() {
        let model = Arc::new(ScriptedModel::replying("Posts recommend courses."));
        let generator = AnswerGenerator::new(model.clone(), config());
        let summary = generator
            .summarize(&[reranked("course A"), reranked("course B")], 5)
            .await
            .unwrap();
        assert!(summary.grounded);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].0, DEFAULT_SUMMARIZATION_PROMPT);
        assert_eq!(seen[0].1, "course A\n\ncourse B");
    }

    #[tokio::test]
    async fn test_summarize_refusal_becomes_fallback() {
        let model = Arc::new(ScriptedModel::replying(
            "No relevant info found in these posts.",
        ));
        let generator = AnswerGenerator::new(model, config());
        let answer = generator
            .summarize(&[reranked("GPU prices")], 5)
            .await
            .unwrap();
        assert_eq!(answer, Answer::insufficient_context());
        assert_eq!(answer.text, FALLBACK_ANSWER);
    }

    #[test]
    fn test_config_overrides_answer_prompt() {
        let mut app = AppConfig::default();
        app.llm.answer_prompt = Some("Be brief.".to_string());
        let cfg = GenerationConfig::from_app_config(&app).unwrap();
        assert_eq!(cfg.answer_instruction, "Be brief.");
        assert_eq!(cfg.summarization_prompt, DEFAULT_SUMMARIZATION_PROMPT);
    }
}
