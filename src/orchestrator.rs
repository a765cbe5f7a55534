//! Request Orchestrator
//!
//! Sequences one question through the pipeline:
//!
//! ```text
//! question ─▶ normalize ─▶ cache ──hit──▶ Cached
//!                            │
//!                           miss
//!                            ▼
//!     context search ─▶ SQL agent ──refusal──▶ Refused (never cached)
//!                            │
//!                    read-only gate ─▶ execute ─▶ markdown table
//!                            │
//!                     analyst report ─▶ cache store ─▶ Fresh
//! ```
//!
//! Collaborators are injected as capability traits. Each request runs one
//! sequential path: no per-key locking, no timeouts, no retries. Concurrent
//! identical questions may both compute; the last cache write wins.

use crate::agents::{build_instruction, is_refusal, ReportSynthesizer, SqlAgent};
use crate::cache::{normalize, AnswerCache, CacheKey, CACHE_TTL};
use crate::db::{ensure_read_only, QueryExecutor};
use crate::embeddings::ContextRetriever;
use crate::models::CachedResult;
use crate::types::{AppError, AppResult};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Number of schema snippets fed to the SQL agent.
pub const CONTEXT_TOP_K: usize = 1;

/// Outcome of a successfully handled question.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Cached(CachedResult),
    Fresh(CachedResult),
    /// Text of the agent's refusal.
    Refused(String),
}

/// Pipeline states, reported in logs when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    KeyDerived,
    CacheMiss,
    ContextFetched,
    SqlGenerated,
    SqlValid,
    Executed,
    Summarized,
    Cached,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::KeyDerived => "key_derived",
            Stage::CacheMiss => "cache_miss",
            Stage::ContextFetched => "context_fetched",
            Stage::SqlGenerated => "sql_generated",
            Stage::SqlValid => "sql_valid",
            Stage::Executed => "executed",
            Stage::Summarized => "summarized",
            Stage::Cached => "cached",
        };
        f.write_str(name)
    }
}

pub struct Orchestrator {
    cache: Arc<dyn AnswerCache>,
    retriever: Arc<dyn ContextRetriever>,
    sql_agent: Arc<dyn SqlAgent>,
    executor: Arc<dyn QueryExecutor>,
    synthesizer: Arc<dyn ReportSynthesizer>,
    read_only: bool,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<dyn AnswerCache>,
        retriever: Arc<dyn ContextRetriever>,
        sql_agent: Arc<dyn SqlAgent>,
        executor: Arc<dyn QueryExecutor>,
        synthesizer: Arc<dyn ReportSynthesizer>,
    ) -> Self {
        Self {
            cache,
            retriever,
            sql_agent,
            executor,
            synthesizer,
            read_only: true,
        }
    }

    /// Toggle the statement-type gate between SQL generation and execution.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub async fn answer(&self, question: &str) -> AppResult<Answer> {
        if question.trim().is_empty() {
            return Err(AppError::Validation);
        }

        let key = normalize(question);
        debug!(key = %key, stage = %Stage::KeyDerived, "Cache key derived");

        match self.cache.get(&key).await {
            Ok(Some(hit)) => {
                info!(key = %key, cache_hit = true, "Answer served from cache");
                return Ok(Answer::Cached(hit));
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Cache lookup failed, treating as miss"),
        }
        info!(key = %key, cache_hit = false, "Cache miss");

        let mut stage = Stage::CacheMiss;
        let outcome = self.compute(question, &key, &mut stage).await;
        if let Err(e) = &outcome {
            error!(key = %key, stage = %stage, kind = e.kind(), error = %e, "Question pipeline failed");
        }
        outcome
    }

    async fn compute(&self, question: &str, key: &CacheKey, stage: &mut Stage) -> AppResult<Answer> {
        let snippets = self.retriever.search(question, CONTEXT_TOP_K).await?;
        let context = snippets.join(" ");
        *stage = Stage::ContextFetched;
        debug!(context_len = context.len(), "Schema context fetched");

        let instruction = build_instruction(&context, question);
        let generated = self.sql_agent.invoke(&instruction).await?.trim().to_string();
        *stage = Stage::SqlGenerated;

        if is_refusal(&generated) {
            info!(key = %key, "SQL agent refused the question");
            return Ok(Answer::Refused(generated));
        }

        if self.read_only {
            ensure_read_only(&generated)?;
        }
        *stage = Stage::SqlValid;
        debug!(sql_len = generated.len(), "Executing generated SQL");

        let table = self.executor.execute(&generated).await?;
        *stage = Stage::Executed;
        let tabela = table.to_markdown();

        let relatorio = self.synthesizer.summarize(question, &tabela).await?;
        *stage = Stage::Summarized;

        let result = CachedResult {
            resposta_sql: Some(generated),
            tabela: Some(tabela),
            relatorio: Some(relatorio),
            resposta: None,
        };

        match self.cache.set(key, &result, CACHE_TTL).await {
            Ok(()) => *stage = Stage::Cached,
            Err(e) => warn!(key = %key, error = %e, "Failed to store answer in cache"),
        }
        info!(key = %key, rows = table.row_count(), "Question answered");

        Ok(Answer::Fresh(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    const QUESTION: &str = "Quantos clientes existem?";
    const COUNT_SQL: &str = "SELECT COUNT(*) FROM SA1010";

    fn fresh(answer: Answer) -> CachedResult {
        match answer {
            Answer::Fresh(result) => result,
            other => panic!("expected fresh answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_answers_count_question() {
        let harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        let orchestrator = harness.orchestrator();

        let result = fresh(orchestrator.answer(QUESTION).await.unwrap());

        assert_eq!(result.resposta_sql.as_deref(), Some(COUNT_SQL));
        assert!(result.tabela.as_deref().unwrap().contains("42"));
        assert!(!result.relatorio.as_deref().unwrap().is_empty());
        assert_eq!(result.resposta, None);
        assert_eq!(
            harness.executor.statements.lock().unwrap().as_slice(),
            &[COUNT_SQL.to_string()]
        );
    }

    #[tokio::test]
    async fn test_instruction_carries_context_and_question() {
        let harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        harness.orchestrator().answer(QUESTION).await.unwrap();

        let inputs = harness.agent.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0].contains(SA1010_CONTEXT));
        assert!(inputs[0].ends_with(&format!("Pergunta: {}", QUESTION)));
    }

    #[tokio::test]
    async fn test_second_identical_question_is_cached() {
        let harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        let orchestrator = harness.orchestrator();

        let first = fresh(orchestrator.answer(QUESTION).await.unwrap());
        let second = orchestrator.answer(QUESTION).await.unwrap();

        assert_eq!(second, Answer::Cached(first));
        assert_eq!(harness.agent_calls(), 1);
        assert_eq!(harness.executor_calls(), 1);
        assert_eq!(harness.synthesizer_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_ignores_case_and_surrounding_whitespace() {
        let harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        let orchestrator = harness.orchestrator();

        orchestrator.answer(QUESTION).await.unwrap();
        let again = orchestrator.answer("   QUANTOS CLIENTES EXISTEM?  ").await.unwrap();

        assert!(matches!(again, Answer::Cached(_)));
        assert_eq!(harness.agent_calls(), 1);
    }

    #[tokio::test]
    async fn test_refusal_is_returned_and_never_cached() {
        let harness = Harness::new("Desculpe, não sei.", FakeExecutor::count_42());
        let orchestrator = harness.orchestrator();

        for _ in 0..3 {
            let answer = orchestrator.answer(QUESTION).await.unwrap();
            assert_eq!(answer, Answer::Refused("Desculpe, não sei.".to_string()));
        }

        assert_eq!(harness.agent_calls(), 3);
        assert_eq!(harness.executor_calls(), 0);
        assert!(harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_refusal_output_is_trimmed() {
        let harness = Harness::new("  Desculpe, não encontrei essa tabela.\n", FakeExecutor::count_42());
        let answer = harness.orchestrator().answer(QUESTION).await.unwrap();
        assert_eq!(
            answer,
            Answer::Refused("Desculpe, não encontrei essa tabela.".to_string())
        );
    }

    #[tokio::test]
    async fn test_blank_question_touches_nothing() {
        let harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        let orchestrator = harness.orchestrator();

        for question in ["", "   ", "\n\t"] {
            let err = orchestrator.answer(question).await.unwrap_err();
            assert!(matches!(err, AppError::Validation));
        }

        assert_eq!(harness.retriever_calls(), 0);
        assert_eq!(harness.agent_calls(), 0);
        assert_eq!(harness.executor_calls(), 0);
    }

    #[tokio::test]
    async fn test_execution_fault_surfaces_message_and_caches_nothing() {
        let message = "Invalid object name 'SX9999'.";
        let harness = Harness::new("SELECT * FROM SX9999", FakeExecutor::failing(message));
        let orchestrator = harness.orchestrator();

        let err = orchestrator.answer(QUESTION).await.unwrap_err();

        assert!(matches!(err, AppError::Execution(_)));
        assert_eq!(err.to_string(), message);
        assert_eq!(harness.synthesizer_calls(), 0);
        assert!(harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_retrieval_fault_surfaces_message_and_caches_nothing() {
        let mut harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        harness.retriever = Arc::new(FakeRetriever::failing("embedding service unavailable"));

        let err = harness.orchestrator().answer(QUESTION).await.unwrap_err();

        assert!(matches!(err, AppError::Retrieval(_)));
        assert_eq!(err.to_string(), "embedding service unavailable");
        assert_eq!(harness.agent_calls(), 0);
        assert_eq!(harness.executor_calls(), 0);
        assert!(harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_agent_fault_surfaces_message_and_caches_nothing() {
        let mut harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        harness.agent = Arc::new(FakeSqlAgent::failing("LLM API error: model overloaded"));

        let err = harness.orchestrator().answer(QUESTION).await.unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(err.to_string(), "LLM API error: model overloaded");
        assert_eq!(harness.executor_calls(), 0);
        assert_eq!(harness.synthesizer_calls(), 0);
        assert!(harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_synthesizer_fault_caches_nothing() {
        let mut harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        harness.synthesizer = Arc::new(FakeSynthesizer {
            fail_with: Some("rate limit exceeded".into()),
            ..Default::default()
        });

        let err = harness.orchestrator().answer(QUESTION).await.unwrap_err();

        assert_eq!(err.to_string(), "rate limit exceeded");
        assert!(harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_only_gate_blocks_writes() {
        let harness = Harness::new("DELETE FROM SA1010", FakeExecutor::count_42());

        let err = harness.orchestrator().answer(QUESTION).await.unwrap_err();

        assert!(matches!(err, AppError::UnsafeSql(_)));
        assert_eq!(harness.executor_calls(), 0);
        assert!(harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_gate_can_be_disabled() {
        let harness = Harness::new("DELETE FROM SA1010", FakeExecutor::count_42());
        let orchestrator = harness.orchestrator().with_read_only(false);

        let answer = orchestrator.answer(QUESTION).await.unwrap();

        assert!(matches!(answer, Answer::Fresh(_)));
        assert_eq!(harness.executor_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_context_is_empty_string() {
        let mut harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        harness.retriever = Arc::new(FakeRetriever::default());

        harness.orchestrator().answer(QUESTION).await.unwrap();

        let inputs = harness.agent.inputs.lock().unwrap();
        assert_eq!(inputs[0], build_instruction("", QUESTION));
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_compute() {
        let harness = Harness::new(COUNT_SQL, FakeExecutor::count_42());
        let orchestrator = Orchestrator::new(
            Arc::new(BrokenCache),
            harness.retriever.clone(),
            harness.agent.clone(),
            harness.executor.clone(),
            harness.synthesizer.clone(),
        );

        assert!(matches!(orchestrator.answer(QUESTION).await.unwrap(), Answer::Fresh(_)));
        assert!(matches!(orchestrator.answer(QUESTION).await.unwrap(), Answer::Fresh(_)));
        assert_eq!(harness.agent_calls(), 2);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::CacheMiss.to_string(), "cache_miss");
        assert_eq!(Stage::SqlValid.to_string(), "sql_valid");
    }
}
