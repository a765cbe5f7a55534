// Test doubles for the pipeline collaborators

use crate::agents::{ReportSynthesizer, SqlAgent};
use crate::cache::{AnswerCache, CacheKey, MemoryAnswerCache};
use crate::db::QueryExecutor;
use crate::embeddings::ContextRetriever;
use crate::models::CachedResult;
use crate::orchestrator::Orchestrator;
use crate::table::ResultTable;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SA1010_CONTEXT: &str =
    "Tabela SA1010: Cadastro de clientes com dados como nome, endereço, CPF/CNPJ, e cidade.";

#[derive(Default)]
pub struct FakeRetriever {
    pub snippets: Vec<String>,
    pub calls: AtomicUsize,
    pub fail_with: Option<String>,
}

impl FakeRetriever {
    pub fn with(snippets: &[&str]) -> Self {
        Self {
            snippets: snippets.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContextRetriever for FakeRetriever {
    async fn search(&self, _query: &str, top_k: usize) -> AppResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(AppError::Retrieval(message.clone()));
        }
        Ok(self.snippets.iter().take(top_k).cloned().collect())
    }
}

/// Replies with `reply`, or fails with `fail_with` as an LLM error.
pub struct FakeSqlAgent {
    pub reply: String,
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<String>>,
    pub fail_with: Option<String>,
}

impl FakeSqlAgent {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::replying("")
        }
    }
}

#[async_trait]
impl SqlAgent for FakeSqlAgent {
    async fn invoke(&self, input: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        if let Some(message) = &self.fail_with {
            return Err(AppError::Llm(message.clone()));
        }
        Ok(self.reply.clone())
    }
}

pub struct FakeExecutor {
    pub outcome: Result<ResultTable, String>,
    pub calls: AtomicUsize,
    pub statements: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn returning(table: ResultTable) -> Self {
        Self {
            outcome: Ok(table),
            calls: AtomicUsize::new(0),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn count_42() -> Self {
        Self::returning(ResultTable::new(vec!["total".into()], vec![vec!["42".into()]]))
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn execute(&self, statement: &str) -> AppResult<ResultTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.statements.lock().unwrap().push(statement.to_string());
        self.outcome.clone().map_err(AppError::Execution)
    }
}

#[derive(Default)]
pub struct FakeSynthesizer {
    pub calls: AtomicUsize,
    pub fail_with: Option<String>,
}

#[async_trait]
impl ReportSynthesizer for FakeSynthesizer {
    async fn summarize(&self, question: &str, table: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(AppError::Llm(message.clone()));
        }
        Ok(format!(
            "Relatório para \"{}\" com base em {} linhas de dados.",
            question,
            table.lines().count()
        ))
    }
}

/// Cache whose every operation fails, for degradation tests.
pub struct BrokenCache;

#[async_trait]
impl AnswerCache for BrokenCache {
    async fn get(&self, _key: &CacheKey) -> AppResult<Option<CachedResult>> {
        Err(AppError::Cache("connection refused".into()))
    }

    async fn set(&self, _key: &CacheKey, _value: &CachedResult, _ttl: Duration) -> AppResult<()> {
        Err(AppError::Cache("connection refused".into()))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

/// All collaborators of one orchestrator, kept so tests can inspect them.
pub struct Harness {
    pub cache: Arc<MemoryAnswerCache>,
    pub retriever: Arc<FakeRetriever>,
    pub agent: Arc<FakeSqlAgent>,
    pub executor: Arc<FakeExecutor>,
    pub synthesizer: Arc<FakeSynthesizer>,
}

impl Harness {
    pub fn new(agent_reply: &str, executor: FakeExecutor) -> Self {
        Self {
            cache: Arc::new(MemoryAnswerCache::new()),
            retriever: Arc::new(FakeRetriever::with(&[SA1010_CONTEXT])),
            agent: Arc::new(FakeSqlAgent::replying(agent_reply)),
            executor: Arc::new(executor),
            synthesizer: Arc::new(FakeSynthesizer::default()),
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.cache.clone(),
            self.retriever.clone(),
            self.agent.clone(),
            self.executor.clone(),
            self.synthesizer.clone(),
        )
    }

    pub fn agent_calls(&self) -> usize {
        self.agent.calls.load(Ordering::SeqCst)
    }

    pub fn executor_calls(&self) -> usize {
        self.executor.calls.load(Ordering::SeqCst)
    }

    pub fn retriever_calls(&self) -> usize {
        self.retriever.calls.load(Ordering::SeqCst)
    }

    pub fn synthesizer_calls(&self) -> usize {
        self.synthesizer.calls.load(Ordering::SeqCst)
    }
}
