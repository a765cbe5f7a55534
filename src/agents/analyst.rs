//! Report Synthesizer
//!
//! A financial-analyst persona that reads the query result and writes a short
//! analytical report in Portuguese.

use crate::llm::provider::LLM;
use crate::types::{AppResult, LLMMessage, LLMRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait ReportSynthesizer: Send + Sync {
    async fn summarize(&self, question: &str, table: &str) -> AppResult<String>;
}

pub struct AnalystAgent {
    llm: Arc<LLM>,
    model: String,
    temperature: f32,
}

impl AnalystAgent {
    pub fn new(llm: Arc<LLM>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
        }
    }

    pub fn system_instruction() -> &'static str {
        "Você é um analista financeiro. Analise os dados abaixo e gere um relatório textual. \
         Use linguagem profissional. Identifique totais, agrupamentos, padrões ou anomalias. \
         Seja breve e monte uma resposta resumida."
    }

    pub fn create_prompt(question: &str, table: &str) -> String {
        format!("Pergunta original: {question}\n\nDados retornados:\n{table}")
    }
}

#[async_trait]
impl ReportSynthesizer for AnalystAgent {
    async fn summarize(&self, question: &str, table: &str) -> AppResult<String> {
        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(Self::create_prompt(question, table))],
            max_tokens: Some(1024),
            temperature: Some(self.temperature),
            system_instruction: Some(Self::system_instruction().to_string()),
        };

        let response = self.llm.create_chat_completion(&request).await?;
        let report = response.content.trim().to_string();
        info!(report_len = report.len(), "Analyst report generated");
        Ok(report)
    }
}
