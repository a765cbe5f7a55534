//! SQL Generation Agent
//!
//! Turns a question plus schema context into a single SQL statement, or into
//! the refusal phrase when the question cannot be answered from the schema.

use crate::db::SQL_DIALECT;
use crate::llm::provider::LLM;
use crate::types::{AppResult, LLMMessage, LLMRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Phrase the agent is told to answer with when it cannot produce SQL.
pub const REFUSAL_PHRASE: &str = "Desculpe, não sei.";

/// Any generated text containing this substring is a refusal.
pub const REFUSAL_MARKER: &str = "Desculpe";

pub fn is_refusal(generated: &str) -> bool {
    generated.contains(REFUSAL_MARKER)
}

#[async_trait]
pub trait SqlAgent: Send + Sync {
    async fn invoke(&self, input: &str) -> AppResult<String>;
}

/// Instruction sent to the SQL agent: schema context, output rules, question.
pub fn build_instruction(context: &str, question: &str) -> String {
    format!(
        "Contexto do banco de dados Protheus: {context} \
         Responda sempre em português e gere apenas o SQL necessário, \
         no dialeto {SQL_DIALECT}, sem blocos de código markdown e sem explicações. \
         Se não souber responder, diga: '{REFUSAL_PHRASE}' \
         Pergunta: {question}"
    )
}

/// Remove a surrounding ```sql ... ``` fence if the model emitted one anyway.
pub fn strip_sql_fences(output: &str) -> String {
    let trimmed = output.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let Some(body) = body.strip_suffix("```") else {
        return trimmed.to_string();
    };
    let body = body
        .strip_prefix("sql")
        .or_else(|| body.strip_prefix("SQL"))
        .unwrap_or(body);
    body.trim().to_string()
}

pub struct LlmSqlAgent {
    llm: Arc<LLM>,
    model: String,
    temperature: f32,
    table_info: String,
}

impl LlmSqlAgent {
    pub fn new(llm: Arc<LLM>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
            table_info: String::new(),
        }
    }

    /// Column listing of the queryable tables, as rendered by
    /// `db::render_table_info`.
    pub fn with_table_info(mut self, table_info: impl Into<String>) -> Self {
        self.table_info = table_info.into();
        self
    }

    fn system_instruction(&self) -> String {
        let mut instruction = format!(
            "Você é um especialista em SQL {SQL_DIALECT} que consulta as tabelas do ERP Protheus. \
             Gere uma única instrução SQL de leitura, válida no {SQL_DIALECT}, que responda à pergunta."
        );
        if !self.table_info.is_empty() {
            instruction.push_str("\n\nUse somente as tabelas e colunas abaixo:\n\n");
            instruction.push_str(&self.table_info);
        }
        instruction
    }
}

#[async_trait]
impl SqlAgent for LlmSqlAgent {
    async fn invoke(&self, input: &str) -> AppResult<String> {
        info!(input_len = input.len(), "Invoking SQL agent");

        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(input)],
            max_tokens: Some(1024),
            temperature: Some(self.temperature),
            system_instruction: Some(self.system_instruction()),
        };

        let response = self.llm.create_chat_completion(&request).await?;
        let sql = strip_sql_fences(&response.content);
        debug!(output_len = sql.len(), finish_reason = %response.finish_reason, "SQL agent replied");
        Ok(sql)
    }
}
