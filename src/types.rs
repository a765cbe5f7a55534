// Type definitions and error taxonomy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Fixed message returned when `pergunta` is missing or blank.
pub const MISSING_QUESTION_MESSAGE: &str = "Campo 'pergunta' é obrigatório.";

#[derive(Debug, Clone, serde::Serialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Failures surfaced by the question pipeline.
///
/// Upstream variants display their message verbatim: that text is what the
/// client sees in the `erro` field.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", MISSING_QUESTION_MESSAGE)]
    Validation,

    #[error("{0}")]
    Retrieval(String),

    #[error("{0}")]
    Llm(String),

    #[error("{0}")]
    Execution(String),

    #[error("{0}")]
    UnsafeSql(String),

    #[error("{0}")]
    Cache(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation => StatusCode::BAD_REQUEST,
            AppError::UnsafeSql(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation => "validation",
            AppError::Retrieval(_) => "retrieval",
            AppError::Llm(_) => "llm",
            AppError::Execution(_) => "execution",
            AppError::UnsafeSql(_) => "unsafe_sql",
            AppError::Cache(_) => "cache",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Execution(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "erro": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
