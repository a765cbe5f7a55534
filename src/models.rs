use crate::orchestrator::{Answer, Orchestrator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Answer persisted in the cache. The `cache` flag is added at response time
/// and never stored.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resposta_sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabela: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relatorio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resposta: Option<String>,
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct PerguntaRequest {
    #[serde(default)]
    pub pergunta: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct AnsweredResponse {
    #[serde(flatten)]
    pub result: CachedResult,
    pub cache: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct RefusalResponse {
    pub resposta: String,
    pub sql: Option<String>,
    pub cache: bool,
}

#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum PerguntaResponse {
    Answered(AnsweredResponse),
    Refused(RefusalResponse),
}

impl From<Answer> for PerguntaResponse {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Cached(result) => PerguntaResponse::Answered(AnsweredResponse {
                result,
                cache: true,
            }),
            Answer::Fresh(result) => PerguntaResponse::Answered(AnsweredResponse {
                result,
                cache: false,
            }),
            Answer::Refused(resposta) => PerguntaResponse::Refused(RefusalResponse {
                resposta,
                sql: None,
                cache: false,
            }),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
    pub cache: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fresh() -> CachedResult {
        CachedResult {
            resposta_sql: Some("SELECT COUNT(*) FROM SA1010".into()),
            tabela: Some("| count |\n| --- |\n| 42 |".into()),
            relatorio: Some("Há 42 clientes.".into()),
            resposta: None,
        }
    }

    #[test]
    fn test_fresh_answer_shape() {
        let body = serde_json::to_value(PerguntaResponse::from(Answer::Fresh(fresh()))).unwrap();
        assert_eq!(
            body,
            json!({
                "resposta_sql": "SELECT COUNT(*) FROM SA1010",
                "tabela": "| count |\n| --- |\n| 42 |",
                "relatorio": "Há 42 clientes.",
                "cache": false
            })
        );
    }

    #[test]
    fn test_cached_answer_sets_flag() {
        let body = serde_json::to_value(PerguntaResponse::from(Answer::Cached(fresh()))).unwrap();
        assert_eq!(body["cache"], json!(true));
        assert_eq!(body["resposta_sql"], json!("SELECT COUNT(*) FROM SA1010"));
    }

    #[test]
    fn test_refusal_shape() {
        let body = serde_json::to_value(PerguntaResponse::from(Answer::Refused(
            "Desculpe, não sei.".into(),
        )))
        .unwrap();
        assert_eq!(
            body,
            json!({ "resposta": "Desculpe, não sei.", "sql": null, "cache": false })
        );
    }

    #[test]
    fn test_cached_result_never_stores_flag() {
        let stored = serde_json::to_value(fresh()).unwrap();
        assert!(stored.get("cache").is_none());
        let decoded: CachedResult = serde_json::from_value(stored).unwrap();
        assert_eq!(decoded, fresh());
    }
}
