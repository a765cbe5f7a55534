use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use crate::models::{AppState, PerguntaRequest, PerguntaResponse};
use crate::types::{AppError, AppResult};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pergunta", post(post_pergunta))
}

pub async fn post_pergunta(
    State(state): State<AppState>,
    payload: Result<Json<PerguntaRequest>, JsonRejection>,
) -> AppResult<Json<PerguntaResponse>> {
    // Unreadable bodies get the same answer as a missing field.
    let question = match payload {
        Ok(Json(request)) => request.pergunta.unwrap_or_default(),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected request body");
            return Err(AppError::Validation);
        }
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("pergunta", %request_id);
    info!(parent: &span, question_len = question.len(), "Received question");

    let answer = state.orchestrator.answer(&question).instrument(span).await?;
    Ok(Json(answer.into()))
}
