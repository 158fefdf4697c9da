use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::session::{read_session_id, session_cookie};
use crate::api::state::AppState;
use crate::domain::{ChatResponse, Message};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub response: String,
    pub standalone_question: String,
    pub sources: Vec<SourceResponse>,
}

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub source: String,
    pub content: String,
    pub score: f32,
}

impl ChatReply {
    fn new(session_id: Uuid, response: ChatResponse) -> Self {
        Self {
            session_id,
            response: response.response,
            standalone_question: response.standalone_question,
            sources: response
                .sources
                .into_iter()
                .map(|r| SourceResponse {
                    source: r.chunk.source.to_string(),
                    content: r.chunk.content,
                    score: r.score,
                })
                .collect(),
        }
    }
}

/// The cookie is set on failures too, so a user turn kept after an upstream
/// error stays reachable.
pub async fn chat_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<ChatRequest>,
) -> Response {
    let (session_id, session) = state.sessions.get_or_create(read_session_id(&jar)).await;
    let mut session = session.lock().await;

    let outcome = state
        .chat
        .submit(&mut session, &request.message)
        .await
        .map_err(ApiError::from)
        .and_then(|response| {
            response.ok_or_else(|| ApiError::bad_request("message must not be empty"))
        });

    let jar = jar.add(session_cookie(session_id));
    match outcome {
        Ok(response) => (jar, Json(ChatReply::new(session_id, response))).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

/// History of the caller's session; empty when the session is unknown.
pub async fn list_messages(State(state): State<AppState>, jar: CookieJar) -> Json<Vec<Message>> {
    let Some(session) = state.sessions.get(read_session_id(&jar)).await else {
        return Json(Vec::new());
    };
    let messages = session.lock().await.messages().to_vec();
    Json(messages)
}

pub async fn clear_messages(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<StatusCode, ApiError> {
    if let Some(session) = state.sessions.get(read_session_id(&jar)).await {
        let mut session = session.lock().await;
        state.chat.clear(&mut session)?;
    }
    Ok(StatusCode::NO_CONTENT)
}
