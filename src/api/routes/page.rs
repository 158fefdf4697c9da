use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::status_for;
use crate::api::session::{read_session_id, session_cookie};
use crate::api::state::AppState;
use crate::api::views::chat_page;
use crate::application::ChatSession;
use crate::domain::DomainError;

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
}

/// Renders the page, loading the index on the first visit of the process.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (session_id, session) = state.sessions.get_or_create(read_session_id(&jar)).await;
    let mut session = session.lock().await;

    let outcome = state.chat.prepare(&mut session).await;
    render(&state, jar, session_id, &session, outcome.err())
}

/// One round trip, then back to the page. Errors are rendered in place.
pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PromptForm>,
) -> Response {
    let (session_id, session) = state.sessions.get_or_create(read_session_id(&jar)).await;
    let mut session = session.lock().await;

    match state.chat.submit(&mut session, &form.prompt).await {
        Ok(_) => (jar.add(session_cookie(session_id)), Redirect::to("/")).into_response(),
        Err(e) => render(&state, jar, session_id, &session, Some(e)),
    }
}

/// Clears a known session; without one there is nothing to clear.
pub async fn clear(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(session) = state.sessions.get(read_session_id(&jar)).await else {
        return Redirect::to("/").into_response();
    };
    let mut session = session.lock().await;

    match state.chat.clear(&mut session) {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            let id = session.id();
            render(&state, jar, id, &session, Some(e))
        }
    }
}

fn render(
    state: &AppState,
    jar: CookieJar,
    session_id: Uuid,
    session: &ChatSession,
    error: Option<DomainError>,
) -> Response {
    let status = match &error {
        Some(e) => {
            tracing::error!(session_id = %session_id, error = %e, "interaction failed");
            status_for(e)
        }
        None => StatusCode::OK,
    };

    let message = error.map(|e| e.to_string());
    let page = chat_page(&state.config.ui, session.messages(), message.as_deref());
    (status, jar.add(session_cookie(session_id)), page).into_response()
}
