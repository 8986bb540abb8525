use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use crate::domain::{
    auth::{Authenticator, Credentials},
    repository::TodoRepository,
};
use crate::http::{
    state::{bearer, AppState},
    types::{ApiError, SessionBody},
};

pub fn router<A, R>(state: AppState<A, R>) -> Router
where
    A: Authenticator + Clone,
    R: TodoRepository + Clone,
{
    Router::new()
        .route("/signup", post(sign_up::<A, R>))
        .route("/login", post(log_in::<A, R>))
        .route("/logout", post(log_out::<A, R>))
        .route("/session", get(current_session::<A, R>))
        .with_state(state)
}

async fn sign_up<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, Json(credentials): Json<Credentials>) -> Result<(StatusCode, Json<SessionBody>), ApiError> {
    let mut app = state.anonymous_view();
    if let Err(e) = app.sign_up(&credentials).await {
        let inline = app.form().and_then(|f| f.signup_error.clone());
        return Err(with_message(ApiError::from(e), inline));
    }
    let Some(session) = app.session().cloned() else { return Err(ApiError::unauthorized()) };
    state.insert(app).await?;
    Ok((StatusCode::CREATED, Json(SessionBody::from(&session))))
}

async fn log_in<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, Json(credentials): Json<Credentials>) -> Result<Json<SessionBody>, ApiError> {
    let mut app = state.anonymous_view();
    if let Err(e) = app.log_in(&credentials).await {
        let inline = app.form().and_then(|f| f.login_error.clone());
        return Err(with_message(ApiError::from(e), inline));
    }
    let Some(session) = app.session().cloned() else { return Err(ApiError::unauthorized()) };
    state.insert(app).await?;
    Ok(Json(SessionBody::from(&session)))
}

async fn log_out<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let token = bearer(&headers)?;
    match state.remove(&token).await {
        Some(view) => view.lock().await.log_out().await,
        None => state.auth.log_out(&token).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn current_session<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap) -> Result<Json<SessionBody>, ApiError> {
    let token = bearer(&headers)?;
    let view = state.resume(&token).await?;
    let app = view.lock().await;
    app.session().map(|s| Json(SessionBody::from(s))).ok_or_else(ApiError::unauthorized)
}

fn with_message(mut err: ApiError, inline: Option<String>) -> ApiError {
    if let Some(message) = inline { err.message = message; }
    err
}
