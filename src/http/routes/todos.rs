use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};

use crate::application::manage_todos::ManageTodos;
use crate::domain::{
    auth::Authenticator,
    filter::Filter,
    repository::TodoRepository,
    todo::{ClientId, TodoId},
};
use crate::http::{
    state::{bearer, manage, AppState},
    types::{ApiError, ContentInput, CountBody, DoneInput, FilterInput, ListBody, TodoBody},
};

pub fn router<A, R>(state: AppState<A, R>) -> Router
where
    A: Authenticator + Clone,
    R: TodoRepository + Clone,
{
    Router::new()
        .route("/todos", get(list_todos::<A, R>).post(create_todo::<A, R>))
        .route("/todos/toggle-all", post(toggle_all::<A, R>))
        .route("/todos/clear-completed", post(clear_completed::<A, R>))
        .route("/todos/:id", put(edit_todo::<A, R>).delete(delete_todo::<A, R>))
        .route("/todos/:id/toggle", post(toggle_todo::<A, R>))
        .route("/filter", put(select_filter::<A, R>))
        .route("/filter/back", post(history_back::<A, R>))
        .route("/filter/forward", post(history_forward::<A, R>))
        .route("/filter/:name", get(route_filter::<A, R>))
        .with_state(state)
}

async fn list_todos<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap) -> Result<Json<ListBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    Ok(Json(list_body(view)))
}

async fn create_todo<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Json(payload): Json<ContentInput>) -> Result<(StatusCode, Json<TodoBody>), ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    let cid = view.create(&payload.content).await?;
    let todo = view.todos().get(cid).ok_or_else(ApiError::not_found)?;
    Ok((StatusCode::CREATED, Json(TodoBody::from(todo))))
}

async fn edit_todo<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Path(id): Path<String>, Json(payload): Json<ContentInput>) -> Result<Json<TodoBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    let cid = lookup(view, &id)?;
    view.edit(cid, &payload.content).await?;
    let todo = view.todos().get(cid).ok_or_else(ApiError::not_found)?;
    Ok(Json(TodoBody::from(todo)))
}

async fn toggle_todo<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<TodoBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    let cid = lookup(view, &id)?;
    view.toggle(cid).await?;
    let todo = view.todos().get(cid).ok_or_else(ApiError::not_found)?;
    Ok(Json(TodoBody::from(todo)))
}

async fn delete_todo<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    let cid = lookup(view, &id)?;
    view.clear(cid).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_all<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Json(payload): Json<DoneInput>) -> Result<Json<CountBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    let count = view.toggle_all(payload.done).await?;
    Ok(Json(CountBody { count }))
}

async fn clear_completed<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap) -> Result<Json<CountBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    let count = view.clear_completed().await?;
    Ok(Json(CountBody { count }))
}

async fn select_filter<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Json(payload): Json<FilterInput>) -> Result<Json<ListBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    view.select_filter(payload.filter);
    Ok(Json(list_body(view)))
}

async fn route_filter<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap, Path(name): Path<String>) -> Result<Json<ListBody>, ApiError> {
    let filter: Filter = name.parse().map_err(|e: crate::domain::filter::ParseFilterError| ApiError::new(StatusCode::NOT_FOUND, e.to_string()))?;
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    view.route(filter);
    Ok(Json(list_body(view)))
}

async fn history_back<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap) -> Result<Json<ListBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    view.back();
    Ok(Json(list_body(view)))
}

async fn history_forward<A: Authenticator + Clone, R: TodoRepository + Clone>(State(state): State<AppState<A, R>>, headers: HeaderMap) -> Result<Json<ListBody>, ApiError> {
    let token = bearer(&headers)?;
    let shared = state.resume(&token).await?;
    let mut app = shared.lock().await;
    let view = manage(&mut app)?;
    view.forward();
    Ok(Json(list_body(view)))
}

fn list_body<R: TodoRepository>(view: &ManageTodos<R>) -> ListBody {
    ListBody {
        filter: view.filter().current(),
        items: view.visible().into_iter().map(TodoBody::from).collect(),
        stats: view.stats(),
    }
}

fn lookup<R: TodoRepository>(view: &ManageTodos<R>, id: &str) -> Result<ClientId, ApiError> {
    let id = uuid::Uuid::parse_str(id).map(TodoId).map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "invalid id"))?;
    view.todos().find_by_id(&id).map(|t| t.cid()).ok_or_else(ApiError::not_found)
}
