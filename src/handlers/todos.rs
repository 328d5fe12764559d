use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        todo::{CreateTodo, Todo, TodoRead, UpdateTodo},
        user::User,
    },
    store::Store,
    AppState,
};

/// Loads a todo the caller owns. Absent rows are NotFound, rows owned by
/// someone else are Forbidden.
async fn owned_todo(store: &Store, user: &User, id: i64) -> Result<Todo, AppError> {
    let todo = store
        .find_todo(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Todo with ID: {} not found", id)))?;

    if todo.user_id != user.id {
        tracing::warn!(user_id = user.id, todo_id = id, "Rejected access to foreign todo");
        return Err(AppError::Forbidden);
    }
    Ok(todo)
}

fn require_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    Ok(())
}

pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<Json<TodoRead>, AppError> {
    let Json(payload) = payload?;
    require_title(&payload.title)?;

    let todo = state
        .store
        .insert_todo(
            user.id,
            &payload.title,
            payload.description.as_deref(),
            payload.completed,
        )
        .await?;

    tracing::debug!(user_id = user.id, todo_id = todo.id, "Created todo");
    Ok(Json(todo.into()))
}

pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TodoRead>>, AppError> {
    let todos = state.store.list_todos(user.id).await?;
    Ok(Json(todos.into_iter().map(TodoRead::from).collect()))
}

pub async fn get_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TodoRead>, AppError> {
    let Path(id) = id?;
    let todo = owned_todo(&state.store, &user, id).await?;
    Ok(Json(todo.into()))
}

pub async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<TodoRead>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let mut todo = owned_todo(&state.store, &user, id).await?;
    if let Some(title) = &payload.title {
        require_title(title)?;
    }
    payload.apply(&mut todo);
    let todo = state.store.update_todo(&todo).await?;

    tracing::debug!(user_id = user.id, todo_id = id, "Updated todo");
    Ok(Json(todo.into()))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    owned_todo(&state.store, &user, id).await?;

    if !state.store.delete_todo(id).await? {
        return Err(AppError::NotFound(format!("Todo with ID: {} not found", id)));
    }

    tracing::debug!(user_id = user.id, todo_id = id, "Deleted todo");
    Ok(Json(json!({"success": "Todo deleted successfully"})))
}
