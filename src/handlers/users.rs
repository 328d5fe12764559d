use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    auth::{password, CurrentUser},
    error::AppError,
    models::user::{normalize_username, CreateUser, ReadUser},
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let username = normalize_username(&payload.username).to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    if state.store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let plaintext = payload.password;
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext)).await??;

    // A concurrent registration can still win the race; the unique index
    // turns it into a conflict here.
    let user = state
        .store
        .insert_user(&username, &password_hash)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .map(|db_err| db_err.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                AppError::Conflict("User already exists".to_string())
            } else {
                AppError::Sqlx(e)
            }
        })?;

    tracing::info!(user_id = user.id, "Registered user {}", user.username);
    Ok(Json(json!({"success": "User registered successfully."})))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<ReadUser> {
    Json(ReadUser::from(&user))
}

pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_user(user.id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = user.id, "Deleted user {}", user.username);
    Ok(Json(json!({"success": "User deleted successfully."})))
}
