use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};

use crate::{
    auth::password,
    error::AppError,
    models::user::{normalize_username, AuthResponse, LoginForm},
    AppState,
};

/// OAuth2 password-grant style login. Unknown user and wrong password are
/// indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Form(form) = form?;

    let user = state
        .store
        .find_user_by_username(normalize_username(&form.username))
        .await?
        .ok_or(AppError::LoginFail)?;

    let stored_hash = user.password.clone();
    let plaintext = form.password;
    let verified =
        tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &stored_hash))
            .await?;
    if !verified {
        tracing::info!("Failed login for {}", user.username);
        return Err(AppError::LoginFail);
    }

    let token = state
        .tokens
        .issue(&user.username, Some(state.access_token_ttl))?;

    tracing::debug!(user_id = user.id, "Issued access token");
    Ok(Json(AuthResponse::bearer(token)))
}
