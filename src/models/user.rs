use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: chrono::NaiveDateTime,
}

/// Claims carried by an access token. `sub` is the username.
#[derive(Debug, Serialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Usernames are compared after trimming surrounding whitespace.
pub fn normalize_username(raw: &str) -> &str {
    raw.trim()
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
}

/// Form body of `POST /auth/login`. Extra OAuth2 password-grant fields
/// (`grant_type`, `scope`, ...) are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
}

impl AuthResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadUser {
    pub username: String,
}

impl From<&User> for ReadUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_but_keeps_case() {
        assert_eq!(normalize_username("  alice \t"), "alice");
        assert_eq!(normalize_username("Alice"), "Alice");
        assert_eq!(normalize_username("   "), "");
    }
}
