pub mod auth;
pub mod todos;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

pub async fn health_checker() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "tasktrack is running",
    }))
}
