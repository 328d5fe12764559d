use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{auth, health_checker, todos, users},
    AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_checker))
        .route("/users", post(users::register))
        .route("/users/me", get(users::me).delete(users::delete_me))
        .route("/auth/login", post(auth::login))
        .route("/todos", put(todos::create_todo).get(todos::list_todos))
        .route(
            "/todos/:id",
            get(todos::get_todo)
                .put(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
