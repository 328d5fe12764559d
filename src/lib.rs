//! Multi-user todo tracking service: registration, bearer-token login and
//! per-owner todo CRUD over a SQLite store.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rest;
pub mod store;

use std::sync::Arc;

use auth::TokenService;
use config::Config;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: Arc<TokenService>,
    pub access_token_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenService::new(&config.jwt_secret)),
            access_token_ttl: config.access_token_ttl,
        }
    }
}
