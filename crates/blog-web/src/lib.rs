pub mod auth;
pub mod blog;
pub mod error;
pub mod pages;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use blog_db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    key: Key,
}

impl AppState {
    /// Session cookies are signed with a key stretched from `secret`;
    /// SHA-512 output is exactly the 64 bytes `Key::from` wants, so any
    /// secret length is accepted.
    pub fn new(db: Database, secret: &str) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            db: Arc::new(db),
            key: Key::from(digest.as_slice()),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(blog::index))
        .route("/auth/register", get(auth::register_form).post(auth::register))
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .route("/create", get(blog::create_form).post(blog::create))
        .route("/{id}/update", get(blog::update_form).post(blog::update))
        .route("/{id}/delete", post(blog::delete))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::sweep_stale_session,
        ))
        .with_state(state)
}
