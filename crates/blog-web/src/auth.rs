use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::Form;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::info;

use blog_db::Database;
use blog_db::models::UserRow;

use crate::error::PageError;
use crate::session::{self, Identity};
use crate::{AppState, pages};

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

pub async fn register_form(Identity(user): Identity) -> Html<String> {
    pages::register(user.as_ref(), None)
}

/// POST /auth/register — create the account, then send the user to the
/// login page. Registration does not log the user in.
pub async fn register(
    State(state): State<AppState>,
    Identity(user): Identity,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, PageError> {
    match register_user(&state.db, &form.username, &form.password) {
        Ok(()) => {
            info!("Registered user {}", form.username);
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(e @ (PageError::Validation(_) | PageError::Conflict(_))) => {
            Ok(pages::register(user.as_ref(), Some(&e.to_string())).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn login_form(Identity(user): Identity) -> Html<String> {
    pages::login(user.as_ref(), None)
}

/// POST /auth/login — on success the session cookie is replaced with one
/// bound to the user's id.
pub async fn login(
    State(state): State<AppState>,
    Identity(user): Identity,
    jar: SignedCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, PageError> {
    match login_user(&state.db, &form.username, &form.password) {
        Ok(row) => {
            let jar = session::establish(jar, row.id);
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(e @ PageError::Auth(_)) => {
            Ok(pages::login(user.as_ref(), Some(&e.to_string())).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(jar: SignedCookieJar) -> Response {
    (session::clear(jar), Redirect::to("/")).into_response()
}

fn register_user(db: &Database, username: &str, password: &str) -> Result<(), PageError> {
    if username.is_empty() {
        return Err(PageError::Validation("Username is required.".into()));
    }
    if password.is_empty() {
        return Err(PageError::Validation("Password is required.".into()));
    }

    let password_hash = hash_password(password)?;

    // The UNIQUE constraint is the sole arbiter of duplicate usernames, so a
    // racing registration of the same name cannot leave two rows.
    match db.create_user(username, &password_hash)? {
        Some(_) => Ok(()),
        None => Err(PageError::Conflict(format!(
            "User {username} is already registered."
        ))),
    }
}

fn login_user(db: &Database, username: &str, password: &str) -> Result<UserRow, PageError> {
    let Some(user) = db.get_user_by_username(username)? else {
        return Err(PageError::Auth("Incorrect username.".into()));
    };

    if !verify_password(&user.password, password)? {
        return Err(PageError::Auth("Incorrect password.".into()));
    }

    Ok(user)
}

/// Hash with Argon2id; the PHC string carries salt and parameters.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(stored_hash: &str, password: &str) -> anyhow::Result<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is unparseable: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
