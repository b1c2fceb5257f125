//! Cookie-backed request identity.
//!
//! The `session` cookie is a signed value holding the user id. Each request
//! resolves it against the user table: a missing cookie, a bad signature, or
//! a row that no longer exists all resolve to anonymous. Handlers receive
//! identity as an extractor argument rather than looking it up ambiently.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

use crate::error::PageError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The authenticated user behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Resolved identity for any request, anonymous included.
pub struct Identity(pub Option<CurrentUser>);

/// Login gate: rejects anonymous requests with a redirect to the login page.
pub struct AuthUser(pub CurrentUser);

fn resolve(state: &AppState, jar: &SignedCookieJar) -> Result<Option<CurrentUser>, PageError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let Ok(user_id) = cookie.value().parse::<i64>() else {
        return Ok(None);
    };

    // A cookie pointing at a deleted user resolves to anonymous; the
    // sweep_stale_session layer removes it from the response.
    let user = state.db.get_user_by_id(user_id)?;
    Ok(user.map(|row| CurrentUser {
        id: row.id,
        username: row.username,
    }))
}

async fn signed_jar(parts: &mut Parts, state: &AppState) -> SignedCookieJar {
    match SignedCookieJar::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(err) => match err {},
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = signed_jar(parts, state).await;
        Ok(Identity(resolve(state, &jar)?))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = signed_jar(parts, state).await;
        match resolve(state, &jar) {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => Err(Redirect::to("/auth/login").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Replace whatever session existed with one bound to `user_id`.
pub fn establish(jar: SignedCookieJar, user_id: i64) -> SignedCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, user_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drop the session cookie unconditionally.
pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

/// Clears a session cookie whose user row no longer exists.
///
/// Runs as a layer around every route. The removal is only attached when the
/// handler itself set no session cookie, so login and logout keep the last
/// word on the response.
pub async fn sweep_stale_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    req: Request,
    next: Next,
) -> Response {
    let stale = jar.get(SESSION_COOKIE).is_some()
        && matches!(resolve(&state, &jar), Ok(None));

    let response = next.run(req).await;

    if stale && !sets_session_cookie(&response) {
        return (clear(jar), response).into_response();
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().is_ok_and(|v| v.starts_with(SESSION_COOKIE)))
}
