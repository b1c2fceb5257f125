use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use blog_db::Database;
use blog_db::models::PostRow;

use crate::error::PageError;
use crate::session::{AuthUser, CurrentUser, Identity};
use crate::{AppState, pages};

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub body: String,
}

/// GET / — the whole feed, newest first. Readable anonymously.
pub async fn index(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> Result<Html<String>, PageError> {
    let posts = state.db.list_posts()?;
    Ok(pages::index(user.as_ref(), &posts))
}

pub async fn create_form(AuthUser(user): AuthUser) -> Html<String> {
    pages::create(&user, None, "", "")
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<PostForm>,
) -> Result<Response, PageError> {
    if let Err(e) = validate_title(&form.title) {
        // Redisplay with the submitted values intact.
        return Ok(pages::create(&user, Some(&e.to_string()), &form.title, &form.body)
            .into_response());
    }

    state.db.create_post(&form.title, &form.body, user.id)?;
    Ok(Redirect::to("/").into_response())
}

pub async fn update_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let post = fetch_post(&state.db, id, Some(&user))?;
    Ok(pages::update(&user, None, &post))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Response, PageError> {
    let post = fetch_post(&state.db, id, Some(&user))?;

    if let Err(e) = validate_title(&form.title) {
        let draft = PostRow {
            title: form.title,
            body: form.body,
            ..post
        };
        return Ok(pages::update(&user, Some(&e.to_string()), &draft).into_response());
    }

    state.db.update_post(id, &form.title, &form.body)?;
    Ok(Redirect::to("/").into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    fetch_post(&state.db, id, Some(&user))?;
    state.db.delete_post(id)?;
    Ok(Redirect::to("/"))
}

/// Resolve a post by id. With `owner` set, the caller must be its author.
fn fetch_post(db: &Database, id: i64, owner: Option<&CurrentUser>) -> Result<PostRow, PageError> {
    let post = db
        .get_post(id)?
        .ok_or_else(|| PageError::NotFound(format!("Post id {id} doesn't exist.")))?;

    if let Some(user) = owner {
        if post.author_id != user.id {
            return Err(PageError::Forbidden);
        }
    }

    Ok(post)
}

fn validate_title(title: &str) -> Result<(), PageError> {
    if title.is_empty() {
        return Err(PageError::Validation("Title is required.".into()));
    }
    Ok(())
}
