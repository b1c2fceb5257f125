//! Server-rendered HTML. One function per page, all sharing `layout`.
//!
//! Every user-controlled string (usernames, titles, bodies, flash messages)
//! goes through `escape` before it is spliced into markup.

use axum::response::Html;
use chrono::NaiveDateTime;

use blog_db::models::PostRow;

use crate::session::CurrentUser;

const STYLE: &str = "
    body { font-family: system-ui; max-width: 720px; margin: 0 auto; padding: 0 16px; color: #1f2937; }
    nav { display: flex; align-items: center; justify-content: space-between; border-bottom: 1px solid #e5e7eb; padding: 12px 0; }
    nav h1 { margin: 0; }
    nav ul { display: flex; gap: 12px; list-style: none; margin: 0; padding: 0; }
    a { color: #2563eb; text-decoration: none; }
    .flash { background: #fef2f2; border: 1px solid #fca5a5; border-radius: 8px; padding: 12px; margin: 16px 0; color: #991b1b; }
    article.post { border-bottom: 1px solid #e5e7eb; padding: 12px 0; }
    article.post .about { color: #6b7280; font-size: 14px; }
    .content header { display: flex; align-items: center; justify-content: space-between; }
    label { display: block; margin: 12px 0 4px; }
    input[type=text], input[type=password], textarea { width: 100%; padding: 8px; border: 1px solid #d1d5db; border-radius: 6px; }
    input[type=submit] { margin-top: 12px; padding: 8px 20px; border: none; border-radius: 6px; background: #2563eb; color: white; cursor: pointer; }
    input.danger { background: #dc2626; }
";

/// Minimal HTML entity escaping for text interpolated into markup.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// SQLite writes `datetime('now')` as `YYYY-MM-DD HH:MM:SS`; show the date.
fn format_date(created: &str) -> String {
    NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created.to_string())
}

fn layout(title: &str, user: Option<&CurrentUser>, flash: Option<&str>, body: &str) -> Html<String> {
    let nav_links = match user {
        Some(user) => format!(
            r#"<li><span>{}</span></li><li><a href="/auth/logout">Log Out</a></li>"#,
            escape(&user.username)
        ),
        None => r#"<li><a href="/auth/register">Register</a></li><li><a href="/auth/login">Log In</a></li>"#
            .to_string(),
    };

    let flash = flash
        .map(|msg| format!(r#"<div class="flash">{}</div>"#, escape(msg)))
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title} - Blog</title>
    <style>{STYLE}</style>
</head>
<body>
    <nav>
        <h1><a href="/">Blog</a></h1>
        <ul>{nav_links}</ul>
    </nav>
    <section class="content">
        <header><h1>{title}</h1></header>
        {flash}
        {body}
    </section>
</body>
</html>
"#,
        title = escape(title),
    ))
}

pub fn register(user: Option<&CurrentUser>, flash: Option<&str>) -> Html<String> {
    let body = r#"
        <form method="post">
            <label for="username">Username</label>
            <input name="username" id="username" type="text" required>
            <label for="password">Password</label>
            <input name="password" id="password" type="password" required>
            <input type="submit" value="Register">
        </form>"#;

    layout("Register", user, flash, body)
}

pub fn login(user: Option<&CurrentUser>, flash: Option<&str>) -> Html<String> {
    let body = r#"
        <form method="post">
            <label for="username">Username</label>
            <input name="username" id="username" type="text" required>
            <label for="password">Password</label>
            <input name="password" id="password" type="password" required>
            <input type="submit" value="Log In">
        </form>"#;

    layout("Log In", user, flash, body)
}

pub fn index(user: Option<&CurrentUser>, posts: &[PostRow]) -> Html<String> {
    let mut body = String::new();

    if user.is_some() {
        body.push_str(r#"<p><a href="/create">New</a></p>"#);
    }

    for post in posts {
        // Only the author sees the edit link.
        let edit_link = match user {
            Some(u) if u.id == post.author_id => {
                format!(r#" <a href="/{}/update">Edit</a>"#, post.id)
            }
            _ => String::new(),
        };

        body.push_str(&format!(
            r#"
        <article class="post">
            <header>
                <h2>{title}</h2>{edit_link}
            </header>
            <div class="about">by {author} on {date}</div>
            <p>{body}</p>
        </article>"#,
            title = escape(&post.title),
            author = escape(&post.author_username),
            date = format_date(&post.created),
            body = escape(&post.body),
        ));
    }

    layout("Posts", user, None, &body)
}

pub fn create(user: &CurrentUser, flash: Option<&str>, title: &str, body: &str) -> Html<String> {
    let form = format!(
        r#"
        <form method="post">
            <label for="title">Title</label>
            <input name="title" id="title" type="text" value="{title}">
            <label for="body">Body</label>
            <textarea name="body" id="body" rows="8">{body}</textarea>
            <input type="submit" value="Save">
        </form>"#,
        title = escape(title),
        body = escape(body),
    );

    layout("New Post", Some(user), flash, &form)
}

pub fn update(user: &CurrentUser, flash: Option<&str>, post: &PostRow) -> Html<String> {
    let form = format!(
        r#"
        <form method="post">
            <label for="title">Title</label>
            <input name="title" id="title" type="text" value="{title}">
            <label for="body">Body</label>
            <textarea name="body" id="body" rows="8">{body}</textarea>
            <input type="submit" value="Save">
        </form>
        <hr>
        <form action="/{id}/delete" method="post">
            <input class="danger" type="submit" value="Delete"
                   onclick="return confirm('Are you sure?');">
        </form>"#,
        title = escape(&post.title),
        body = escape(&post.body),
        id = post.id,
    );

    layout(&format!("Edit \"{}\"", post.title), Some(user), flash, &form)
}

pub fn error_page(title: &str, message: &str) -> Html<String> {
    layout(title, None, None, &format!("<p>{}</p>", escape(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain text"), "plain text");
    }

    #[test]
    fn format_date_trims_sqlite_timestamps() {
        assert_eq!(format_date("2024-06-01 09:30:00"), "2024-06-01");
        // Unparseable values pass through untouched.
        assert_eq!(format_date("whenever"), "whenever");
    }

    #[test]
    fn index_hides_edit_link_from_non_authors() {
        let posts = vec![PostRow {
            id: 1,
            title: "Hello".into(),
            body: "".into(),
            created: "2024-06-01 09:30:00".into(),
            author_id: 1,
            author_username: "alice".into(),
        }];

        let alice = CurrentUser { id: 1, username: "alice".into() };
        let bob = CurrentUser { id: 2, username: "bob".into() };

        assert!(index(Some(&alice), &posts).0.contains("/1/update"));
        assert!(!index(Some(&bob), &posts).0.contains("/1/update"));
        assert!(!index(None, &posts).0.contains("/1/update"));
    }

    #[test]
    fn post_content_is_escaped_in_feed() {
        let posts = vec![PostRow {
            id: 1,
            title: "<b>bold</b>".into(),
            body: "a & b".into(),
            created: "2024-06-01 09:30:00".into(),
            author_id: 1,
            author_username: "alice".into(),
        }];

        let html = index(None, &posts).0;
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<b>bold</b>"));
    }
}
