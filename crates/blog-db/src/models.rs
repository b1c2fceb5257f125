/// Database row types — these map directly to SQLite rows.

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created: String,
    pub author_id: i64,
    pub author_username: String,
}
