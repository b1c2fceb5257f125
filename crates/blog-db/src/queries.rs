use crate::models::{PostRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a new user. Returns the new row id, or `None` when the
    /// username is already taken (UNIQUE constraint on user.username).
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO user (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Posts --

    pub fn create_post(&self, title: &str, body: &str, author_id: i64) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO post (title, body, author_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![title, body, author_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.title, p.body, p.created, p.author_id, u.username
                 FROM post p
                 JOIN user u ON p.author_id = u.id
                 WHERE p.id = ?1",
            )?;

            let row = stmt.query_row([id], read_post_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.title, p.body, p.created, p.author_id, u.username
                 FROM post p
                 JOIN user u ON p.author_id = u.id
                 ORDER BY p.created DESC",
            )?;

            let rows = stmt
                .query_map([], read_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Overwrite title and body. Author and creation time are immutable.
    pub fn update_post(&self, id: i64, title: &str, body: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE post SET title = ?1, body = ?2 WHERE id = ?3",
                rusqlite::params![title, body, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_post(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM post WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn read_post_row(row: &rusqlite::Row<'_>) -> std::result::Result<PostRow, rusqlite::Error> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created: row.get(3)?,
        author_id: row.get(4)?,
        author_username: row.get(5)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password FROM user WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, username, password FROM user WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn user_count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
                .map_err(Into::into)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_username_leaves_single_row() {
        let db = Database::open_in_memory().unwrap();

        let first = db.create_user("alice", "hash-a").unwrap();
        assert!(first.is_some());

        let second = db.create_user("alice", "hash-b").unwrap();
        assert!(second.is_none());

        assert_eq!(user_count(&db), 1);
        let row = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(row.password, "hash-a");
    }

    #[test]
    fn missing_user_lookups_return_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
        assert!(db.get_user_by_id(42).unwrap().is_none());
    }

    #[test]
    fn post_crud_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_user("alice", "hash").unwrap().unwrap();

        let id = db.create_post("Hello", "first post", author).unwrap();

        let post = db.get_post(id).unwrap().unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.body, "first post");
        assert_eq!(post.author_id, author);
        assert_eq!(post.author_username, "alice");
        assert!(!post.created.is_empty());

        db.update_post(id, "Hello again", "edited").unwrap();
        let post = db.get_post(id).unwrap().unwrap();
        assert_eq!(post.title, "Hello again");
        assert_eq!(post.body, "edited");
        assert_eq!(post.author_id, author);

        db.delete_post(id).unwrap();
        assert!(db.get_post(id).unwrap().is_none());
    }

    #[test]
    fn posts_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_user("alice", "hash").unwrap().unwrap();

        // Explicit timestamps; a same-second insert burst would otherwise tie.
        db.with_conn(|conn| {
            for (title, created) in [
                ("t1", "2024-01-01 10:00:00"),
                ("t3", "2024-01-03 10:00:00"),
                ("t2", "2024-01-02 10:00:00"),
            ] {
                conn.execute(
                    "INSERT INTO post (title, body, created, author_id) VALUES (?1, '', ?2, ?3)",
                    rusqlite::params![title, created, author],
                )?;
            }
            Ok(())
        })
        .unwrap();

        let titles: Vec<String> = db
            .list_posts()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["t3", "t2", "t1"]);
    }

    #[test]
    fn post_requires_existing_author() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_post("orphan", "", 99).is_err());
    }
}
