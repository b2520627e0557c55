use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::{
    db::init_db,
    error::{Result, StoreError},
    types::{fmt_ts, NewPoster, Poster},
};

/// Registry of poster templates. Only metadata lives here; the delivery URL
/// is derived from the poster ID by the scheduler's media locator.
#[derive(Clone)]
pub struct PosterStore {
    conn: Arc<Mutex<Connection>>,
}

fn row_to_poster(row: &rusqlite::Row<'_>) -> rusqlite::Result<Poster> {
    Ok(Poster {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl PosterStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        init_db(&conn.lock().unwrap())?;
        Ok(Self { conn })
    }

    pub fn insert(&self, new: &NewPoster) -> Result<Poster> {
        if new.title.trim().is_empty() {
            return Err(StoreError::InvalidRecord("title must be non-empty".into()));
        }

        let conn = self.conn.lock().unwrap();
        let now = fmt_ts(Utc::now());
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO posters (id, title, category, created_at) VALUES (?1,?2,?3,?4)",
            rusqlite::params![id, new.title, new.category, now],
        )?;
        Ok(Poster {
            id,
            title: new.title.clone(),
            category: new.category.clone(),
            created_at: now,
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<Poster>> {
        let conn = self.conn.lock().unwrap();
        let poster = conn
            .query_row(
                "SELECT id, title, category, created_at FROM posters WHERE id = ?1",
                [id],
                row_to_poster,
            )
            .optional()?;
        Ok(poster)
    }

    pub fn list(&self) -> Result<Vec<Poster>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, title, category, created_at FROM posters ORDER BY created_at, id")?;
        let posters = stmt
            .query_map([], row_to_poster)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(posters)
    }
}
