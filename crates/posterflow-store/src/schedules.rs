use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use crate::{
    db::init_db,
    error::{Result, StoreError},
    types::{fmt_ts, parse_ts, NewScheduleRecord, ScheduleRecord, ScheduleStatus, ScheduleView},
};

const SCHEDULE_COLUMNS: &str =
    "id, customer_id, poster_id, category, scheduled_at, status, created_at, updated_at";

/// Durable collection of scheduled deliveries.
///
/// Wraps its own connection so the HTTP handlers and the dispatch engine can
/// each hold a store over separate connections to the same database file.
#[derive(Clone)]
pub struct ScheduleStore {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        init_db(&conn.lock().unwrap())?;
        Ok(Self { conn })
    }

    /// Insert a batch of new records inside one transaction.
    ///
    /// IDs are assigned here; records come back in input order. The batch is
    /// atomic — either every record persists or none does.
    pub fn insert_many(&self, new: &[NewScheduleRecord]) -> Result<Vec<ScheduleRecord>> {
        for record in new {
            if record.category.trim().is_empty() {
                return Err(StoreError::InvalidRecord("category must be non-empty".into()));
            }
            if record.customer_id.is_empty() || record.poster_id.is_empty() {
                return Err(StoreError::InvalidRecord(
                    "customerId and posterId are required".into(),
                ));
            }
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = fmt_ts(Utc::now());
        let mut inserted = Vec::with_capacity(new.len());

        for record in new {
            let id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO schedules
                 (id, customer_id, poster_id, category, scheduled_at, status, created_at, updated_at)
                 VALUES (?1,?2,?3,?4,?5,'pending',?6,?6)",
                rusqlite::params![
                    id,
                    record.customer_id,
                    record.poster_id,
                    record.category,
                    fmt_ts(record.scheduled_at),
                    now
                ],
            )?;
            inserted.push(ScheduleRecord {
                id,
                customer_id: record.customer_id.clone(),
                poster_id: record.poster_id.clone(),
                category: record.category.clone(),
                scheduled_at: record.scheduled_at,
                status: ScheduleStatus::Pending,
                created_at: now.clone(),
                updated_at: now.clone(),
            });
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Return every record with `scheduled_at` in `[window_start, window_end]`
    /// (inclusive on both ends) and status in `statuses`.
    pub fn find_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        statuses: &[ScheduleStatus],
    ) -> Result<Vec<ScheduleRecord>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        // Pending matches its legacy 'active' spelling too, so rows written
        // by the older vocabulary are still picked up by the due query.
        let spellings: Vec<&str> = statuses
            .iter()
            .flat_map(|s| match s {
                ScheduleStatus::Pending => &["pending", "active"][..],
                ScheduleStatus::Sent => &["sent"][..],
                ScheduleStatus::Failed => &["failed"][..],
            })
            .copied()
            .collect();

        let placeholders = vec!["?"; spellings.len()].join(",");
        let sql = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules
             WHERE scheduled_at BETWEEN ? AND ? AND status IN ({placeholders})
             ORDER BY scheduled_at, id"
        );

        let mut params: Vec<String> = vec![fmt_ts(window_start), fmt_ts(window_end)];
        params.extend(spellings.iter().map(|s| s.to_string()));

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(params), row_to_raw)?
            .filter_map(|r| raw_to_record(r.ok()?))
            .collect();
        Ok(records)
    }

    /// Persist a single status transition. Idempotent — writing the status a
    /// row already has is a no-op; an unknown id is `NotFound`.
    pub fn update_status(&self, id: &str, status: ScheduleStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE schedules SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![status.to_string(), fmt_ts(Utc::now()), id],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Return all records ordered by creation time.
    pub fn find_all(&self) -> Result<Vec<ScheduleRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY created_at, id"
        ))?;
        let records = stmt
            .query_map([], row_to_raw)?
            .filter_map(|r| raw_to_record(r.ok()?))
            .collect();
        Ok(records)
    }

    /// Return all records enriched with customer and poster display names.
    pub fn list_views(&self) -> Result<Vec<ScheduleView>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.customer_id, c.company_name, s.poster_id, p.title,
                    s.category, s.scheduled_at, s.status
             FROM schedules s
             LEFT JOIN customers c ON c.id = s.customer_id
             LEFT JOIN posters   p ON p.id = s.poster_id
             ORDER BY s.created_at, s.id",
        )?;
        let views = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .filter_map(|r| {
                let (id, customer_id, customer_name, poster_id, poster_title, category, at, status) =
                    r.ok()?;
                Some(ScheduleView {
                    id,
                    customer_id,
                    customer_name,
                    poster_id,
                    poster_title,
                    category,
                    scheduled_at: parse_ts(&at)?,
                    status: ScheduleStatus::from_str(&status).ok()?,
                })
            })
            .collect();
        Ok(views)
    }

    /// Delete a record by ID. Returns `NotFound` if no row is deleted.
    pub fn delete_by_id(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM schedules WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}

type RawScheduleRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

/// Map a SELECT row (column order from SCHEDULE_COLUMNS) to raw strings.
/// Centralised here so every query in this file stays consistent.
fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawScheduleRow> {
    Ok((
        row.get(0)?, // id
        row.get(1)?, // customer_id
        row.get(2)?, // poster_id
        row.get(3)?, // category
        row.get(4)?, // scheduled_at
        row.get(5)?, // status
        row.get(6)?, // created_at
        row.get(7)?, // updated_at
    ))
}

fn raw_to_record(raw: RawScheduleRow) -> Option<ScheduleRecord> {
    let (id, customer_id, poster_id, category, at, status, created_at, updated_at) = raw;
    let scheduled_at = match parse_ts(&at) {
        Some(ts) => ts,
        None => {
            warn!(schedule_id = %id, raw = %at, "dropping row with unparseable scheduled_at");
            return None;
        }
    };
    let status = match ScheduleStatus::from_str(&status) {
        Ok(s) => s,
        Err(e) => {
            warn!(schedule_id = %id, "dropping row: {e}");
            return None;
        }
    };
    Some(ScheduleRecord {
        id,
        customer_id,
        poster_id,
        category,
        scheduled_at,
        status,
        created_at,
        updated_at,
    })
}
