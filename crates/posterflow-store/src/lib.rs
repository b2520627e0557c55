//! `posterflow-store` — SQLite persistence for schedules, customers and posters.
//!
//! # Overview
//!
//! Each store type wraps its own `Arc<Mutex<Connection>>` so the HTTP
//! handlers and the dispatch engine can operate on separate connections
//! against the same WAL-mode database file. Schema init is idempotent and
//! runs in every constructor.
//!
//! The `schedules` table is the dispatch engine's work queue: the engine
//! polls it by `(status, scheduled_at)` window and writes back single-row
//! status transitions. All timestamps are stored as fixed-width RFC 3339
//! UTC strings (millisecond precision, `Z` suffix) so the SQL `BETWEEN`
//! comparison is chronological.

pub mod customers;
pub mod db;
pub mod error;
pub mod posters;
pub mod schedules;
pub mod types;

pub use customers::CustomerStore;
pub use error::{Result, StoreError};
pub use posters::PosterStore;
pub use schedules::ScheduleStore;
pub use types::{
    Customer, NewCustomer, NewPoster, NewScheduleRecord, Poster, ScheduleRecord, ScheduleStatus,
    ScheduleView,
};
