use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a scheduled delivery.
///
/// `Pending` is the single canonical awaiting-dispatch state. Transitions are
/// terminal: `Pending → Sent` or `Pending → Failed`, written once by the
/// dispatch engine; the only exit from a terminal state is deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ScheduleStatus {
    /// Waiting for its scheduled minute.
    Pending,
    /// The provider accepted the send request.
    Sent,
    /// Delivery failed: missing contact, adapter error, or provider rejection.
    Failed,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Sent => "sent",
            ScheduleStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // "active" is a legacy spelling of the awaiting-dispatch state;
        // accepted on read, never written.
        match s.to_ascii_lowercase().as_str() {
            "pending" | "active" => Ok(ScheduleStatus::Pending),
            "sent" => Ok(ScheduleStatus::Sent),
            "failed" => Ok(ScheduleStatus::Failed),
            other => Err(format!("unknown schedule status: {other}")),
        }
    }
}

/// A persisted scheduled delivery — one poster, one customer, one instant.
///
/// Field names serialize in the camelCase wire shape the HTTP API exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    /// UUID v4 string — primary key, assigned at insert.
    pub id: String,
    pub customer_id: String,
    pub poster_id: String,
    /// Free-text classification tag copied from the poster selection.
    pub category: String,
    /// Absolute UTC instant at which delivery should occur. Never mutated.
    pub scheduled_at: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Input to `ScheduleStore::insert_many` — a record before it has an ID.
#[derive(Debug, Clone)]
pub struct NewScheduleRecord {
    pub customer_id: String,
    pub poster_id: String,
    pub category: String,
    pub scheduled_at: DateTime<Utc>,
}

/// A schedule enriched with display names for listing. `customer_name` /
/// `poster_title` are `None` when the referenced row no longer exists —
/// dangling references are tolerated, they surface at dispatch time instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub poster_id: String,
    pub poster_title: Option<String>,
    pub category: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: ScheduleStatus,
}

/// A registered customer. `whatsapp` is optional — a customer without a
/// contact channel is valid data; dispatch surfaces it as a Failed delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub company_name: String,
    pub whatsapp: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub company_name: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

/// Poster template metadata. Image bytes live in external storage; the
/// delivery URL is derived from the poster ID, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poster {
    pub id: String,
    pub title: String,
    pub category: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPoster {
    pub title: String,
    pub category: String,
}

/// Encode an instant as a fixed-width RFC 3339 UTC string
/// ("2025-01-01T04:30:00.000Z") so lexicographic order in SQL is
/// chronological order.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
